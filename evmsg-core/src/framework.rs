use sqlx::PgPool;

/// Handle that database query structs are processed against.
///
/// Every query in [`crate::entities`] is a plain struct with a
/// `Processor<Query> for DatabaseProcessor` impl.
#[derive(Debug, Clone)]
pub struct DatabaseProcessor {
    pub pool: PgPool,
}

impl DatabaseProcessor {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}
