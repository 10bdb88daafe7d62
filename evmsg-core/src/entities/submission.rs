use crate::framework::DatabaseProcessor;
use kanau::processor::Processor;
use time::OffsetDateTime;

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Submission {
    pub id: i64,
    pub event_id: i64,
    pub author_name: String,
    pub message: String,
    /// Reference to the stored image artifact, if one was uploaded.
    pub image: Option<String>,
    pub created_at: OffsetDateTime,
}

/// Data for inserting a new submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionInsert {
    pub event_id: i64,
    pub author_name: String,
    pub message: String,
    pub image: Option<String>,
}

#[derive(Debug, Clone)]
/// Insert a submission for an existing event.
pub struct InsertSubmission {
    pub submission: SubmissionInsert,
}

impl Processor<InsertSubmission> for DatabaseProcessor {
    type Output = Submission;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:InsertSubmission")]
    async fn process(&self, insert: InsertSubmission) -> Result<Submission, sqlx::Error> {
        let SubmissionInsert {
            event_id,
            author_name,
            message,
            image,
        } = insert.submission;
        let submission = sqlx::query_as::<_, Submission>(
            r#"
            INSERT INTO submissions (event_id, author_name, message, image)
            VALUES ($1, $2, $3, $4)
            RETURNING id, event_id, author_name, message, image, created_at
            "#,
        )
        .bind(event_id)
        .bind(author_name)
        .bind(message)
        .bind(image)
        .fetch_one(&self.pool)
        .await?;
        Ok(submission)
    }
}

#[derive(Debug, Clone)]
/// All submissions of an event, most recent first.
pub struct ListSubmissionsForEvent {
    pub event_id: i64,
}

impl Processor<ListSubmissionsForEvent> for DatabaseProcessor {
    type Output = Vec<Submission>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:ListSubmissionsForEvent")]
    async fn process(&self, query: ListSubmissionsForEvent) -> Result<Vec<Submission>, sqlx::Error> {
        let submissions = sqlx::query_as::<_, Submission>(
            r#"
            SELECT id, event_id, author_name, message, image, created_at
            FROM submissions
            WHERE event_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(query.event_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(submissions)
    }
}

#[derive(Debug, Clone)]
/// One submission of an event.
pub struct GetSubmission {
    pub event_id: i64,
    pub submission_id: i64,
}

impl Processor<GetSubmission> for DatabaseProcessor {
    type Output = Option<Submission>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetSubmission")]
    async fn process(&self, query: GetSubmission) -> Result<Option<Submission>, sqlx::Error> {
        let submission = sqlx::query_as::<_, Submission>(
            r#"
            SELECT id, event_id, author_name, message, image, created_at
            FROM submissions
            WHERE id = $1 AND event_id = $2
            "#,
        )
        .bind(query.submission_id)
        .bind(query.event_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(submission)
    }
}
