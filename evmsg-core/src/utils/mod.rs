pub mod schedule;
pub mod slug;
