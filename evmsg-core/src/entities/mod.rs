pub mod event;
pub mod submission;

pub use event::{Event, EventDetails, EventPreview, EventState, NewEvent};
pub use submission::{Submission, SubmissionInsert};
