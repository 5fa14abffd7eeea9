pub mod submission;
pub mod transform;

pub use submission::{SubmissionWorkflow, SubmitOutcome};
pub use transform::{CompressionLevel, Transform};
