use keylink_submission::SubmissionError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("a verification attempt is already in progress")]
    VerificationInProgress,

    #[error("a submission is already in progress")]
    SubmissionInProgress,

    #[error("the workflow has already finished")]
    Finished,

    #[error("submission error: {0}")]
    Submission(#[from] SubmissionError),

    #[error("config error: {0}")]
    Config(String),
}
