//! Engine error taxonomy.
//!
//! External persistence failures are deliberately *not* represented here:
//! they are logged at the call site and never block a local state transition.
//! These errors cover misuse of the state machine and activity contracts.

use thiserror::Error;

use crate::types::ActivityType;

#[derive(Error, Debug)]
pub enum AssessmentError {
    #[error("no assessment session for user {0}")]
    SessionNotFound(String),

    #[error("activity {0:?} is not available for selection")]
    ActivityUnavailable(ActivityType),

    #[error("operation requires phase {expected}, current phase is {found}")]
    InvalidPhase {
        expected: &'static str,
        found: &'static str,
    },

    #[error("activity is not ready to submit: {0}")]
    ActivityIncomplete(&'static str),

    #[error("event does not apply to the running activity: {0}")]
    EventNotApplicable(&'static str),

    #[error("answer index {index} out of range (questions: {total})")]
    AnswerOutOfRange { index: usize, total: usize },
}

pub type AssessmentResult<T> = Result<T, AssessmentError>;
