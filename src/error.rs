use thiserror::Error;

// Failures reported to callers of the engine
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BookingError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Booking {0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),
}

impl BookingError {
    pub fn not_found() -> Self {
        BookingError::NotFound("not found".to_string())
    }

    pub fn not_found_in_repository() -> Self {
        BookingError::NotFound("not found in repository".to_string())
    }

    pub fn confirmed_cancel() -> Self {
        BookingError::Conflict("cannot cancel a confirmed booking".to_string())
    }
}

// Failures from a credit check integration. These never reach the caller that
// created the booking; the pipeline logs and drops them.
#[derive(Error, Debug)]
pub enum CreditCheckError {
    #[error("Credit service unavailable: {0}")]
    Unavailable(String),

    #[error("Credit check timed out after {0}ms")]
    Timeout(u64),

    #[error("Other error: {0}")]
    Other(String),
}
