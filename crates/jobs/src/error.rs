use thiserror::Error;

/// Errors surfaced while submitting an extraction job.
///
/// None of these are retried; the caller logs them and finishes the invocation.
#[derive(Debug, Error)]
pub enum JobError {
    /// The classified event had no download URI to hand to the service.
    #[error("event has no download uri to submit")]
    MissingSource,
    /// Configuration is incomplete (e.g., no application id).
    #[error("invalid job client config: {0}")]
    InvalidConfig(String),
    /// The request could not be delivered (DNS, refused connection, timeout).
    #[error("transport failure: {0}")]
    Transport(String),
    /// The service answered with a non-success HTTP status.
    #[error("submission rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },
    /// The service accepted the HTTP request but reported `results.error`.
    #[error("service reported error: {0}")]
    Application(String),
    /// A success status whose body is not the expected acknowledgement.
    #[error("malformed acknowledgement: {0}")]
    MalformedAcknowledgement(String),
    /// The job request could not be serialized.
    #[error("failed to serialize job request: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl JobError {
    /// Network-level failures, as opposed to the service refusing the job.
    pub fn is_transport(&self) -> bool {
        matches!(self, JobError::Transport(_))
    }

    /// The service received the job and declined it.
    pub fn is_rejection(&self) -> bool {
        matches!(self, JobError::Rejected { .. } | JobError::Application(_))
    }

    /// Short log label: `transport`, `rejected` or `invalid`.
    pub fn reason(&self) -> &'static str {
        if self.is_transport() {
            "transport"
        } else if self.is_rejection() {
            "rejected"
        } else {
            "invalid"
        }
    }
}
