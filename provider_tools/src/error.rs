use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("{0} credentials are not configured")]
    NotConfigured(&'static str),
    #[error("Invalid REST request: {0}")]
    RestRequestError(String),
    #[error("Invalid REST response: {0}")]
    RestResponseError(String),
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
    #[error("Query failed. Error {status}. {message}")]
    QueryError { status: u16, message: String },
    #[error("The provider did not answer in time")]
    Timeout,
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),
}

impl ProviderApiError {
    /// The provider's HTTP status, if it answered with an error.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::QueryError { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// MailerLite and friends report duplicates with an "already exists" message rather than a dedicated status.
    pub fn is_already_exists(&self) -> bool {
        match self {
            Self::QueryError { status, message } => {
                *status == 409 || message.to_ascii_lowercase().contains("already exists")
            },
            _ => false,
        }
    }
}
