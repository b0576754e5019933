use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("The signature header is missing")]
    Missing,
    #[error("The signature header is malformed: {0}")]
    Malformed(String),
    #[error("The signature does not match the payload")]
    Mismatch,
    #[error("The signature timestamp is outside the tolerance window")]
    Expired,
}

/// Authenticates the raw body of a provider webhook against its signature header.
pub trait WebhookVerifier: Send + Sync {
    fn verify(&self, payload: &[u8], signature: Option<&str>) -> Result<(), SignatureError>;
}

/// Accepts every payload. Only ever installed outside production, and only when the operator opts in.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAllVerifier;

impl WebhookVerifier for AcceptAllVerifier {
    fn verify(&self, _payload: &[u8], _signature: Option<&str>) -> Result<(), SignatureError> {
        Ok(())
    }
}
