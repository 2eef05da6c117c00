use thiserror::Error;

#[derive(Debug, Error)]
pub enum TelephonyError {
    #[error("Telephony configuration error: {0}")]
    Config(String),

    #[error("Telephony request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Telephony API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Token encoding error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("Call-routing document error: {0}")]
    Twiml(String),

    #[error("Device error: {0}")]
    Device(String),
}
