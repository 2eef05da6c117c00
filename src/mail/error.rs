use thiserror::Error;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("TLS error: {0}")]
    Tls(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Fetch error: {0}")]
    Fetch(String),

    #[error("Bad response: {0}")]
    BadResponse(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Missing data: {0}")]
    MissingData(String),

    #[error("Invalid address: {0}")]
    Address(String),

    #[error("Email building error: {0}")]
    Build(#[from] lettre::error::Error),

    #[error("Email sending error: {0}")]
    Send(#[from] lettre::transport::smtp::Error),
}

impl From<async_imap::error::Error> for MailError {
    fn from(err: async_imap::error::Error) -> Self {
        match err {
            async_imap::error::Error::Parse(e) => MailError::Parse(e.to_string()),
            async_imap::error::Error::No(msg) => MailError::Fetch(msg),
            async_imap::error::Error::Bad(msg) => MailError::BadResponse(msg),
            async_imap::error::Error::Io(e) => MailError::Connection(e.to_string()),
            async_imap::error::Error::Validate(e) => MailError::Fetch(e.to_string()),
            _ => MailError::Fetch(err.to_string()),
        }
    }
}

impl From<std::io::Error> for MailError {
    fn from(err: std::io::Error) -> Self {
        MailError::Connection(err.to_string())
    }
}

impl From<native_tls::Error> for MailError {
    fn from(err: native_tls::Error) -> Self {
        MailError::Tls(err.to_string())
    }
}
