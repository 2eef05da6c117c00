//! Scoped IMAP access: one connection per fetch, torn down on every exit path.

use async_trait::async_trait;
use chrono::Utc;
use futures_util::TryStreamExt;
use log::{debug, info, warn};
use tokio::net::TcpStream;
use tokio_util::compat::TokioAsyncReadCompatExt;

use crate::config::ImapConfig;
use crate::mail::error::MailError;
use crate::mail::normalizer::{self, RawEmail};
use crate::models::Message;

type TlsCompatStream = tokio_util::compat::Compat<tokio_native_tls::TlsStream<TcpStream>>;
type ImapSession = async_imap::Session<TlsCompatStream>;

/// Fetches the most recent mailbox entries as normalized messages.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MailFetcher: Send + Sync {
    async fn fetch_recent(&self, limit: u32) -> Result<Vec<Message>, MailError>;
}

/// [`MailFetcher`] backed by a real IMAP mailbox. The connection is opened,
/// used for one bounded fetch and logged out within a single call.
pub struct ImapFetcher {
    config: ImapConfig,
}

impl ImapFetcher {
    pub fn new(config: ImapConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl MailFetcher for ImapFetcher {
    async fn fetch_recent(&self, limit: u32) -> Result<Vec<Message>, MailError> {
        let mut session = connect(&self.config).await?;
        let result = fetch_window(&mut session, limit).await;
        if let Err(e) = session.logout().await {
            warn!("IMAP logout failed: {}", e);
        }
        result
    }
}

async fn connect(config: &ImapConfig) -> Result<ImapSession, MailError> {
    debug!("Connecting to IMAP server {}:{}", config.host, config.port);
    let tcp_stream = TcpStream::connect((config.host.as_str(), config.port)).await?;

    let tls = native_tls::TlsConnector::builder().build()?;
    let tls = tokio_native_tls::TlsConnector::from(tls);
    let tls_stream = tls
        .connect(&config.host, tcp_stream)
        .await
        .map_err(|e| MailError::Tls(e.to_string()))?;

    let client = async_imap::Client::new(tls_stream.compat());
    let session = client
        .login(&config.user, &config.pass)
        .await
        .map_err(|(e, _client)| MailError::Auth(e.to_string()))?;
    info!("IMAP login successful for user {}", config.user);
    Ok(session)
}

/// Selects INBOX and fetches the last `limit` entries by sequence position.
/// Any provider error aborts the whole batch; there is no partial result.
async fn fetch_window(session: &mut ImapSession, limit: u32) -> Result<Vec<Message>, MailError> {
    let mailbox = session.select("INBOX").await?;
    let exists = mailbox.exists;
    debug!("INBOX selected, {} messages present", exists);
    if exists == 0 || limit == 0 {
        return Ok(Vec::new());
    }

    let start = exists.saturating_sub(limit - 1).max(1);
    let range = format!("{}:{}", start, exists);

    let mut raw = Vec::new();
    {
        let mut stream = session
            .fetch(&range, "(UID ENVELOPE FLAGS INTERNALDATE BODY[])")
            .await?;
        while let Some(fetch) = stream.try_next().await? {
            let uid = fetch
                .uid
                .ok_or_else(|| MailError::MissingData("fetch result without UID".to_string()))?;
            let flags = fetch.flags().map(|f| flag_name(&f)).collect();
            let internal_date = fetch.internal_date().map(|d| d.with_timezone(&Utc));
            let source = fetch
                .body()
                .map(|b| b.to_vec())
                .ok_or_else(|| MailError::MissingData("message source not returned".to_string()))?;
            raw.push(RawEmail {
                uid,
                flags,
                internal_date,
                source,
            });
        }
    }

    info!("Fetched {} messages from window {}", raw.len(), range);
    Ok(normalizer::normalize_batch(raw))
}

fn flag_name(flag: &async_imap::types::Flag<'_>) -> String {
    use async_imap::types::Flag;
    match flag {
        Flag::Seen => "\\Seen".to_string(),
        Flag::Answered => "\\Answered".to_string(),
        Flag::Flagged => "\\Flagged".to_string(),
        Flag::Deleted => "\\Deleted".to_string(),
        Flag::Draft => "\\Draft".to_string(),
        Flag::Recent => "\\Recent".to_string(),
        Flag::MayCreate => "\\*".to_string(),
        Flag::Custom(name) => name.to_string(),
    }
}
