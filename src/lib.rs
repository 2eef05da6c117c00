//! Library core for Switchboard: one backend for email, SMS and
//! browser-softphone calls behind a single HTTP surface.

pub mod api;
pub mod config;
pub mod mail;
pub mod models;
pub mod reconciler;
pub mod store;
pub mod telephony;

pub mod prelude {
    pub use crate::api::{configure_routes, ApiError, AppState};
    pub use crate::config::Settings;
    pub use crate::mail::{EmailSender, ImapFetcher, MailError, MailFetcher, SmtpMailer};
    pub use crate::models::{Attachment, CallSession, CallState, Direction, Message};
    pub use crate::store::{MemoryStore, RecordStore, SmsRecord, SqliteStore, StoreEvent};
    pub use crate::telephony::{TelephonyApi, TelephonyError, TwilioRestClient, VoiceResponse};

    pub use log::{debug, error, info, warn};
    pub use std::sync::Arc;
}
