pub mod error;
pub mod imap;
pub mod normalizer;
pub mod smtp;

pub use error::MailError;
pub use imap::{ImapFetcher, MailFetcher};
pub use smtp::{EmailSender, OutgoingAttachment, OutgoingEmail, SmtpMailer};
