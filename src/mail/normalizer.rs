//! Turns raw mailbox fetch results into uniform [`Message`] records.
//!
//! The provider hands back entries in sequence order, which can diverge from
//! date order; the batch is therefore re-sorted by descending timestamp
//! before it is returned.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::{DateTime, TimeZone, Utc};
use mail_parser::{MessageParser, MimeHeaders};

use crate::models::{Attachment, Message};

/// Number of characters of plain text kept as the list-view snippet.
const SNIPPET_LEN: usize = 100;

pub const SEEN_FLAG: &str = "\\Seen";

/// One fetched mailbox entry before normalization.
#[derive(Debug, Clone)]
pub struct RawEmail {
    pub uid: u32,
    pub flags: Vec<String>,
    pub internal_date: Option<DateTime<Utc>>,
    pub source: Vec<u8>,
}

/// Normalizes a whole fetch window and re-sorts it latest-first.
pub fn normalize_batch(raw: Vec<RawEmail>) -> Vec<Message> {
    let mut messages: Vec<Message> = raw.into_iter().map(normalize_email).collect();
    messages.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
    messages
}

/// Normalizes a single entry. Missing fields are defaulted, never null:
/// body falls back from HTML to plain text to the empty string, and an
/// attachment without a Content-ID is excluded from the result.
pub fn normalize_email(raw: RawEmail) -> Message {
    let parsed = MessageParser::default().parse(&raw.source);

    let (from, subject, body, snippet, attachments, parsed_date) = match &parsed {
        Some(msg) => {
            let from = msg
                .from()
                .and_then(|a| a.first())
                .and_then(|addr| addr.address.as_deref())
                .unwrap_or_default()
                .to_string();
            let subject = msg.subject().map(str::to_string);

            let text = msg.body_text(0).map(|s| s.into_owned());
            let html = msg.body_html(0).map(|s| s.into_owned());
            let body = html.or_else(|| text.clone()).unwrap_or_default();
            let snippet = text
                .as_deref()
                .map(|t| t.chars().take(SNIPPET_LEN).collect())
                .unwrap_or_default();

            let attachments = inline_attachments(msg);
            let parsed_date = msg
                .date()
                .and_then(|d| Utc.timestamp_opt(d.to_timestamp(), 0).single());

            (from, subject, body, snippet, attachments, parsed_date)
        }
        None => (
            String::new(),
            None,
            String::new(),
            String::new(),
            Vec::new(),
            None,
        ),
    };

    let timestamp = raw
        .internal_date
        .or(parsed_date)
        .unwrap_or_else(|| Utc.timestamp_opt(0, 0).unwrap());

    let seen = raw.flags.iter().any(|f| f == SEEN_FLAG);

    Message {
        id: raw.uid.to_string(),
        from,
        subject,
        body,
        snippet,
        timestamp,
        seen,
        flags: raw.flags,
        attachments,
    }
}

/// Attachments with a Content-ID are returned as inline `data:` URLs;
/// parts without one cannot be referenced from the rendered body and are
/// dropped, matching the upstream contract.
fn inline_attachments(msg: &mail_parser::Message<'_>) -> Vec<Attachment> {
    msg.attachments()
        .filter(|part| part.content_id().is_some())
        .map(|part| {
            let mime_type = part
                .content_type()
                .map(|ct| match ct.subtype() {
                    Some(sub) => format!("{}/{}", ct.ctype(), sub),
                    None => ct.ctype().to_string(),
                })
                .unwrap_or_else(|| "application/octet-stream".to_string());

            Attachment {
                name: part
                    .attachment_name()
                    .unwrap_or("attachment")
                    .to_string(),
                url: format!("data:{};base64,{}", mime_type, BASE64.encode(part.contents())),
                mime_type,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(uid: u32, date_header: &str, body: &str) -> RawEmail {
        let source = format!(
            "From: alice@example.com\r\nTo: bob@example.com\r\nSubject: Test {uid}\r\nDate: {date_header}\r\nContent-Type: text/plain; charset=utf-8\r\n\r\n{body}\r\n"
        );
        RawEmail {
            uid,
            flags: Vec::new(),
            internal_date: None,
            source: source.into_bytes(),
        }
    }

    #[test]
    fn batch_is_sorted_by_descending_timestamp() {
        // Sequence order deliberately diverges from date order.
        let batch = vec![
            raw(1, "Wed, 15 Jan 2025 10:00:00 +0000", "oldest"),
            raw(2, "Fri, 17 Jan 2025 10:00:00 +0000", "newest"),
            raw(3, "Thu, 16 Jan 2025 10:00:00 +0000", "middle"),
        ];
        let messages = normalize_batch(batch);
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].id, "2");
        assert_eq!(messages[1].id, "3");
        assert_eq!(messages[2].id, "1");
        assert!(messages[0].timestamp > messages[1].timestamp);
    }

    #[test]
    fn internal_date_takes_precedence_over_date_header() {
        let mut entry = raw(9, "Wed, 15 Jan 2025 10:00:00 +0000", "hi");
        let provider_date = Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap();
        entry.internal_date = Some(provider_date);
        let message = normalize_email(entry);
        assert_eq!(message.timestamp, provider_date);
    }

    #[test]
    fn html_body_is_preferred_over_plain_text() {
        let source = concat!(
            "From: alice@example.com\r\n",
            "Subject: Multipart\r\n",
            "MIME-Version: 1.0\r\n",
            "Content-Type: multipart/alternative; boundary=\"b1\"\r\n",
            "\r\n",
            "--b1\r\n",
            "Content-Type: text/plain; charset=utf-8\r\n",
            "\r\n",
            "plain version\r\n",
            "--b1\r\n",
            "Content-Type: text/html; charset=utf-8\r\n",
            "\r\n",
            "<p>html version</p>\r\n",
            "--b1--\r\n",
        );
        let message = normalize_email(RawEmail {
            uid: 1,
            flags: Vec::new(),
            internal_date: None,
            source: source.as_bytes().to_vec(),
        });
        assert!(message.body.contains("html version"));
        assert!(message.snippet.starts_with("plain version"));
    }

    #[test]
    fn unparseable_source_yields_empty_body_not_null() {
        let message = normalize_email(RawEmail {
            uid: 7,
            flags: vec![SEEN_FLAG.to_string()],
            internal_date: None,
            source: Vec::new(),
        });
        assert_eq!(message.body, "");
        assert_eq!(message.snippet, "");
        assert_eq!(message.from, "");
        assert!(message.seen);
        assert!(message.attachments.is_empty());
    }

    #[test]
    fn snippet_is_capped_at_100_chars() {
        let long_body = "x".repeat(500);
        let message = normalize_email(raw(4, "Wed, 15 Jan 2025 10:00:00 +0000", &long_body));
        assert_eq!(message.snippet.chars().count(), 100);
    }

    #[test]
    fn attachment_without_content_id_is_excluded() {
        let source = concat!(
            "From: alice@example.com\r\n",
            "Subject: Attachments\r\n",
            "MIME-Version: 1.0\r\n",
            "Content-Type: multipart/mixed; boundary=\"b2\"\r\n",
            "\r\n",
            "--b2\r\n",
            "Content-Type: text/plain; charset=utf-8\r\n",
            "\r\n",
            "see attached\r\n",
            "--b2\r\n",
            "Content-Type: image/png\r\n",
            "Content-ID: <logo@example.com>\r\n",
            "Content-Disposition: attachment; filename=\"logo.png\"\r\n",
            "Content-Transfer-Encoding: base64\r\n",
            "\r\n",
            "aGVsbG8=\r\n",
            "--b2\r\n",
            "Content-Type: application/pdf\r\n",
            "Content-Disposition: attachment; filename=\"report.pdf\"\r\n",
            "Content-Transfer-Encoding: base64\r\n",
            "\r\n",
            "d29ybGQ=\r\n",
            "--b2--\r\n",
        );
        let message = normalize_email(RawEmail {
            uid: 2,
            flags: Vec::new(),
            internal_date: None,
            source: source.as_bytes().to_vec(),
        });
        assert_eq!(message.attachments.len(), 1);
        let att = &message.attachments[0];
        assert_eq!(att.name, "logo.png");
        assert_eq!(att.mime_type, "image/png");
        assert!(att.url.starts_with("data:image/png;base64,"));
    }

    #[test]
    fn seen_flag_drives_seen_bool() {
        let mut entry = raw(5, "Wed, 15 Jan 2025 10:00:00 +0000", "hi");
        entry.flags = vec!["\\Answered".to_string()];
        assert!(!normalize_email(entry.clone()).seen);
        entry.flags.push(SEEN_FLAG.to_string());
        assert!(normalize_email(entry).seen);
    }
}
