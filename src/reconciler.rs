//! Client-side inbox cache reconciliation. A fetch replaces the whole
//! snapshot; live pushes append; local seen flips patch in place without
//! waiting for the next full fetch.

use crate::models::Message;

/// Reconciled view of an inbox snapshot plus incremental updates.
#[derive(Debug, Default)]
pub struct Inbox {
    messages: Vec<Message>,
}

impl Inbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the entire snapshot, newest first.
    pub fn replace_all(&mut self, mut messages: Vec<Message>) {
        messages.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
        self.messages = messages;
    }

    /// Appends one incrementally-delivered message at its sorted position.
    pub fn push(&mut self, message: Message) {
        let at = self
            .messages
            .partition_point(|m| (&m.timestamp, &m.id) > (&message.timestamp, &message.id));
        self.messages.insert(at, message);
    }

    /// Flips the seen flag on a cached message. Unknown ids and repeat
    /// flips are no-ops.
    pub fn mark_seen(&mut self, id: &str) {
        if let Some(message) = self.messages.iter_mut().find(|m| m.id == id) {
            message.seen = true;
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn unseen_count(&self) -> usize {
        self.messages.iter().filter(|m| !m.seen).count()
    }
}
