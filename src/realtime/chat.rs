//! Optimistic chat thread
//!
//! Outgoing messages are shown immediately as pending entries carrying a
//! client reference. When the store echoes the persisted row back through
//! the change feed, the pending entry is replaced in place. Rows already
//! present are ignored, so a message merged twice shows once.

use super::EventMerge;
use crate::core::events::MarketEvent;
use crate::core::listing::UserId;
use crate::core::message::ChatMessage;
use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryState {
    /// Sent locally, not yet echoed by the store
    Pending,
    Delivered,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatEntry {
    pub message: ChatMessage,
    pub state: DeliveryState,
}

/// Messages of one conversation, ordered by sent time
#[derive(Debug, Clone)]
pub struct ChatThread {
    conversation_id: Uuid,
    viewer: UserId,
    entries: Vec<ChatEntry>,
}

impl ChatThread {
    pub fn new(conversation_id: Uuid, viewer: UserId) -> Self {
        Self {
            conversation_id,
            viewer,
            entries: Vec::new(),
        }
    }

    pub fn conversation_id(&self) -> Uuid {
        self.conversation_id
    }

    /// Seed the thread with history fetched from the store
    pub fn with_history(mut self, history: impl IntoIterator<Item = ChatMessage>) -> Self {
        for message in history {
            self.merge_received(message);
        }
        self
    }

    /// Append a pending message from the viewer and return it for sending
    pub fn push_optimistic(&mut self, body: impl Into<String>) -> ChatMessage {
        let client_ref = Uuid::new_v4();
        let message = ChatMessage {
            id: client_ref,
            conversation_id: self.conversation_id,
            sender_id: self.viewer,
            body: body.into(),
            sent_at: Utc::now(),
            client_ref: Some(client_ref),
            listing_id: None,
        };
        self.insert_ordered(ChatEntry {
            message: message.clone(),
            state: DeliveryState::Pending,
        });
        message
    }

    /// Merge a persisted message
    ///
    /// Returns `false` for messages of other conversations and for rows
    /// the thread already shows.
    pub fn merge_received(&mut self, message: ChatMessage) -> bool {
        if message.conversation_id != self.conversation_id {
            return false;
        }
        if self
            .entries
            .iter()
            .any(|e| e.message.id == message.id && e.state == DeliveryState::Delivered)
        {
            return false;
        }

        let optimistic = message.client_ref.and_then(|client_ref| {
            self.entries.iter().position(|e| {
                e.state != DeliveryState::Delivered && e.message.client_ref == Some(client_ref)
            })
        });

        if let Some(index) = optimistic {
            self.entries.remove(index);
        }
        self.insert_ordered(ChatEntry {
            message,
            state: DeliveryState::Delivered,
        });
        true
    }

    /// Flag a pending message as failed; returns `false` if none matched
    pub fn mark_failed(&mut self, client_ref: Uuid) -> bool {
        match self.entries.iter_mut().find(|e| {
            e.state == DeliveryState::Pending && e.message.client_ref == Some(client_ref)
        }) {
            Some(entry) => {
                entry.state = DeliveryState::Failed;
                true
            }
            None => false,
        }
    }

    /// Drop a failed message, returning it for a resend
    pub fn take_failed(&mut self, client_ref: Uuid) -> Option<ChatMessage> {
        let index = self.entries.iter().position(|e| {
            e.state == DeliveryState::Failed && e.message.client_ref == Some(client_ref)
        })?;
        Some(self.entries.remove(index).message)
    }

    pub fn entries(&self) -> &[ChatEntry] {
        &self.entries
    }

    pub fn pending_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.state == DeliveryState::Pending)
            .count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // Equal timestamps keep arrival order
    fn insert_ordered(&mut self, entry: ChatEntry) {
        let index = self
            .entries
            .partition_point(|e| e.message.sent_at <= entry.message.sent_at);
        self.entries.insert(index, entry);
    }
}

impl EventMerge for ChatThread {
    fn merge(&mut self, event: &MarketEvent) -> bool {
        match event {
            MarketEvent::MessageReceived { message } => self.merge_received(message.clone()),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn thread() -> ChatThread {
        ChatThread::new(Uuid::new_v4(), Uuid::new_v4())
    }

    fn incoming(thread: &ChatThread, body: &str) -> ChatMessage {
        ChatMessage {
            id: Uuid::new_v4(),
            conversation_id: thread.conversation_id(),
            sender_id: Uuid::new_v4(),
            body: body.to_string(),
            sent_at: Utc::now(),
            client_ref: None,
            listing_id: None,
        }
    }

    #[test]
    fn test_optimistic_message_reconciled_by_echo() {
        let mut thread = thread();
        let sent = thread.push_optimistic("is it still available?");
        assert_eq!(thread.pending_count(), 1);

        let echo = ChatMessage {
            id: Uuid::new_v4(),
            sent_at: sent.sent_at + Duration::milliseconds(40),
            ..sent.clone()
        };
        assert!(thread.merge_received(echo.clone()));

        assert_eq!(thread.len(), 1);
        assert_eq!(thread.entries()[0].message.id, echo.id);
        assert_eq!(thread.entries()[0].state, DeliveryState::Delivered);
        assert_eq!(thread.pending_count(), 0);
    }

    #[test]
    fn test_duplicate_and_foreign_messages_ignored() {
        let mut thread = thread();
        let message = incoming(&thread, "hello");

        assert!(thread.merge_received(message.clone()));
        assert!(!thread.merge_received(message));

        let mut foreign = incoming(&thread, "wrong room");
        foreign.conversation_id = Uuid::new_v4();
        assert!(!thread.merge_received(foreign));
        assert_eq!(thread.len(), 1);
    }

    #[test]
    fn test_messages_ordered_by_sent_at() {
        let mut thread = thread();
        let now = Utc::now();
        let mut late = incoming(&thread, "second");
        late.sent_at = now;
        let mut early = incoming(&thread, "first");
        early.sent_at = now - Duration::seconds(5);

        thread.merge_received(late);
        thread.merge_received(early);

        let bodies: Vec<&str> = thread
            .entries()
            .iter()
            .map(|e| e.message.body.as_str())
            .collect();
        assert_eq!(bodies, vec!["first", "second"]);
    }

    #[test]
    fn test_failed_message_can_be_taken_for_resend() {
        let mut thread = thread();
        let sent = thread.push_optimistic("offer 50k");
        let client_ref = sent.client_ref.unwrap();

        assert!(thread.mark_failed(client_ref));
        assert!(!thread.mark_failed(client_ref), "already failed");
        assert_eq!(thread.entries()[0].state, DeliveryState::Failed);

        let taken = thread.take_failed(client_ref).unwrap();
        assert_eq!(taken.body, "offer 50k");
        assert!(thread.is_empty());
    }

    #[test]
    fn test_merge_via_event() {
        let mut thread = thread();
        let message = incoming(&thread, "ping");
        let event = MarketEvent::MessageReceived { message };

        assert!(thread.merge(&event));
        assert!(!thread.merge(&MarketEvent::ListingDeleted {
            listing_id: Uuid::new_v4()
        }));
    }
}
