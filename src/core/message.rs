//! Chat messages and notifications delivered by the change feed

use crate::core::listing::{ListingId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A message in a buyer/seller conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub sender_id: UserId,
    pub body: String,
    pub sent_at: DateTime<Utc>,
    /// Reference chosen by the sending client, echoed back by the store so
    /// an optimistic copy can be reconciled with the persisted row
    #[serde(default)]
    pub client_ref: Option<Uuid>,
    /// Listing the conversation is about, if any
    #[serde(default)]
    pub listing_id: Option<ListingId>,
}

/// What a notification is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Message,
    Like,
    ListingSold,
    Moderation,
    System,
}

/// A notification addressed to one user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub recipient_id: UserId,
    pub kind: NotificationKind,
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub listing_id: Option<ListingId>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub read: bool,
}

impl Notification {
    pub fn new(recipient_id: UserId, kind: NotificationKind, title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            recipient_id,
            kind,
            title: title.into(),
            body: String::new(),
            listing_id: None,
            created_at: Utc::now(),
            read: false,
        }
    }
}
