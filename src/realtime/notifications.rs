//! Bounded notification feed for one recipient

use super::EventMerge;
use crate::core::events::MarketEvent;
use crate::core::listing::UserId;
use crate::core::message::Notification;
use std::collections::VecDeque;
use uuid::Uuid;

/// Newest-first notifications addressed to `recipient`
///
/// Holds at most `capacity` entries; the oldest fall off the end.
#[derive(Debug, Clone)]
pub struct NotificationFeed {
    recipient: UserId,
    capacity: usize,
    items: VecDeque<Notification>,
}

impl NotificationFeed {
    pub fn new(recipient: UserId, capacity: usize) -> Self {
        Self {
            recipient,
            capacity: capacity.max(1),
            items: VecDeque::new(),
        }
    }

    /// Merge a notification, returning `false` if it is foreign, known, or
    /// older than everything a full feed holds
    pub fn push(&mut self, notification: Notification) -> bool {
        if notification.recipient_id != self.recipient
            || self.items.iter().any(|n| n.id == notification.id)
        {
            return false;
        }

        let index = self
            .items
            .partition_point(|n| n.created_at > notification.created_at);
        if index >= self.capacity {
            return false;
        }
        self.items.insert(index, notification);
        self.items.truncate(self.capacity);
        true
    }

    pub fn unread_count(&self) -> usize {
        self.items.iter().filter(|n| !n.read).count()
    }

    pub fn mark_read(&mut self, id: Uuid) -> bool {
        match self.items.iter_mut().find(|n| n.id == id && !n.read) {
            Some(notification) => {
                notification.read = true;
                true
            }
            None => false,
        }
    }

    /// Mark everything read, returning how many changed
    pub fn mark_all_read(&mut self) -> usize {
        let mut changed = 0;
        for notification in self.items.iter_mut().filter(|n| !n.read) {
            notification.read = true;
            changed += 1;
        }
        changed
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notification> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl EventMerge for NotificationFeed {
    fn merge(&mut self, event: &MarketEvent) -> bool {
        match event {
            MarketEvent::NotificationCreated { notification } => self.push(notification.clone()),
            _ => false,
        }
    }
}
