//! Post-creation event bus.
//!
//! A bounded channel between record flows and background hooks. Emitting
//! never blocks and never fails the caller: a full or closed channel is
//! logged and the event dropped.

use serde::Serialize;
use tokio::sync::mpsc;

use crate::types::{Contact, RecordId};

/// Capacity of the event channel.
pub const EVENT_CHANNEL_SIZE: usize = 64;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum CrmEvent {
    #[serde(rename_all = "camelCase")]
    ContactCreated {
        id: RecordId,
        first_name: String,
        last_name: String,
        email: String,
    },
}

impl CrmEvent {
    pub fn contact_created(contact: &Contact) -> Self {
        Self::ContactCreated {
            id: contact.id,
            first_name: contact.first_name.clone(),
            last_name: contact.last_name.clone(),
            email: contact.email.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EventBus {
    sender: mpsc::Sender<CrmEvent>,
}

impl EventBus {
    pub fn new() -> (Self, mpsc::Receiver<CrmEvent>) {
        Self::with_capacity(EVENT_CHANNEL_SIZE)
    }

    pub fn with_capacity(capacity: usize) -> (Self, mpsc::Receiver<CrmEvent>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }

    /// Returns whether the event was queued.
    pub fn emit(&self, event: CrmEvent) -> bool {
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(event)) => {
                log::warn!("Event channel full, dropping {:?}", event);
                false
            }
            Err(mpsc::error::TrySendError::Closed(event)) => {
                log::warn!("Event channel closed, dropping {:?}", event);
                false
            }
        }
    }
}
