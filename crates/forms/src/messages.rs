//! Validation messages keyed by field identity.

use std::collections::HashSet;
use std::fmt;

use fieldwise_core::FieldIdentifier;
use indexmap::IndexMap;
use parking_lot::RwLock;

/// Current error messages per field.
///
/// Fields keep the order in which they first received a message.
#[derive(Default)]
pub struct MessageStore {
    messages: RwLock<IndexMap<FieldIdentifier, Vec<String>>>,
}

impl MessageStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a message to `field`.
    pub fn add(&self, field: FieldIdentifier, message: impl Into<String>) {
        self.messages
            .write()
            .entry(field)
            .or_default()
            .push(message.into());
    }

    /// Removes every message.
    pub fn clear(&self) {
        self.messages.write().clear();
    }

    /// Removes the messages of one field.
    pub fn clear_field(&self, field: &FieldIdentifier) {
        self.messages.write().shift_remove(field);
    }

    /// Messages currently attached to `field`.
    pub fn messages_for(&self, field: &FieldIdentifier) -> Vec<String> {
        self.messages.read().get(field).cloned().unwrap_or_default()
    }

    /// Replaces the messages of one field. An empty list clears it.
    pub fn replace_field(&self, field: FieldIdentifier, messages: Vec<String>) {
        let mut guard = self.messages.write();
        if messages.is_empty() {
            guard.shift_remove(&field);
        } else {
            guard.insert(field, messages);
        }
    }

    /// Replaces the whole content of the store in one step.
    pub fn replace_all(&self, messages: IndexMap<FieldIdentifier, Vec<String>>) {
        self.replace_all_except(messages, &HashSet::new());
    }

    /// Like [`replace_all`](Self::replace_all), but the current messages of
    /// `keep` survive and are not overwritten.
    pub(crate) fn replace_all_except(
        &self,
        messages: IndexMap<FieldIdentifier, Vec<String>>,
        keep: &HashSet<FieldIdentifier>,
    ) {
        let mut guard = self.messages.write();
        let mut next: IndexMap<FieldIdentifier, Vec<String>> = guard
            .drain(..)
            .filter(|(field, _)| keep.contains(field))
            .collect();
        for (field, list) in messages {
            if list.is_empty() || keep.contains(&field) {
                continue;
            }
            next.entry(field).or_default().extend(list);
        }
        *guard = next;
    }

    /// Drops the messages of fields whose instance no longer exists.
    /// Returns how many fields were removed.
    pub fn prune_dropped(&self) -> usize {
        let mut guard = self.messages.write();
        let before = guard.len();
        guard.retain(|field, _| field.is_live());
        before - guard.len()
    }

    /// Whether no field has messages.
    pub fn is_empty(&self) -> bool {
        self.messages.read().values().all(Vec::is_empty)
    }

    /// Every message, field by field.
    pub fn all_messages(&self) -> Vec<String> {
        self.messages.read().values().flatten().cloned().collect()
    }

    /// Fields that currently have messages.
    pub fn fields(&self) -> Vec<FieldIdentifier> {
        self.messages.read().keys().cloned().collect()
    }

    /// Number of fields with messages.
    pub fn len(&self) -> usize {
        self.messages.read().len()
    }
}

impl fmt::Debug for MessageStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.messages.read().iter()).finish()
    }
}
