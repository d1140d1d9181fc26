//! Undo markers for soft-deleted instances

use super::instance::InstanceId;

/// Dismissible marker shown in place of a removed instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndoMarker {
    /// One-shot trigger handed to the presentation layer
    pub token: u64,
    pub instance: InstanceId,
    pub message: String,
}

/// Tracks the undo window of every pending deletion
#[derive(Debug, Default)]
pub struct SoftDeleteCoordinator {
    pending: Vec<UndoMarker>,
    next_token: u64,
}

impl SoftDeleteCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open an undo window for `instance`
    ///
    /// Returns `None` when the instance already has one.
    pub fn begin(&mut self, instance: InstanceId, message: &str) -> Option<UndoMarker> {
        if self.is_pending(instance) {
            return None;
        }
        let marker = UndoMarker {
            token: self.next_token,
            instance,
            message: message.to_string(),
        };
        self.next_token += 1;
        self.pending.push(marker.clone());
        Some(marker)
    }

    pub fn is_pending(&self, instance: InstanceId) -> bool {
        self.pending.iter().any(|m| m.instance == instance)
    }

    /// The instance a marker token restores, if the marker is still live
    pub fn resolve(&self, token: u64) -> Option<InstanceId> {
        self.pending
            .iter()
            .find(|m| m.token == token)
            .map(|m| m.instance)
    }

    /// Close the undo window for `instance`
    pub fn take(&mut self, instance: InstanceId) -> Option<UndoMarker> {
        let at = self.pending.iter().position(|m| m.instance == instance)?;
        Some(self.pending.remove(at))
    }

    /// Close every window, returning the markers in removal order
    pub fn clear(&mut self) -> Vec<UndoMarker> {
        std::mem::take(&mut self.pending)
    }

    pub fn pending(&self) -> impl Iterator<Item = &UndoMarker> {
        self.pending.iter()
    }
}
