//! Capabilities a container calls into
//!
//! The container decides *what* changes; implementors of these traits decide
//! how the change becomes visible.

use super::instance::InstanceId;
use super::soft_delete::UndoMarker;

/// Where a new instance goes relative to its siblings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertPosition {
    Head,
    Tail,
    After(InstanceId),
}

/// Presentation layer for materialized instances
pub trait RenderTarget {
    /// Realize `markup` for a new instance at `position`.
    fn insert(&mut self, id: InstanceId, markup: &str, position: InsertPosition);

    /// Drop an instance from the presentation.
    fn remove(&mut self, id: InstanceId);

    /// Replace the markup of an instance that is already shown.
    fn update(&mut self, _id: InstanceId, _markup: &str) {}

    /// Hide or reveal an instance's payload.
    fn set_hidden(&mut self, _id: InstanceId, _hidden: bool) {}

    fn show_undo_marker(&mut self, _marker: &UndoMarker) {}

    fn dismiss_undo_marker(&mut self, _id: InstanceId) {}

    /// Enable or disable the add affordance.
    fn set_add_enabled(&mut self, _enabled: bool) {}

    /// Show or hide ordering controls.
    fn set_sortable_controls(&mut self, _visible: bool) {}
}

/// Blocking message to the user
pub trait Confirm {
    fn alert(&mut self, message: &str);
}

/// Render target that discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRenderTarget;

impl RenderTarget for NullRenderTarget {
    fn insert(&mut self, _id: InstanceId, _markup: &str, _position: InsertPosition) {}

    fn remove(&mut self, _id: InstanceId) {}
}

/// Confirmation capability that only logs the message
#[derive(Debug, Default, Clone, Copy)]
pub struct LogConfirm;

impl Confirm for LogConfirm {
    fn alert(&mut self, message: &str) {
        tracing::warn!(message, "user alert");
    }
}
