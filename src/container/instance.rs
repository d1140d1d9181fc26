//! Instance identity and lifecycle state

use std::fmt;

use crate::materialize::Overrides;
use crate::template::TemplateName;

/// Opaque, container-scoped instance identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(pub(crate) u64);

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "instance-{}", self.0)
    }
}

/// Lifecycle of one instance
///
/// ```text
/// Active --remove--> PendingDelete --undo--> Active
///                    PendingDelete --submit--> Excluded
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceState {
    Active,
    PendingDelete,
    /// Removed and submitted; kept in memory until the next full load
    Excluded,
}

/// Where an instance came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceOrigin {
    /// Rendered by the server for a persisted record
    Existing,
    /// Created by an add or a bulk populate
    Added,
    /// Blank item shown from the template before any data exists
    Placeholder,
}

/// One replicated sub-structure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instance {
    pub id: InstanceId,
    pub index: u64,
    pub template_name: TemplateName,
    /// Position among live instances; only set in sortable containers
    pub order: Option<usize>,
    pub state: InstanceState,
    pub origin: InstanceOrigin,
    /// Materialized template text
    pub markup: String,
    /// Default values applied when the instance was materialized
    pub values: Overrides,
}

impl Instance {
    pub fn is_active(&self) -> bool {
        self.state == InstanceState::Active
    }
}
