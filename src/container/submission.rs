//! What the form serializer sees of a container

use super::instance::InstanceId;

/// Field name suffix that asks the server to delete a persisted record
pub const DESTROY_FIELD: &str = "_destroy";

/// One instance as it takes part in a form submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionEntry {
    pub id: InstanceId,
    /// Data path such as `Menus[1].SubMenus[7]`; `None` for index-free templates
    pub path: Option<String>,
    /// The instance is a persisted record the user removed
    pub deleted: bool,
}

impl SubmissionEntry {
    /// The `_destroy` field to submit for a deleted record
    pub fn destroy_field(&self) -> Option<(String, String)> {
        if !self.deleted {
            return None;
        }
        let path = self.path.as_ref()?;
        Some((format!("{}.{}", path, DESTROY_FIELD), "1".to_string()))
    }
}
