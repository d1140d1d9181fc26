//! Fieldset Replicator - repeatable form structures with depth-aware indexing
//!
//! This library captures "new item" prototypes of repeatable form fieldsets,
//! rewrites the index that belongs to each replication container, and tracks
//! the live set of instances: adding, soft-deleting with undo, reordering and
//! restoring previously submitted values.
//!
//! # Example
//!
//! ```rust
//! use fieldset_replicator::rewrite;
//!
//! let text = rewrite("Menus[1].SubMenus[2].Items[3].URL", 1).unwrap();
//! assert_eq!(text, "Menus[1].SubMenus[{{index}}].Items[3].URL");
//! ```

pub mod config;
pub mod container;
pub mod error;
pub mod materialize;
pub mod parser;
pub mod populate;
pub mod template;

pub use config::{ConfigError, ContainerConfig};
pub use container::{
    AddOutcome, Confirm, Container, ContainerError, ContainerEvent, InsertPosition, Instance,
    InstanceId, InstanceOrigin, InstanceState, RenderTarget, SubmissionEntry, UndoMarker,
};
pub use error::{Diagnostic, ParseError};
pub use materialize::{materialize, Materialized, Overrides};
pub use populate::populate;
pub use template::{Template, TemplateError, TemplateName, TemplateStore};

use thiserror::Error;

/// Errors from the end-to-end helpers
#[derive(Debug, Error)]
pub enum ReplicateError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("template error: {0}")]
    Template(#[from] TemplateError),

    #[error("container error: {0}")]
    Container(#[from] ContainerError),
}

/// Rewrite template text for a container `depth` levels deep
///
/// The index owned by the container is replaced with `{{index}}`; every
/// other index is kept as written.
///
/// # Example
///
/// ```rust
/// use fieldset_replicator::rewrite;
///
/// let html = r#"<input name="Menus[0].Title"><input name="Menus[0].Items[0].URL">"#;
/// let text = rewrite(html, 0).unwrap();
/// assert_eq!(
///     text,
///     r#"<input name="Menus[{{index}}].Title"><input name="Menus[{{index}}].Items[0].URL">"#
/// );
/// ```
pub fn rewrite(source: &str, depth: usize) -> Result<String, TemplateError> {
    Ok(template::rewrite(source, depth)?.join(config::DEFAULT_PLACEHOLDER))
}

/// Capture `source` and materialize `count` new instances
///
/// # Example
///
/// ```rust
/// use fieldset_replicator::{replicate, ContainerConfig};
///
/// let items = replicate("Links[3].URL", ContainerConfig::new(), 2).unwrap();
/// assert_eq!(items, vec!["Links[8].URL", "Links[9].URL"]);
/// ```
pub fn replicate(
    source: &str,
    config: ContainerConfig,
    count: usize,
) -> Result<Vec<String>, ReplicateError> {
    let mut container = Container::new(config);
    container.capture(None, source)?;

    let mut markup = Vec::with_capacity(count);
    for _ in 0..count {
        match container.add(None, &Overrides::new())? {
            AddOutcome::Added(instance) => markup.push(instance.markup),
            AddOutcome::Rejected => break,
        }
    }
    Ok(markup)
}
