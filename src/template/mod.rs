//! Template capture and index allocation
//!
//! A container captures one prototype per template name when it is
//! initialized. Each prototype is parsed into index paths and the index
//! owned by the container is swapped for a placeholder, taking the nesting
//! depth into account:
//!
//! ```text
//! depth 0:  Menus[{{index}}].SubMenus[2].Items[3].URL
//! depth 1:  Menus[1].SubMenus[{{index}}].Items[3].URL
//! depth 2:  Menus[1].SubMenus[2].Items[{{index}}].URL
//! ```
//!
//! The literal found at the replaced position seeds the index counter.

mod allocator;
mod registry;
mod rewrite;

pub use allocator::IndexAllocator;
pub use registry::{display_name, Template, TemplateError, TemplateName, TemplateStore};
pub use rewrite::{rewrite, Piece, Rewrite};
