//! Template store for the prototypes captured at container initialization

use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, warn};

use crate::error::Diagnostic;

use super::rewrite::{rewrite, Piece, Rewrite};

/// Key of a template within one container; `None` in single-template mode
pub type TemplateName = Option<String>;

/// Errors that can occur during template operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    /// Template not found in store
    #[error("template not found: {}", display_name(.name))]
    NotFound { name: TemplateName },

    /// Live index paths in one template disagree on their chain prefix
    #[error("inconsistent index chain in template: expected '{expected}[..]', found '{found}[..]'")]
    InconsistentChain { expected: String, found: String },

    /// Every index up to `u64::MAX` has been handed out
    #[error("no indices left for template: {}", display_name(.name))]
    IndexOverflow { name: TemplateName },
}

/// Human-readable template name
pub fn display_name(name: &TemplateName) -> &str {
    name.as_deref().unwrap_or("<default>")
}

/// A captured template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    /// Template name
    pub name: TemplateName,
    /// Prototype text exactly as captured
    pub raw_text: String,
    /// Chain position of the index owned by this container
    pub placeholder_depth: usize,
    /// Literal index found at the live position (0 if none)
    pub seed_index: u64,
    /// Index of the first new instance: the seed plus the margin
    pub first_index: u64,
    /// Prototype text with the placeholder in place of the live index
    pub rewritten: String,
    /// Findings that made parts of the template fall back to verbatim text
    pub diagnostics: Vec<Diagnostic>,
    pieces: Vec<Piece>,
    stem: Option<String>,
}

impl Template {
    /// Parse and rewrite a prototype for a container `depth` levels deep
    ///
    /// New instances start `seed_margin` past the seed. A seed too close to
    /// `u64::MAX` for that is reported and the template is kept verbatim.
    pub fn capture(
        name: TemplateName,
        raw_text: &str,
        depth: usize,
        placeholder: &str,
        seed_margin: u64,
    ) -> Result<Self, TemplateError> {
        let Rewrite {
            mut pieces,
            mut seed_index,
            mut seed_span,
            mut stem,
            mut diagnostics,
        } = rewrite(raw_text, depth)?;

        let first_index = match seed_index.unwrap_or(0).checked_add(seed_margin) {
            Some(first) => first,
            None => {
                let span = seed_span.take().unwrap_or(0..raw_text.len());
                diagnostics.push(Diagnostic::malformed(
                    span,
                    format!("index literal leaves no room for a margin of {}", seed_margin),
                ));
                pieces = vec![Piece::Text(raw_text.to_string())];
                seed_index = None;
                stem = None;
                seed_margin
            }
        };

        let rewritten = pieces
            .iter()
            .map(|p| match p {
                Piece::Text(text) => text.as_str(),
                Piece::Placeholder => placeholder,
            })
            .collect();

        Ok(Self {
            name,
            raw_text: raw_text.to_string(),
            placeholder_depth: depth,
            seed_index: seed_index.unwrap_or(0),
            first_index,
            rewritten,
            diagnostics,
            pieces,
            stem,
        })
    }

    /// Whether the template has an index slot to fill
    pub fn has_index(&self) -> bool {
        self.pieces.iter().any(|p| matches!(p, Piece::Placeholder))
    }

    /// Template text with `index` written into every placeholder
    pub fn render(&self, index: u64) -> String {
        let index = index.to_string();
        let mut out = String::with_capacity(self.raw_text.len() + 8);
        for piece in &self.pieces {
            match piece {
                Piece::Text(text) => out.push_str(text),
                Piece::Placeholder => out.push_str(&index),
            }
        }
        out
    }

    /// Path prefix of the text in front of the live index
    pub fn stem(&self) -> Option<&str> {
        self.stem.as_deref()
    }

    /// Data path of the instance at `index`, e.g. `Menus[1].SubMenus[7]`
    pub fn instance_path(&self, index: u64) -> Option<String> {
        self.stem.as_ref().map(|stem| format!("{}[{}]", stem, index))
    }
}

/// Store of templates captured once per container
#[derive(Debug, Default)]
pub struct TemplateStore {
    templates: HashMap<TemplateName, Template>,
    /// Capture order, for stable listing
    order: Vec<TemplateName>,
    depth: usize,
    placeholder: String,
    seed_margin: u64,
}

impl TemplateStore {
    /// Create an empty store for a container `depth` levels deep
    pub fn new(depth: usize, placeholder: impl Into<String>, seed_margin: u64) -> Self {
        Self {
            templates: HashMap::new(),
            order: Vec::new(),
            depth,
            placeholder: placeholder.into(),
            seed_margin,
        }
    }

    /// Capture a prototype under `name`
    ///
    /// Capturing a name twice keeps the first template.
    pub fn capture(
        &mut self,
        name: TemplateName,
        raw_text: &str,
    ) -> Result<&Template, TemplateError> {
        if !self.contains(&name) {
            let template = Template::capture(
                name.clone(),
                raw_text,
                self.depth,
                &self.placeholder,
                self.seed_margin,
            )?;
            for diag in &template.diagnostics {
                warn!(template = display_name(&name), "{}", diag);
            }
            debug!(
                template = display_name(&name),
                seed = template.seed_index,
                has_index = template.has_index(),
                "captured template"
            );
            self.order.push(name.clone());
            self.templates.insert(name.clone(), template);
        } else {
            debug!(template = display_name(&name), "template already captured");
        }

        self.get(&name)
    }

    /// Get a template by name
    pub fn get(&self, name: &TemplateName) -> Result<&Template, TemplateError> {
        self.templates
            .get(name)
            .ok_or_else(|| TemplateError::NotFound { name: name.clone() })
    }

    /// Check if a template exists
    pub fn contains(&self, name: &TemplateName) -> bool {
        self.templates.contains_key(name)
    }

    /// Template names in capture order
    pub fn names(&self) -> impl Iterator<Item = &TemplateName> {
        self.order.iter()
    }

    /// Whether any template was captured under an explicit name
    pub fn is_multi(&self) -> bool {
        self.order.iter().any(|n| n.is_some())
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
