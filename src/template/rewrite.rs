//! Depth-aware placeholder rewriting
//!
//! Given template text and the nesting depth of the container that owns it,
//! find the index token that belongs to that container in every index path
//! and replace it with a placeholder. Tokens belonging to enclosing
//! containers (earlier in the chain) and to nested containers (later in the
//! chain) are left byte-for-byte as they are.

use tracing::{debug, trace, warn};

use crate::error::Diagnostic;
use crate::parser::{self, IndexPath, Segment, Span};

use super::registry::TemplateError;

/// A piece of a rewritten template
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Piece {
    Text(String),
    Placeholder,
}

/// Result of rewriting one template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    pub pieces: Vec<Piece>,
    /// Literal index found at the live position, if any path reached it
    pub seed_index: Option<u64>,
    /// Span of the literal that became the seed
    pub seed_span: Option<Span>,
    /// Path text in front of the live index, e.g. `Menus[1].SubMenus`
    pub stem: Option<String>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Rewrite {
    /// Join the pieces, writing `fill` wherever the placeholder sits
    pub fn join(&self, fill: &str) -> String {
        let mut out = String::new();
        for piece in &self.pieces {
            match piece {
                Piece::Text(text) => out.push_str(text),
                Piece::Placeholder => out.push_str(fill),
            }
        }
        out
    }

    fn verbatim(source: &str, diagnostics: Vec<Diagnostic>) -> Self {
        Self {
            pieces: vec![Piece::Text(source.to_string())],
            seed_index: None,
            seed_span: None,
            stem: None,
            diagnostics,
        }
    }
}

/// The live index token of one path
struct LiveIndex {
    stem: String,
    value: u64,
    /// Span of `[digits]`, brackets included
    span: Span,
}

/// Rewrite `source` for a container nested `depth` levels deep
///
/// In markup, only index paths that make up a whole quoted attribute value
/// (`name="Menus[0].Title"`) are field paths; text content is left alone.
/// Plain text without markup is read as a list of paths.
pub fn rewrite(source: &str, depth: usize) -> Result<Rewrite, TemplateError> {
    let ast = match parser::parse(source) {
        Ok(ast) => ast,
        Err(errors) => {
            let diagnostics: Vec<_> = errors
                .iter()
                .map(|e| match e {
                    crate::ParseError::Syntax { span, message } => {
                        Diagnostic::malformed(span.clone(), message.clone())
                    }
                })
                .collect();
            warn!(
                errors = diagnostics.len(),
                "template text did not parse, treating it as index-free"
            );
            return Ok(Rewrite::verbatim(source, diagnostics));
        }
    };

    let fields = FieldValues::scan(source);
    let mut diagnostics = Vec::new();
    let mut live = Vec::new();
    let mut shallow: Option<Span> = None;

    for segment in &ast.segments {
        let Segment::Path(path) = &segment.node else {
            continue;
        };
        if path.index_count() == 0 {
            continue;
        }
        if !fields.contains(&path.span()) {
            trace!(path = &source[path.span()], "index outside a field value left as text");
            continue;
        }
        if let Some(reason) = stray_bracket(source, path) {
            warn!(path = &source[path.span()], "{}", reason);
            diagnostics.push(Diagnostic::malformed(path.span(), reason));
            continue;
        }
        let Some((digits, span)) = path.index_at(depth) else {
            // Only indices of enclosing containers; keep as-is
            trace!(path = &source[path.span()], depth, "path does not reach container depth");
            shallow.get_or_insert_with(|| path.span());
            continue;
        };
        let Ok(value) = digits.parse::<u64>() else {
            diagnostics.push(Diagnostic::malformed(
                span.clone(),
                format!("index literal {} is out of range", digits),
            ));
            continue;
        };
        live.push(LiveIndex {
            stem: source[path.span().start..span.start].to_string(),
            value,
            span: span.clone(),
        });
    }

    if live.is_empty() {
        if let Some(span) = shallow {
            diagnostics.push(Diagnostic::malformed(
                span,
                format!("no index path reaches nesting depth {}", depth),
            ));
        }
        debug!(depth, "template has no live index, using the no-index policy");
        return Ok(Rewrite::verbatim(source, diagnostics));
    }

    let stem = live[0].stem.clone();
    if let Some(other) = live.iter().find(|l| l.stem != stem) {
        return Err(TemplateError::InconsistentChain {
            expected: stem,
            found: other.stem.clone(),
        });
    }

    let (seed_index, seed_span) = match live.iter().max_by_key(|l| l.value) {
        Some(seed) => (Some(seed.value), Some(seed.span.clone())),
        None => (None, None),
    };

    let mut pieces = Vec::with_capacity(live.len() * 2 + 1);
    let mut cursor = 0;
    for index in &live {
        // Keep both brackets, swap only the digits
        pieces.push(Piece::Text(source[cursor..index.span.start + 1].to_string()));
        pieces.push(Piece::Placeholder);
        cursor = index.span.end - 1;
    }
    pieces.push(Piece::Text(source[cursor..].to_string()));

    debug!(depth, seed = ?seed_index, stem = %stem, paths = live.len(), "rewrote template");

    Ok(Rewrite {
        pieces,
        seed_index,
        seed_span,
        stem: Some(stem),
        diagnostics,
    })
}

/// Where index paths count as form fields
enum FieldValues {
    /// No markup: every path is a field path
    Anywhere,
    /// Spans of quoted attribute values without whitespace
    Attributes(Vec<Span>),
}

impl FieldValues {
    fn scan(source: &str) -> Self {
        if !source.contains('<') {
            return FieldValues::Anywhere;
        }

        let mut values = Vec::new();
        let mut search = 0;
        while let Some(pos) = source[search..].find('=') {
            let at = search + pos;
            search = at + 1;
            let Some(quote @ ('"' | '\'')) = source[at + 1..].chars().next() else {
                continue;
            };
            let start = at + 2;
            let Some(len) = source[start..].find(quote) else {
                break;
            };
            let end = start + len;
            if !source[start..end].contains(char::is_whitespace) {
                values.push(start..end);
            }
            search = end + 1;
        }
        FieldValues::Attributes(values)
    }

    fn contains(&self, span: &Span) -> bool {
        match self {
            FieldValues::Anywhere => true,
            FieldValues::Attributes(values) => values
                .iter()
                .any(|v| v.start <= span.start && span.end <= v.end),
        }
    }
}

/// A path glued to a bracket that is not part of an index token
fn stray_bracket(source: &str, path: &IndexPath) -> Option<String> {
    let span = path.span();
    let before = source[..span.start].chars().next_back();
    let after = source[span.end..].chars().next();
    match (before, after) {
        (_, Some(c @ ('[' | ']'))) => Some(format!("index path followed by stray '{}'", c)),
        (Some(c @ ('[' | ']')), _) => Some(format!("index path preceded by stray '{}'", c)),
        _ => None,
    }
}
