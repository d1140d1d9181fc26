//! Syntax tree for template text
//!
//! A template is a flat sequence of segments. Plain text segments are copied
//! through untouched; path segments are runs of words and bracketed indices
//! such as `Menus[1].SubMenus[2].URL`.

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

/// AST node with source location
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(node: T, span: Span) -> Self {
        Self { node, span }
    }
}

/// One piece of an index path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathPart {
    /// Literal path text between indices (`Menus`, `.SubMenus`, `.URL`)
    Literal,
    /// Digits of a bracketed index, without the brackets
    Index(String),
}

/// A chained index path: `prefix[INDEX]suffix`, repeated
#[derive(Debug, Clone, PartialEq)]
pub struct IndexPath {
    pub parts: Vec<Spanned<PathPart>>,
}

impl IndexPath {
    /// Index tokens in chain order, outermost container first
    pub fn indices(&self) -> impl Iterator<Item = (&str, &Span)> {
        self.parts.iter().filter_map(|p| match &p.node {
            PathPart::Index(digits) => Some((digits.as_str(), &p.span)),
            PathPart::Literal => None,
        })
    }

    /// Number of index tokens in the chain
    pub fn index_count(&self) -> usize {
        self.indices().count()
    }

    /// The index token at chain position `level`
    pub fn index_at(&self, level: usize) -> Option<(&str, &Span)> {
        self.indices().nth(level)
    }

    /// Span of the whole path
    pub fn span(&self) -> Span {
        match (self.parts.first(), self.parts.last()) {
            (Some(first), Some(last)) => first.span.start..last.span.end,
            _ => 0..0,
        }
    }
}

/// Top-level template segment
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// Delimiters and stray brackets, copied verbatim
    Text,
    /// A run of path words and indices
    Path(IndexPath),
}

/// A parsed template
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TemplateAst {
    pub segments: Vec<Spanned<Segment>>,
}

impl TemplateAst {
    /// Paths that carry at least one index token
    pub fn index_paths(&self) -> impl Iterator<Item = &IndexPath> {
        self.segments.iter().filter_map(|s| match &s.node {
            Segment::Path(path) if path.index_count() > 0 => Some(path),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn part(node: PathPart, span: Span) -> Spanned<PathPart> {
        Spanned::new(node, span)
    }

    #[test]
    fn test_index_at_levels() {
        // A[1].B[2]
        let path = IndexPath {
            parts: vec![
                part(PathPart::Literal, 0..1),
                part(PathPart::Index("1".to_string()), 1..4),
                part(PathPart::Literal, 4..6),
                part(PathPart::Index("2".to_string()), 6..9),
            ],
        };
        assert_eq!(path.index_count(), 2);
        assert_eq!(path.index_at(0), Some(("1", &(1..4))));
        assert_eq!(path.index_at(1), Some(("2", &(6..9))));
        assert_eq!(path.index_at(2), None);
        assert_eq!(path.span(), 0..9);
    }
}
