//! Error and diagnostic types for template parsing

use ariadne::{Color, Label, Report, ReportKind, Source};
use thiserror::Error;

use crate::parser::Span;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Parse error at {span:?}: {message}")]
    Syntax { span: Span, message: String },
}

impl ParseError {
    /// Format the error with source context using ariadne
    pub fn format(&self, source: &str, filename: &str) -> String {
        match self {
            ParseError::Syntax { span, message } => render_report(
                ReportKind::Error,
                Color::Red,
                source,
                filename,
                span,
                message,
            ),
        }
    }
}

impl<'a> From<chumsky::error::Rich<'a, crate::parser::lexer::Token>> for ParseError {
    fn from(err: chumsky::error::Rich<'a, crate::parser::lexer::Token>) -> Self {
        let message = match err.found() {
            Some(tok) => format!("Unexpected {:?}", tok),
            None => "Unexpected end of input".to_string(),
        };

        ParseError::Syntax {
            span: err.span().into_range(),
            message,
        }
    }
}

/// Non-fatal findings recorded while capturing a template
///
/// Templates are static markup, so these never abort a capture; the template
/// degrades to the no-index policy instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    #[error("malformed index pattern at {span:?}: {reason}")]
    MalformedIndexPattern { span: Span, reason: String },
}

impl Diagnostic {
    pub fn malformed(span: Span, reason: impl Into<String>) -> Self {
        Self::MalformedIndexPattern {
            span,
            reason: reason.into(),
        }
    }

    pub fn span(&self) -> &Span {
        match self {
            Diagnostic::MalformedIndexPattern { span, .. } => span,
        }
    }

    /// Format the diagnostic with source context using ariadne
    pub fn format(&self, source: &str, filename: &str) -> String {
        match self {
            Diagnostic::MalformedIndexPattern { span, reason } => render_report(
                ReportKind::Warning,
                Color::Yellow,
                source,
                filename,
                span,
                &format!("malformed index pattern: {}", reason),
            ),
        }
    }
}

fn render_report(
    kind: ReportKind<'_>,
    color: Color,
    source: &str,
    filename: &str,
    span: &Span,
    message: &str,
) -> String {
    let mut buf = Vec::new();
    let written = Report::build(kind, filename, span.start)
        .with_message(message)
        .with_label(
            Label::new((filename, span.clone()))
                .with_message(message)
                .with_color(color),
        )
        .finish()
        .write((filename, Source::from(source)), &mut buf);

    match written {
        Ok(()) => String::from_utf8_lossy(&buf).into_owned(),
        // Fall back to the plain message if the report cannot be written
        Err(_) => format!("{}: {}", filename, message),
    }
}
