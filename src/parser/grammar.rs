//! Parser implementation using chumsky

use chumsky::input::{Stream, ValueInput};
use chumsky::prelude::*;

use crate::parser::ast::*;
use crate::parser::lexer::Token;

/// Parse template text into segments
pub fn parse(input: &str) -> Result<TemplateAst, Vec<crate::ParseError>> {
    let len = input.len();

    // Create a logos lexer and convert to token stream
    let token_iter = crate::parser::lexer::lex(input).map(|(tok, span)| (tok, span.into()));

    // Turn the token iterator into a stream that chumsky can use
    let token_stream = Stream::from_iter(token_iter)
        // Split (Token, SimpleSpan) into token and span parts
        .map((len..len).into(), |(t, s): (_, _)| (t, s));

    template_parser()
        .parse(token_stream)
        .into_result()
        .map_err(|errs| errs.into_iter().map(|e| e.into()).collect())
}

/// Helper to extract span range from chumsky's MapExtra
fn span_range(e: &impl chumsky::span::Span<Offset = usize>) -> std::ops::Range<usize> {
    e.start()..e.end()
}

fn template_parser<'a, I>() -> impl Parser<'a, I, TemplateAst, extra::Err<Rich<'a, Token>>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = SimpleSpan>,
{
    let path_part = select! {
        Token::Word => PathPart::Literal,
        Token::Index(digits) => PathPart::Index(digits),
    }
    .map_with(|part, e| Spanned::new(part, span_range(&e.span())));

    // Adjacent words and indices form one path; delimiters are tokens too,
    // so adjacency in the stream is adjacency in the text
    let path = path_part
        .repeated()
        .at_least(1)
        .collect::<Vec<_>>()
        .map_with(|parts, e| {
            Spanned::new(Segment::Path(IndexPath { parts }), span_range(&e.span()))
        });

    let text = select! {
        Token::Delimiter => (),
        Token::BracketOpen => (),
        Token::BracketClose => (),
    }
    .repeated()
    .at_least(1)
    .map_with(|_, e| Spanned::new(Segment::Text, span_range(&e.span())));

    choice((path, text))
        .repeated()
        .collect::<Vec<_>>()
        .map(|segments| TemplateAst { segments })
}
