//! Lexer for template text using logos
//!
//! Every byte of the input belongs to exactly one token, so the original text
//! can always be rebuilt from token spans.

use logos::Logos;

use super::ast::Span;

#[derive(Logos, Debug, Clone, PartialEq)]
pub enum Token {
    /// Bracketed positional index like `[12]`, digits kept verbatim
    #[regex(r"\[[0-9]+\]", |lex| {
        let s = lex.slice();
        s[1..s.len() - 1].to_string()
    })]
    Index(String),

    // Stray brackets that do not enclose a plain number
    #[token("[")]
    BracketOpen,
    #[token("]")]
    BracketClose,

    /// Path characters: anything that is not whitespace, a quote, markup punctuation or a bracket
    #[regex(r#"[^\s"'<>=\[\]]+"#)]
    Word,

    /// Characters that end an index path
    #[regex(r#"[\s"'<>=]+"#)]
    Delimiter,
}

/// Lex template text into a token stream with spans
pub fn lex(input: &str) -> impl Iterator<Item = (Token, Span)> + '_ {
    Token::lexer(input)
        .spanned()
        .filter_map(|(tok, span)| tok.ok().map(|t| (t, span)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chained_path() {
        let tokens: Vec<_> = lex("Menus[1].SubMenus[2].URL").map(|(t, _)| t).collect();
        assert_eq!(
            tokens,
            vec![
                Token::Word,
                Token::Index("1".to_string()),
                Token::Word,
                Token::Index("2".to_string()),
                Token::Word,
            ]
        );
    }

    #[test]
    fn test_attribute_delimiters() {
        let tokens: Vec<_> = lex(r#"<input name="A[0]">"#).map(|(t, _)| t).collect();
        assert_eq!(
            tokens,
            vec![
                Token::Delimiter,
                Token::Word,
                Token::Delimiter,
                Token::Word,
                Token::Delimiter,
                Token::Word,
                Token::Index("0".to_string()),
                Token::Delimiter,
            ]
        );
    }

    #[test]
    fn test_non_numeric_brackets() {
        let tokens: Vec<_> = lex("Items[x]").map(|(t, _)| t).collect();
        assert_eq!(
            tokens,
            vec![
                Token::Word,
                Token::BracketOpen,
                Token::Word,
                Token::BracketClose,
            ]
        );
    }

    #[test]
    fn test_empty_brackets() {
        let tokens: Vec<_> = lex("Items[]").map(|(t, _)| t).collect();
        assert_eq!(
            tokens,
            vec![Token::Word, Token::BracketOpen, Token::BracketClose]
        );
    }

    #[test]
    fn test_spans_cover_input() {
        let input = "<p a=\"X[3]\" b='y'>text [ ] Z[04]</p>";
        let mut cursor = 0;
        for (_, span) in lex(input) {
            assert_eq!(span.start, cursor);
            cursor = span.end;
        }
        assert_eq!(cursor, input.len());
    }

    #[test]
    fn test_leading_zeros_kept() {
        let tokens: Vec<_> = lex("A[007]").map(|(t, _)| t).collect();
        assert_eq!(tokens[1], Token::Index("007".to_string()));
    }
}
