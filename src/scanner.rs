//! Tokenizer for the TypeScript subset the transformer understands.
//!
//! The scanner is total over arbitrary source text: characters outside the
//! recognized set become [`SyntaxKind::Unknown`] tokens instead of errors,
//! because statements outside the declaration/marker-call subset are carried
//! through verbatim by the emitter and only need balanced tokenization.
//! Only unterminated strings and block comments are reported as errors.

use crate::diagnostics::DiagnosticBag;
use crate::span::Span;

/// Token kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SyntaxKind {
    Unknown,
    EndOfFile,
    Identifier,
    StringLiteral,
    NumericLiteral,
    // Keywords
    InterfaceKeyword,
    TypeKeyword,
    ImportKeyword,
    ExportKeyword,
    FromKeyword,
    DeclareKeyword,
    FunctionKeyword,
    ConstKeyword,
    LetKeyword,
    VarKeyword,
    ReadonlyKeyword,
    StringKeyword,
    NumberKeyword,
    BooleanKeyword,
    AnyKeyword,
    NullKeyword,
    ObjectKeyword,
    VoidKeyword,
    NewKeyword,
    AsKeyword,
    // Punctuation
    OpenBrace,
    CloseBrace,
    OpenParen,
    CloseParen,
    OpenBracket,
    CloseBracket,
    LessThan,
    GreaterThan,
    Comma,
    Semicolon,
    Colon,
    Dot,
    Question,
    Bar,
    Ampersand,
    Equals,
    EqualsGreaterThan,
}

/// A single token: kind plus source span. Token text is always recovered
/// from the source via the span, so tokens stay two words wide.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Token {
    pub kind: SyntaxKind,
    pub span: Span,
}

impl Token {
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        self.span.text(source)
    }
}

fn keyword_kind(text: &str) -> Option<SyntaxKind> {
    let kind = match text {
        "interface" => SyntaxKind::InterfaceKeyword,
        "type" => SyntaxKind::TypeKeyword,
        "import" => SyntaxKind::ImportKeyword,
        "export" => SyntaxKind::ExportKeyword,
        "from" => SyntaxKind::FromKeyword,
        "declare" => SyntaxKind::DeclareKeyword,
        "function" => SyntaxKind::FunctionKeyword,
        "const" => SyntaxKind::ConstKeyword,
        "let" => SyntaxKind::LetKeyword,
        "var" => SyntaxKind::VarKeyword,
        "readonly" => SyntaxKind::ReadonlyKeyword,
        "string" => SyntaxKind::StringKeyword,
        "number" => SyntaxKind::NumberKeyword,
        "boolean" => SyntaxKind::BooleanKeyword,
        "any" => SyntaxKind::AnyKeyword,
        "null" => SyntaxKind::NullKeyword,
        "object" => SyntaxKind::ObjectKeyword,
        "void" => SyntaxKind::VoidKeyword,
        "new" => SyntaxKind::NewKeyword,
        "as" => SyntaxKind::AsKeyword,
        _ => return None,
    };
    Some(kind)
}

fn is_identifier_start(ch: char) -> bool {
    ch.is_alphabetic() || ch == '_' || ch == '$'
}

fn is_identifier_part(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_' || ch == '$'
}

/// Tokenizer state machine over a source string.
pub struct ScannerState<'a> {
    source: &'a str,
    file_name: &'a str,
    pos: usize,
}

impl<'a> ScannerState<'a> {
    pub fn new(source: &'a str, file_name: &'a str) -> ScannerState<'a> {
        ScannerState {
            source,
            file_name,
            pos: 0,
        }
    }

    /// Tokenize the whole source. The returned vector always ends with a
    /// zero-width `EndOfFile` token.
    pub fn scan(mut self, bag: &mut DiagnosticBag) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token(bag);
            let done = token.kind == SyntaxKind::EndOfFile;
            tokens.push(token);
            if done {
                break;
            }
        }
        tokens
    }

    fn peek(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        let mut chars = self.source[self.pos..].chars();
        for _ in 0..offset {
            chars.next()?;
        }
        chars.next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn token(&self, kind: SyntaxKind, start: usize) -> Token {
        Token {
            kind,
            span: Span::new(start as u32, self.pos as u32),
        }
    }

    fn next_token(&mut self, bag: &mut DiagnosticBag) -> Token {
        self.skip_trivia(bag);
        let start = self.pos;
        let ch = match self.bump() {
            Some(ch) => ch,
            None => return self.token(SyntaxKind::EndOfFile, start),
        };

        let kind = match ch {
            '{' => SyntaxKind::OpenBrace,
            '}' => SyntaxKind::CloseBrace,
            '(' => SyntaxKind::OpenParen,
            ')' => SyntaxKind::CloseParen,
            '[' => SyntaxKind::OpenBracket,
            ']' => SyntaxKind::CloseBracket,
            '<' => SyntaxKind::LessThan,
            '>' => SyntaxKind::GreaterThan,
            ',' => SyntaxKind::Comma,
            ';' => SyntaxKind::Semicolon,
            ':' => SyntaxKind::Colon,
            '.' => SyntaxKind::Dot,
            '?' => SyntaxKind::Question,
            '|' => SyntaxKind::Bar,
            '&' => SyntaxKind::Ampersand,
            '=' => {
                if self.peek() == Some('>') {
                    self.bump();
                    SyntaxKind::EqualsGreaterThan
                } else {
                    SyntaxKind::Equals
                }
            }
            '\'' | '"' | '`' => return self.scan_string(start, ch, bag),
            '0'..='9' => return self.scan_number(start),
            ch if is_identifier_start(ch) => return self.scan_identifier(start),
            _ => SyntaxKind::Unknown,
        };
        self.token(kind, start)
    }

    fn skip_trivia(&mut self, bag: &mut DiagnosticBag) {
        loop {
            match self.peek() {
                Some(ch) if ch.is_whitespace() => {
                    self.bump();
                }
                Some('/') if self.peek_at(1) == Some('/') => {
                    while let Some(ch) = self.peek() {
                        if ch == '\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                Some('/') if self.peek_at(1) == Some('*') => {
                    let start = self.pos;
                    self.bump();
                    self.bump();
                    let mut closed = false;
                    while let Some(ch) = self.bump() {
                        if ch == '*' && self.peek() == Some('/') {
                            self.bump();
                            closed = true;
                            break;
                        }
                    }
                    if !closed {
                        bag.error(
                            self.file_name,
                            Span::new(start as u32, self.pos as u32),
                            "'*/' expected.",
                            1010,
                        );
                    }
                }
                _ => break,
            }
        }
    }

    fn scan_string(&mut self, start: usize, quote: char, bag: &mut DiagnosticBag) -> Token {
        // Template literals are scanned as one opaque literal; `${` holes are
        // not tokenized, which keeps brace depth tracking honest downstream.
        let mut terminated = false;
        while let Some(ch) = self.bump() {
            if ch == '\\' {
                self.bump();
            } else if ch == quote {
                terminated = true;
                break;
            } else if ch == '\n' && quote != '`' {
                break;
            }
        }
        if !terminated {
            bag.error(
                self.file_name,
                Span::new(start as u32, self.pos as u32),
                "Unterminated string literal.",
                1002,
            );
        }
        self.token(SyntaxKind::StringLiteral, start)
    }

    fn scan_number(&mut self, start: usize) -> Token {
        while let Some(ch) = self.peek() {
            if ch.is_ascii_alphanumeric() || ch == '.' || ch == '_' {
                self.bump();
            } else {
                break;
            }
        }
        self.token(SyntaxKind::NumericLiteral, start)
    }

    fn scan_identifier(&mut self, start: usize) -> Token {
        while let Some(ch) = self.peek() {
            if is_identifier_part(ch) {
                self.bump();
            } else {
                break;
            }
        }
        let text = &self.source[start..self.pos];
        let kind = keyword_kind(text).unwrap_or(SyntaxKind::Identifier);
        self.token(kind, start)
    }
}

/// Strip the quotes off a string-literal token's text.
pub fn unquote(text: &str) -> &str {
    let mut chars = text.chars();
    match (chars.next(), text.chars().last()) {
        (Some(open @ ('\'' | '"' | '`')), Some(close)) if close == open && text.len() >= 2 => {
            &text[1..text.len() - 1]
        }
        _ => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(source: &str) -> (Vec<Token>, DiagnosticBag) {
        let mut bag = DiagnosticBag::new();
        let tokens = ScannerState::new(source, "test.ts").scan(&mut bag);
        (tokens, bag)
    }

    fn kinds(source: &str) -> Vec<SyntaxKind> {
        scan(source).0.iter().map(|t| t.kind).collect()
    }

    #[test]
    fn scans_interface_declaration() {
        assert_eq!(
            kinds("interface Foo { a?: string; }"),
            vec![
                SyntaxKind::InterfaceKeyword,
                SyntaxKind::Identifier,
                SyntaxKind::OpenBrace,
                SyntaxKind::Identifier,
                SyntaxKind::Question,
                SyntaxKind::Colon,
                SyntaxKind::StringKeyword,
                SyntaxKind::Semicolon,
                SyntaxKind::CloseBrace,
                SyntaxKind::EndOfFile,
            ]
        );
    }

    #[test]
    fn scans_marker_call() {
        assert_eq!(
            kinds("typedData<Foo>()"),
            vec![
                SyntaxKind::Identifier,
                SyntaxKind::LessThan,
                SyntaxKind::Identifier,
                SyntaxKind::GreaterThan,
                SyntaxKind::OpenParen,
                SyntaxKind::CloseParen,
                SyntaxKind::EndOfFile,
            ]
        );
    }

    #[test]
    fn arrow_token_is_single() {
        assert_eq!(
            kinds("=>"),
            vec![SyntaxKind::EqualsGreaterThan, SyntaxKind::EndOfFile]
        );
        assert_eq!(
            kinds("= >"),
            vec![
                SyntaxKind::Equals,
                SyntaxKind::GreaterThan,
                SyntaxKind::EndOfFile
            ]
        );
    }

    #[test]
    fn comments_are_trivia() {
        assert_eq!(
            kinds("// line\n/* block */ foo"),
            vec![SyntaxKind::Identifier, SyntaxKind::EndOfFile]
        );
    }

    #[test]
    fn unknown_chars_do_not_error() {
        let (tokens, bag) = scan("a # b");
        assert!(bag.is_empty());
        assert_eq!(tokens[1].kind, SyntaxKind::Unknown);
    }

    #[test]
    fn unterminated_string_reports_error() {
        let (_, bag) = scan("'oops");
        assert!(bag.has_errors());
    }

    #[test]
    fn template_literal_is_one_token() {
        let (tokens, bag) = scan("`a ${x} b`");
        assert!(bag.is_empty());
        assert_eq!(tokens[0].kind, SyntaxKind::StringLiteral);
        assert_eq!(tokens.len(), 2);
    }

    #[test]
    fn unquote_strips_matching_quotes() {
        assert_eq!(unquote("'typed-data'"), "typed-data");
        assert_eq!(unquote("\"x\""), "x");
        assert_eq!(unquote("plain"), "plain");
    }
}
