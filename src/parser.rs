//! Recursive-descent parser for the TypeScript subset.
//!
//! Only the constructs the transformer cares about are parsed structurally:
//! interface declarations, type aliases, named imports, ambient function
//! declarations, and type nodes. Every other statement becomes a
//! [`RawStatement`] covering its source span, with call expressions found
//! inside it collected for the rewriter. Raw statements never produce
//! diagnostics — their text is preserved verbatim by the emitter — while
//! malformed declarations do, and those are fatal at the driver level.

use crate::ast::*;
use crate::diagnostics::DiagnosticBag;
use crate::scanner::{ScannerState, SyntaxKind, Token, unquote};
use crate::span::Span;
use tracing::trace;

/// Output of a parse: the arena plus the root `SourceFile` node.
pub struct ParseResult {
    pub arena: NodeArena,
    pub source_file: NodeIndex,
}

/// Scan and parse `source`, recording problems in `bag`.
pub fn parse_source(source: &str, file_name: &str, bag: &mut DiagnosticBag) -> ParseResult {
    let tokens = ScannerState::new(source, file_name).scan(bag);
    let mut parser = ParserState {
        source,
        file_name,
        tokens,
        pos: 0,
        arena: NodeArena::new(),
        bag,
    };
    let source_file = parser.parse_source_file();
    ParseResult {
        arena: parser.arena,
        source_file,
    }
}

struct ParserState<'a> {
    source: &'a str,
    file_name: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    arena: NodeArena,
    bag: &'a mut DiagnosticBag,
}

impl<'a> ParserState<'a> {
    fn token(&self) -> Token {
        self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn kind(&self) -> SyntaxKind {
        self.token().kind
    }

    fn nth_kind(&self, n: usize) -> SyntaxKind {
        self.tokens
            .get(self.pos + n)
            .map(|t| t.kind)
            .unwrap_or(SyntaxKind::EndOfFile)
    }

    fn token_text(&self) -> &'a str {
        self.token().text(self.source)
    }

    fn advance(&mut self) {
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
    }

    fn eat(&mut self, kind: SyntaxKind) -> bool {
        if self.kind() == kind {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: SyntaxKind, what: &str, code: u32) -> bool {
        if self.eat(kind) {
            true
        } else {
            let span = self.token().span;
            self.bag
                .error(self.file_name, span, format!("'{what}' expected."), code);
            false
        }
    }

    /// End offset of the last consumed token.
    fn prev_end(&self) -> u32 {
        if self.pos == 0 {
            0
        } else {
            self.tokens[self.pos - 1].span.end
        }
    }

    fn span_from(&self, start: u32) -> Span {
        Span::new(start, self.prev_end().max(start))
    }

    fn at_eof(&self) -> bool {
        self.kind() == SyntaxKind::EndOfFile
    }

    fn make_identifier(&mut self) -> NodeIndex {
        let token = self.token();
        let ident = Identifier {
            text: token.text(self.source).to_string(),
            span: token.span,
        };
        self.advance();
        self.arena.add(Node::Identifier(ident))
    }

    // ---- statements ----

    fn parse_source_file(&mut self) -> NodeIndex {
        let mut statements = Vec::new();
        while !self.at_eof() {
            let before = self.pos;
            let stmt = self.parse_statement();
            if stmt.is_some() {
                statements.push(stmt);
            }
            if self.pos == before {
                // Defensive: a statement must consume at least one token.
                self.advance();
            }
        }
        let span = Span::new(0, self.source.len() as u32);
        self.arena
            .add(Node::SourceFile(SourceFileNode { statements, span }))
    }

    fn parse_statement(&mut self) -> NodeIndex {
        let start_pos = self.pos;
        let start = self.token().span.start;

        let mut modifiers = ModifierFlags::empty();
        loop {
            match self.kind() {
                SyntaxKind::ExportKeyword => {
                    modifiers |= ModifierFlags::EXPORT;
                    self.advance();
                }
                SyntaxKind::DeclareKeyword => {
                    modifiers |= ModifierFlags::DECLARE;
                    self.advance();
                }
                _ => break,
            }
        }

        match self.kind() {
            SyntaxKind::InterfaceKeyword => self.parse_interface(modifiers, start),
            SyntaxKind::TypeKeyword
                if self.nth_kind(1) == SyntaxKind::Identifier
                    && self.nth_kind(2) == SyntaxKind::Equals =>
            {
                self.parse_type_alias(modifiers, start)
            }
            SyntaxKind::ImportKeyword if self.nth_kind(1) == SyntaxKind::OpenBrace => {
                self.parse_import(start)
            }
            SyntaxKind::FunctionKeyword if modifiers.contains(ModifierFlags::DECLARE) => {
                self.parse_ambient_function(modifiers, start)
            }
            _ => {
                self.pos = start_pos;
                self.parse_loose_statement()
            }
        }
    }

    fn parse_interface(&mut self, modifiers: ModifierFlags, start: u32) -> NodeIndex {
        self.advance(); // interface
        let name = if self.kind() == SyntaxKind::Identifier {
            self.make_identifier()
        } else {
            self.expect(SyntaxKind::Identifier, "identifier", 1003);
            NodeIndex::NONE
        };
        // Heritage clauses are consumed but not modeled; members of a base
        // type are not merged into the walk.
        if self.kind() == SyntaxKind::Identifier && self.token_text() == "extends" {
            while !self.at_eof() && self.kind() != SyntaxKind::OpenBrace {
                self.advance();
            }
        }
        self.expect(SyntaxKind::OpenBrace, "{", 1005);
        let members = self.parse_object_type_members();
        self.expect(SyntaxKind::CloseBrace, "}", 1005);
        trace!(members = members.len(), "parsed interface");
        self.arena
            .add(Node::InterfaceDeclaration(InterfaceDeclaration {
                name,
                members,
                modifiers,
                span: self.span_from(start),
            }))
    }

    fn parse_type_alias(&mut self, modifiers: ModifierFlags, start: u32) -> NodeIndex {
        self.advance(); // type
        let name = self.make_identifier();
        self.expect(SyntaxKind::Equals, "=", 1005);
        let type_node = self.parse_type();
        self.eat(SyntaxKind::Semicolon);
        self.arena
            .add(Node::TypeAliasDeclaration(TypeAliasDeclaration {
                name,
                type_node,
                modifiers,
                span: self.span_from(start),
            }))
    }

    fn parse_import(&mut self, start: u32) -> NodeIndex {
        self.advance(); // import
        self.advance(); // {
        let mut specifiers = Vec::new();
        while self.kind() != SyntaxKind::CloseBrace && !self.at_eof() {
            if is_identifier_like(self.kind()) {
                let spec_start = self.token().span.start;
                let imported = self.token_text().to_string();
                self.advance();
                let local = if self.eat(SyntaxKind::AsKeyword) {
                    let local = self.token_text().to_string();
                    self.advance();
                    local
                } else {
                    imported.clone()
                };
                let span = self.span_from(spec_start);
                specifiers.push(self.arena.add(Node::ImportSpecifier(ImportSpecifier {
                    imported,
                    local,
                    span,
                })));
                if !self.eat(SyntaxKind::Comma) {
                    break;
                }
            } else {
                self.advance();
            }
        }
        self.expect(SyntaxKind::CloseBrace, "}", 1005);
        self.expect(SyntaxKind::FromKeyword, "from", 1005);
        let module = if self.kind() == SyntaxKind::StringLiteral {
            let module = unquote(self.token_text()).to_string();
            self.advance();
            module
        } else {
            self.expect(SyntaxKind::StringLiteral, "string literal", 1141);
            String::new()
        };
        self.eat(SyntaxKind::Semicolon);
        self.arena.add(Node::ImportDeclaration(ImportDeclaration {
            specifiers,
            module,
            span: self.span_from(start),
        }))
    }

    fn parse_ambient_function(&mut self, modifiers: ModifierFlags, start: u32) -> NodeIndex {
        self.advance(); // function
        let name = if self.kind() == SyntaxKind::Identifier {
            self.make_identifier()
        } else {
            self.expect(SyntaxKind::Identifier, "identifier", 1003);
            NodeIndex::NONE
        };
        if self.kind() == SyntaxKind::LessThan {
            self.skip_balanced(SyntaxKind::LessThan, SyntaxKind::GreaterThan);
        }
        if self.kind() == SyntaxKind::OpenParen {
            self.skip_balanced(SyntaxKind::OpenParen, SyntaxKind::CloseParen);
        } else {
            self.expect(SyntaxKind::OpenParen, "(", 1005);
        }
        if self.eat(SyntaxKind::Colon) {
            let _return_type = self.parse_type();
        }
        self.eat(SyntaxKind::Semicolon);
        self.arena
            .add(Node::FunctionDeclaration(FunctionDeclaration {
                name,
                modifiers,
                span: self.span_from(start),
            }))
    }

    /// Consume a balanced `open ... close` token group, assuming the current
    /// token is `open`. Tolerates EOF.
    fn skip_balanced(&mut self, open: SyntaxKind, close: SyntaxKind) {
        let mut depth = 0usize;
        while !self.at_eof() {
            let kind = self.kind();
            self.advance();
            if kind == open {
                depth += 1;
            } else if kind == close {
                depth -= 1;
                if depth == 0 {
                    break;
                }
            }
        }
    }

    // ---- object type members ----

    fn parse_object_type_members(&mut self) -> Vec<NodeIndex> {
        let mut members = Vec::new();
        while self.kind() != SyntaxKind::CloseBrace && !self.at_eof() {
            let before = self.pos;
            if let Some(member) = self.parse_type_member() {
                members.push(member);
            }
            if self.pos == before {
                self.advance();
            }
        }
        members
    }

    fn parse_type_member(&mut self) -> Option<NodeIndex> {
        let start = self.token().span.start;
        // A leading identifier-like token followed by another name token is
        // a member modifier. Only `readonly` is modeled; anything else
        // (`public`, `static`, ...) is consumed and tagged unknown.
        let mut modifiers = ModifierFlags::empty();
        while is_identifier_like(self.kind())
            && (is_identifier_like(self.nth_kind(1)) || self.nth_kind(1) == SyntaxKind::StringLiteral)
        {
            if self.kind() == SyntaxKind::ReadonlyKeyword {
                modifiers |= ModifierFlags::READONLY;
            } else {
                modifiers |= ModifierFlags::UNKNOWN;
            }
            self.advance();
        }
        if !is_identifier_like(self.kind()) && self.kind() != SyntaxKind::StringLiteral {
            self.expect(SyntaxKind::Identifier, "identifier", 1003);
            return None;
        }
        let name_token = self.token();
        let name_text = if name_token.kind == SyntaxKind::StringLiteral {
            unquote(name_token.text(self.source)).to_string()
        } else {
            name_token.text(self.source).to_string()
        };
        self.advance();
        let name = self.arena.add(Node::Identifier(Identifier {
            text: name_text,
            span: name_token.span,
        }));
        let optional = self.eat(SyntaxKind::Question);

        if self.kind() == SyntaxKind::OpenParen {
            // Method signature: parameters are skipped, the return type is
            // kept only so the span is complete.
            self.skip_balanced(SyntaxKind::OpenParen, SyntaxKind::CloseParen);
            let return_type = if self.eat(SyntaxKind::Colon) {
                self.parse_type()
            } else {
                NodeIndex::NONE
            };
            self.eat_member_separator();
            return Some(self.arena.add(Node::MethodSignature(MethodSignature {
                name,
                return_type,
                optional,
                span: self.span_from(start),
            })));
        }

        let type_node = if self.eat(SyntaxKind::Colon) {
            self.parse_type()
        } else {
            self.expect(SyntaxKind::Colon, ":", 1005);
            NodeIndex::NONE
        };
        self.eat_member_separator();
        Some(self.arena.add(Node::PropertySignature(PropertySignature {
            name,
            type_node,
            optional,
            modifiers,
            span: self.span_from(start),
        })))
    }

    fn eat_member_separator(&mut self) {
        if !self.eat(SyntaxKind::Semicolon) {
            self.eat(SyntaxKind::Comma);
        }
    }

    // ---- types ----

    fn parse_type(&mut self) -> NodeIndex {
        let start = self.token().span.start;
        let first = self.parse_intersection_type();
        if self.kind() != SyntaxKind::Bar {
            return first;
        }
        let mut types = vec![first];
        while self.eat(SyntaxKind::Bar) {
            types.push(self.parse_intersection_type());
        }
        self.arena.add(Node::UnionType(UnionType {
            types,
            span: self.span_from(start),
        }))
    }

    fn parse_intersection_type(&mut self) -> NodeIndex {
        let start = self.token().span.start;
        let first = self.parse_postfix_type();
        if self.kind() != SyntaxKind::Ampersand {
            return first;
        }
        let mut types = vec![first];
        while self.eat(SyntaxKind::Ampersand) {
            types.push(self.parse_postfix_type());
        }
        self.arena.add(Node::IntersectionType(IntersectionType {
            types,
            span: self.span_from(start),
        }))
    }

    fn parse_postfix_type(&mut self) -> NodeIndex {
        let start = self.token().span.start;
        let mut ty = self.parse_primary_type();
        while self.kind() == SyntaxKind::OpenBracket && self.nth_kind(1) == SyntaxKind::CloseBracket
        {
            self.advance();
            self.advance();
            ty = self.arena.add(Node::ArrayType(ArrayType {
                element_type: ty,
                span: self.span_from(start),
            }));
        }
        ty
    }

    fn parse_primary_type(&mut self) -> NodeIndex {
        let start = self.token().span.start;
        let keyword = match self.kind() {
            SyntaxKind::StringKeyword => Some(KeywordTypeKind::String),
            SyntaxKind::NumberKeyword => Some(KeywordTypeKind::Number),
            SyntaxKind::BooleanKeyword => Some(KeywordTypeKind::Boolean),
            SyntaxKind::AnyKeyword => Some(KeywordTypeKind::Any),
            SyntaxKind::NullKeyword => Some(KeywordTypeKind::Null),
            SyntaxKind::ObjectKeyword => Some(KeywordTypeKind::Object),
            SyntaxKind::VoidKeyword => Some(KeywordTypeKind::Void),
            _ => None,
        };
        if let Some(keyword) = keyword {
            self.advance();
            return self.arena.add(Node::KeywordType(KeywordType {
                keyword,
                span: self.span_from(start),
            }));
        }

        match self.kind() {
            SyntaxKind::OpenBrace => {
                self.advance();
                let members = self.parse_object_type_members();
                self.expect(SyntaxKind::CloseBrace, "}", 1005);
                self.arena.add(Node::TypeLiteral(TypeLiteral {
                    members,
                    span: self.span_from(start),
                }))
            }
            SyntaxKind::OpenParen => {
                if self.paren_group_is_function_type() {
                    self.skip_balanced(SyntaxKind::OpenParen, SyntaxKind::CloseParen);
                    self.expect(SyntaxKind::EqualsGreaterThan, "=>", 1005);
                    let _return_type = self.parse_type();
                    self.arena.add(Node::FunctionType(FunctionType {
                        span: self.span_from(start),
                    }))
                } else {
                    self.advance();
                    let type_node = self.parse_type();
                    self.expect(SyntaxKind::CloseParen, ")", 1005);
                    self.arena.add(Node::ParenthesizedType(ParenthesizedType {
                        type_node,
                        span: self.span_from(start),
                    }))
                }
            }
            SyntaxKind::Identifier => {
                let type_name = self.make_identifier();
                let type_arguments = if self.eat(SyntaxKind::LessThan) {
                    let mut args = vec![self.parse_type()];
                    while self.eat(SyntaxKind::Comma) {
                        args.push(self.parse_type());
                    }
                    self.expect(SyntaxKind::GreaterThan, ">", 1005);
                    Some(args)
                } else {
                    None
                };
                self.arena.add(Node::TypeReference(TypeReference {
                    type_name,
                    type_arguments,
                    span: self.span_from(start),
                }))
            }
            _ => {
                let span = self.token().span;
                self.bag
                    .error(self.file_name, span, "Type expected.", 1110);
                self.advance();
                self.arena.add(Node::UnknownType(UnknownType { span }))
            }
        }
    }

    /// Lookahead: does the paren group at the current token close with `=>`?
    fn paren_group_is_function_type(&self) -> bool {
        let mut depth = 0usize;
        let mut i = self.pos;
        while let Some(token) = self.tokens.get(i) {
            match token.kind {
                SyntaxKind::OpenParen => depth += 1,
                SyntaxKind::CloseParen => {
                    depth -= 1;
                    if depth == 0 {
                        return self
                            .tokens
                            .get(i + 1)
                            .map(|t| t.kind == SyntaxKind::EqualsGreaterThan)
                            .unwrap_or(false);
                    }
                }
                SyntaxKind::EndOfFile => return false,
                _ => {}
            }
            i += 1;
        }
        false
    }

    // ---- loose statements ----

    /// Consume one statement outside the declaration subset, collecting any
    /// call expressions found inside it. Never emits diagnostics.
    fn parse_loose_statement(&mut self) -> NodeIndex {
        let start = self.token().span.start;
        let mut calls = Vec::new();
        let mut depth = 0usize;
        let mut consumed = 0usize;

        while !self.at_eof() {
            let kind = self.kind();
            match kind {
                SyntaxKind::Semicolon if depth == 0 => {
                    self.advance();
                    break;
                }
                SyntaxKind::CloseBrace | SyntaxKind::CloseParen | SyntaxKind::CloseBracket
                    if depth == 0 =>
                {
                    // Stray closer at top level: consume it so we make
                    // progress, then end the statement.
                    if consumed == 0 {
                        self.advance();
                    }
                    break;
                }
                _ if depth == 0 && consumed > 0 && starts_statement(self) => break,
                SyntaxKind::OpenBrace | SyntaxKind::OpenParen | SyntaxKind::OpenBracket => {
                    depth += 1;
                    self.advance();
                }
                SyntaxKind::CloseBrace | SyntaxKind::CloseParen | SyntaxKind::CloseBracket => {
                    depth = depth.saturating_sub(1);
                    self.advance();
                }
                SyntaxKind::Identifier => {
                    if let Some(call) = self.try_parse_call_expression(&mut calls) {
                        calls.push(call);
                    } else {
                        self.advance();
                    }
                }
                _ => {
                    self.advance();
                }
            }
            consumed += 1;
        }

        let span = self.span_from(start);
        trace!(calls = calls.len(), ?span, "parsed loose statement");
        self.arena
            .add(Node::RawStatement(RawStatement { calls, span }))
    }

    /// Try to parse `ident(...)` or `ident<T, ...>(...)` at the current
    /// position. Nested calls inside the argument list are appended to
    /// `calls`. Restores the position and returns `None` when the token
    /// shape does not match.
    fn try_parse_call_expression(&mut self, calls: &mut Vec<NodeIndex>) -> Option<NodeIndex> {
        debug_assert_eq!(self.kind(), SyntaxKind::Identifier);
        let start = self.token().span.start;
        let saved = self.pos;

        let has_type_args = match self.nth_kind(1) {
            SyntaxKind::OpenParen => false,
            SyntaxKind::LessThan if self.type_argument_list_precedes_call() => true,
            _ => return None,
        };

        let name = self.make_identifier();
        let type_arguments = if has_type_args {
            self.advance(); // <
            let mut args = vec![self.parse_type()];
            while self.eat(SyntaxKind::Comma) {
                args.push(self.parse_type());
            }
            if !self.eat(SyntaxKind::GreaterThan) {
                // The lookahead guaranteed a closing '>'; not reaching it
                // means the type parse consumed differently. Back out.
                self.pos = saved;
                return None;
            }
            Some(args)
        } else {
            None
        };

        // Argument list: scan loosely, picking up nested calls.
        debug_assert_eq!(self.kind(), SyntaxKind::OpenParen);
        self.advance();
        let mut depth = 1usize;
        while !self.at_eof() && depth > 0 {
            match self.kind() {
                SyntaxKind::OpenParen | SyntaxKind::OpenBrace | SyntaxKind::OpenBracket => {
                    depth += 1;
                    self.advance();
                }
                SyntaxKind::CloseParen | SyntaxKind::CloseBrace | SyntaxKind::CloseBracket => {
                    depth -= 1;
                    self.advance();
                }
                SyntaxKind::Identifier => {
                    if let Some(call) = self.try_parse_call_expression(calls) {
                        calls.push(call);
                    } else {
                        self.advance();
                    }
                }
                _ => {
                    self.advance();
                }
            }
        }

        Some(self.arena.add(Node::CallExpression(CallExpression {
            name,
            type_arguments,
            span: self.span_from(start),
        })))
    }

    /// Token-level lookahead from an identifier at `pos`: does
    /// `< ... >` close with an immediately following `(`? Only tokens that
    /// can appear in a type are allowed inside, mirroring how tsc commits to
    /// a type-argument-list interpretation when a call paren follows.
    fn type_argument_list_precedes_call(&self) -> bool {
        let mut i = self.pos + 1; // at '<'
        let mut depth = 0usize;
        while let Some(token) = self.tokens.get(i) {
            match token.kind {
                SyntaxKind::LessThan => depth += 1,
                SyntaxKind::GreaterThan => {
                    depth -= 1;
                    if depth == 0 {
                        return self
                            .tokens
                            .get(i + 1)
                            .map(|t| t.kind == SyntaxKind::OpenParen)
                            .unwrap_or(false);
                    }
                }
                SyntaxKind::Identifier
                | SyntaxKind::Comma
                | SyntaxKind::OpenBracket
                | SyntaxKind::CloseBracket
                | SyntaxKind::OpenBrace
                | SyntaxKind::CloseBrace
                | SyntaxKind::OpenParen
                | SyntaxKind::CloseParen
                | SyntaxKind::Colon
                | SyntaxKind::Semicolon
                | SyntaxKind::Question
                | SyntaxKind::Bar
                | SyntaxKind::Ampersand
                | SyntaxKind::Dot
                | SyntaxKind::EqualsGreaterThan
                | SyntaxKind::ReadonlyKeyword
                | SyntaxKind::StringKeyword
                | SyntaxKind::NumberKeyword
                | SyntaxKind::BooleanKeyword
                | SyntaxKind::AnyKeyword
                | SyntaxKind::NullKeyword
                | SyntaxKind::ObjectKeyword
                | SyntaxKind::VoidKeyword => {}
                _ => return false,
            }
            i += 1;
        }
        false
    }
}

fn is_identifier_like(kind: SyntaxKind) -> bool {
    matches!(
        kind,
        SyntaxKind::Identifier
            | SyntaxKind::TypeKeyword
            | SyntaxKind::FromKeyword
            | SyntaxKind::AsKeyword
            | SyntaxKind::ReadonlyKeyword
            | SyntaxKind::StringKeyword
            | SyntaxKind::NumberKeyword
            | SyntaxKind::BooleanKeyword
            | SyntaxKind::AnyKeyword
            | SyntaxKind::ObjectKeyword
            | SyntaxKind::DeclareKeyword
    )
}

/// Does the current position look like the start of a recognized top-level
/// declaration? Used to terminate loose statements without semicolons.
fn starts_statement(p: &ParserState<'_>) -> bool {
    match p.kind() {
        SyntaxKind::InterfaceKeyword
        | SyntaxKind::ImportKeyword
        | SyntaxKind::ExportKeyword
        | SyntaxKind::DeclareKeyword => true,
        SyntaxKind::TypeKeyword => {
            p.nth_kind(1) == SyntaxKind::Identifier && p.nth_kind(2) == SyntaxKind::Equals
        }
        _ => false,
    }
}
