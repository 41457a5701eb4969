//! Arena-stored AST for the TypeScript subset.
//!
//! Nodes live contiguously in a [`NodeArena`] and reference each other by
//! [`NodeIndex`]. The tree is read-only after parsing: the rewriter never
//! mutates nodes, it records span replacements that the emitter splices into
//! the original text.

use crate::span::Span;
use bitflags::bitflags;

/// Index of a node in the arena. `NodeIndex::NONE` marks an absent child.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeIndex(pub u32);

impl NodeIndex {
    pub const NONE: NodeIndex = NodeIndex(u32::MAX);

    pub fn is_none(&self) -> bool {
        *self == NodeIndex::NONE
    }

    pub fn is_some(&self) -> bool {
        !self.is_none()
    }
}

bitflags! {
    /// Structural modifiers observed on a declaration.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct ModifierFlags: u8 {
        const READONLY = 1 << 0;
        const EXPORT = 1 << 1;
        const DECLARE = 1 << 2;
        /// A modifier the parser consumed but does not model.
        const UNKNOWN = 1 << 3;
    }
}

#[derive(Clone, Debug)]
pub struct Identifier {
    pub text: String,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub struct SourceFileNode {
    pub statements: Vec<NodeIndex>,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub struct InterfaceDeclaration {
    pub name: NodeIndex,
    pub members: Vec<NodeIndex>,
    pub modifiers: ModifierFlags,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub struct TypeAliasDeclaration {
    pub name: NodeIndex,
    pub type_node: NodeIndex,
    pub modifiers: ModifierFlags,
    pub span: Span,
}

/// `readonly? name ?? : Type ;`
#[derive(Clone, Debug)]
pub struct PropertySignature {
    pub name: NodeIndex,
    pub type_node: NodeIndex,
    pub optional: bool,
    pub modifiers: ModifierFlags,
    pub span: Span,
}

/// `name(params): Type;` — parameters are consumed, only the return type is
/// kept (the walker classifies methods as `"Function"` without descending).
#[derive(Clone, Debug)]
pub struct MethodSignature {
    pub name: NodeIndex,
    pub return_type: NodeIndex,
    pub optional: bool,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub struct ImportDeclaration {
    pub specifiers: Vec<NodeIndex>,
    /// Unquoted module specifier text.
    pub module: String,
    pub span: Span,
}

/// One `{ imported as local }` entry of a named import.
#[derive(Clone, Debug)]
pub struct ImportSpecifier {
    pub imported: String,
    pub local: String,
    pub span: Span,
}

/// Ambient `declare function name(...)` declaration. Body-less; only the
/// name matters for sentinel resolution.
#[derive(Clone, Debug)]
pub struct FunctionDeclaration {
    pub name: NodeIndex,
    pub modifiers: ModifierFlags,
    pub span: Span,
}

/// A statement outside the declaration subset, preserved verbatim by span.
/// Call expressions recognized inside it are collected for the rewriter.
#[derive(Clone, Debug)]
pub struct RawStatement {
    pub calls: Vec<NodeIndex>,
    pub span: Span,
}

/// `callee<TypeArgs>(...)` where the callee is a bare identifier.
/// `type_arguments` is `None` when no type-argument list was written,
/// `Some(vec)` otherwise — the rewriter distinguishes the two.
#[derive(Clone, Debug)]
pub struct CallExpression {
    pub name: NodeIndex,
    pub type_arguments: Option<Vec<NodeIndex>>,
    pub span: Span,
}

/// `string`, `number`, `boolean`, `any`, `null`, `object`, `void`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeywordTypeKind {
    String,
    Number,
    Boolean,
    Any,
    Null,
    Object,
    Void,
}

#[derive(Clone, Debug)]
pub struct KeywordType {
    pub keyword: KeywordTypeKind,
    pub span: Span,
}

/// `T[]`
#[derive(Clone, Debug)]
pub struct ArrayType {
    pub element_type: NodeIndex,
    pub span: Span,
}

/// `Name` or `Name<T, ...>`
#[derive(Clone, Debug)]
pub struct TypeReference {
    pub type_name: NodeIndex,
    pub type_arguments: Option<Vec<NodeIndex>>,
    pub span: Span,
}

/// `{ members }` inline object type.
#[derive(Clone, Debug)]
pub struct TypeLiteral {
    pub members: Vec<NodeIndex>,
    pub span: Span,
}

/// `(...) => T`
#[derive(Clone, Debug)]
pub struct FunctionType {
    pub span: Span,
}

#[derive(Clone, Debug)]
pub struct UnionType {
    pub types: Vec<NodeIndex>,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub struct IntersectionType {
    pub types: Vec<NodeIndex>,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub struct ParenthesizedType {
    pub type_node: NodeIndex,
    pub span: Span,
}

/// Produced when the parser could not recognize a type; classifies as
/// `"unknown"` and never aborts the walk.
#[derive(Clone, Debug)]
pub struct UnknownType {
    pub span: Span,
}

#[derive(Clone, Debug)]
pub enum Node {
    Identifier(Identifier),
    SourceFile(SourceFileNode),
    InterfaceDeclaration(InterfaceDeclaration),
    TypeAliasDeclaration(TypeAliasDeclaration),
    PropertySignature(PropertySignature),
    MethodSignature(MethodSignature),
    ImportDeclaration(ImportDeclaration),
    ImportSpecifier(ImportSpecifier),
    FunctionDeclaration(FunctionDeclaration),
    RawStatement(RawStatement),
    CallExpression(CallExpression),
    KeywordType(KeywordType),
    ArrayType(ArrayType),
    TypeReference(TypeReference),
    TypeLiteral(TypeLiteral),
    FunctionType(FunctionType),
    UnionType(UnionType),
    IntersectionType(IntersectionType),
    ParenthesizedType(ParenthesizedType),
    UnknownType(UnknownType),
}

impl Node {
    pub fn span(&self) -> Span {
        match self {
            Node::Identifier(n) => n.span,
            Node::SourceFile(n) => n.span,
            Node::InterfaceDeclaration(n) => n.span,
            Node::TypeAliasDeclaration(n) => n.span,
            Node::PropertySignature(n) => n.span,
            Node::MethodSignature(n) => n.span,
            Node::ImportDeclaration(n) => n.span,
            Node::ImportSpecifier(n) => n.span,
            Node::FunctionDeclaration(n) => n.span,
            Node::RawStatement(n) => n.span,
            Node::CallExpression(n) => n.span,
            Node::KeywordType(n) => n.span,
            Node::ArrayType(n) => n.span,
            Node::TypeReference(n) => n.span,
            Node::TypeLiteral(n) => n.span,
            Node::FunctionType(n) => n.span,
            Node::UnionType(n) => n.span,
            Node::IntersectionType(n) => n.span,
            Node::ParenthesizedType(n) => n.span,
            Node::UnknownType(n) => n.span,
        }
    }
}

/// Arena-based storage for AST nodes.
#[derive(Debug, Default)]
pub struct NodeArena {
    pub nodes: Vec<Node>,
}

impl NodeArena {
    pub fn new() -> NodeArena {
        NodeArena { nodes: Vec::new() }
    }

    /// Add a node to the arena and return its index.
    pub fn add(&mut self, node: Node) -> NodeIndex {
        let index = self.nodes.len() as u32;
        self.nodes.push(node);
        NodeIndex(index)
    }

    /// Get a node by index.
    pub fn get(&self, index: NodeIndex) -> Option<&Node> {
        if index.is_none() {
            None
        } else {
            self.nodes.get(index.0 as usize)
        }
    }

    /// Text of an identifier node, if `index` points at one.
    pub fn identifier_text(&self, index: NodeIndex) -> Option<&str> {
        match self.get(index)? {
            Node::Identifier(ident) => Some(&ident.text),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arena_add_and_get() {
        let mut arena = NodeArena::new();
        let idx = arena.add(Node::Identifier(Identifier {
            text: "Foo".to_string(),
            span: Span::new(0, 3),
        }));
        assert_eq!(arena.identifier_text(idx), Some("Foo"));
        assert!(arena.get(NodeIndex::NONE).is_none());
    }

    #[test]
    fn none_index_is_none() {
        assert!(NodeIndex::NONE.is_none());
        assert!(NodeIndex(0).is_some());
    }
}
