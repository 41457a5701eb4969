//! Type-node classification.
//!
//! Two views of the same type node: [`classify`] produces the descriptor tag
//! recorded in emitted property records, and [`resolve_shape`] produces the
//! structural shape the walker dispatches on. Both are total: a missing or
//! unrecognized node classifies as `"unknown"` and resolves to
//! [`ResolvedShape::Unrecognized`], never a panic or an error.

use crate::ast::{KeywordTypeKind, Node, NodeArena, NodeIndex};
use serde::Serialize;

/// Descriptor tag of a property's declared type: a single tag, or the
/// ordered tag sequence of a union/intersection. Serializes as a bare
/// string or an array of the constituents' serialized forms.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PropertyType {
    Tag(String),
    Group(Vec<PropertyType>),
}

impl PropertyType {
    pub fn tag(text: impl Into<String>) -> PropertyType {
        PropertyType::Tag(text.into())
    }

    pub fn unknown() -> PropertyType {
        PropertyType::Tag("unknown".to_string())
    }
}

fn keyword_tag(keyword: KeywordTypeKind) -> &'static str {
    match keyword {
        KeywordTypeKind::String => "string",
        KeywordTypeKind::Number => "number",
        KeywordTypeKind::Boolean => "boolean",
        KeywordTypeKind::Any => "any",
        KeywordTypeKind::Null => "null",
        KeywordTypeKind::Object => "object",
        // Not part of the tag switch; falls through like any other
        // unhandled kind.
        KeywordTypeKind::Void => "unknown",
    }
}

/// Classify a type node into its descriptor tag.
///
/// Named references keep their written name verbatim, so `Baz` classifies as
/// `"Baz"` and `Array<Baz>` as `"Array"`, while the `[]` shorthand
/// classifies as lowercase `"array"`. The asymmetry is deliberate and
/// load-bearing for consumers that pattern-match on the tag.
pub fn classify(arena: &NodeArena, node: NodeIndex) -> PropertyType {
    match arena.get(node) {
        Some(Node::KeywordType(k)) => PropertyType::tag(keyword_tag(k.keyword)),
        Some(Node::ArrayType(_)) => PropertyType::tag("array"),
        Some(Node::TypeReference(re)) => match arena.identifier_text(re.type_name) {
            Some(name) => PropertyType::tag(name),
            None => PropertyType::unknown(),
        },
        Some(Node::TypeLiteral(_)) => PropertyType::tag("object"),
        Some(Node::FunctionType(_)) => PropertyType::tag("Function"),
        Some(Node::UnionType(u)) => {
            PropertyType::Group(u.types.iter().map(|&t| classify(arena, t)).collect())
        }
        Some(Node::IntersectionType(i)) => {
            PropertyType::Group(i.types.iter().map(|&t| classify(arena, t)).collect())
        }
        Some(Node::ParenthesizedType(p)) => classify(arena, p.type_node),
        _ => PropertyType::unknown(),
    }
}

/// Structural shape of a type node, for walker dispatch. Closed set: every
/// node kind maps to exactly one variant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResolvedShape {
    /// Keyword type; carries no structure to descend into.
    Primitive,
    /// `T[]`; payload is the element type node.
    ArrayOf(NodeIndex),
    /// Named reference, with any written type arguments.
    Reference {
        name: String,
        type_arguments: Vec<NodeIndex>,
    },
    /// Inline `{ ... }` literal; payload is the literal node itself (member
    /// symbols are looked up by node index).
    InlineRecord(NodeIndex),
    /// Function type or method signature.
    FunctionLike,
    /// Union or intersection constituents, in written order.
    Group(Vec<NodeIndex>),
    /// Anything else, including a missing node.
    Unrecognized,
}

/// Resolve a type node to its dispatch shape. Parentheses are transparent.
pub fn resolve_shape(arena: &NodeArena, node: NodeIndex) -> ResolvedShape {
    match arena.get(node) {
        Some(Node::KeywordType(_)) => ResolvedShape::Primitive,
        Some(Node::ArrayType(arr)) => ResolvedShape::ArrayOf(arr.element_type),
        Some(Node::TypeReference(re)) => match arena.identifier_text(re.type_name) {
            Some(name) => ResolvedShape::Reference {
                name: name.to_string(),
                type_arguments: re.type_arguments.clone().unwrap_or_default(),
            },
            None => ResolvedShape::Unrecognized,
        },
        Some(Node::TypeLiteral(_)) => ResolvedShape::InlineRecord(node),
        Some(Node::FunctionType(_)) => ResolvedShape::FunctionLike,
        Some(Node::UnionType(u)) => ResolvedShape::Group(u.types.clone()),
        Some(Node::IntersectionType(i)) => ResolvedShape::Group(i.types.clone()),
        Some(Node::ParenthesizedType(p)) => resolve_shape(arena, p.type_node),
        _ => ResolvedShape::Unrecognized,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::DiagnosticBag;
    use crate::parser::parse_source;

    /// Parse `interface T { p: <ty> }` and return the property's type node.
    fn type_node(ty: &str) -> (NodeArena, NodeIndex) {
        let source = format!("interface T {{ p: {ty} }}");
        let mut bag = DiagnosticBag::new();
        let parsed = parse_source(&source, "test.ts", &mut bag);
        assert!(!bag.has_errors(), "{bag:?}");
        // `p` is parsed after any members of an inline literal payload, so
        // the outer property is always the last signature in the arena.
        let node = parsed
            .arena
            .nodes
            .iter()
            .rposition(|n| matches!(n, Node::PropertySignature(_)))
            .map(|i| NodeIndex(i as u32))
            .expect("property");
        let ty = match parsed.arena.get(node) {
            Some(Node::PropertySignature(p)) => p.type_node,
            _ => unreachable!(),
        };
        (parsed.arena, ty)
    }

    fn tag_of(ty: &str) -> PropertyType {
        let (arena, node) = type_node(ty);
        classify(&arena, node)
    }

    #[test]
    fn keyword_tags() {
        assert_eq!(tag_of("string"), PropertyType::tag("string"));
        assert_eq!(tag_of("number"), PropertyType::tag("number"));
        assert_eq!(tag_of("boolean"), PropertyType::tag("boolean"));
        assert_eq!(tag_of("null"), PropertyType::tag("null"));
        assert_eq!(tag_of("void"), PropertyType::unknown());
    }

    #[test]
    fn array_shorthand_is_lowercase_but_generic_keeps_name() {
        assert_eq!(tag_of("Baz[]"), PropertyType::tag("array"));
        assert_eq!(tag_of("Array<Baz>"), PropertyType::tag("Array"));
    }

    #[test]
    fn reference_keeps_written_name() {
        assert_eq!(tag_of("Bar"), PropertyType::tag("Bar"));
    }

    #[test]
    fn inline_literal_is_object_and_function_is_capitalized() {
        assert_eq!(tag_of("{ a: string }"), PropertyType::tag("object"));
        assert_eq!(tag_of("() => void"), PropertyType::tag("Function"));
    }

    #[test]
    fn union_classifies_as_ordered_group() {
        assert_eq!(
            tag_of("string | number | null"),
            PropertyType::Group(vec![
                PropertyType::tag("string"),
                PropertyType::tag("number"),
                PropertyType::tag("null"),
            ])
        );
    }

    #[test]
    fn parentheses_are_transparent() {
        assert_eq!(tag_of("(string)"), PropertyType::tag("string"));
        let (arena, node) = type_node("(string | number)[]");
        assert_eq!(classify(&arena, node), PropertyType::tag("array"));
        let elem = match resolve_shape(&arena, node) {
            ResolvedShape::ArrayOf(elem) => elem,
            other => panic!("expected array shape, got {other:?}"),
        };
        assert!(matches!(resolve_shape(&arena, elem), ResolvedShape::Group(_)));
    }

    #[test]
    fn group_serializes_as_json_array() {
        let group = PropertyType::Group(vec![
            PropertyType::tag("string"),
            PropertyType::tag("number"),
        ]);
        let json = serde_json::to_string(&group).expect("serialize");
        assert_eq!(json, r#"["string","number"]"#);
        let tag = PropertyType::tag("Bar");
        assert_eq!(serde_json::to_string(&tag).unwrap(), r#""Bar""#);
    }

    #[test]
    fn shapes_dispatch_by_structure() {
        let (arena, node) = type_node("string");
        assert_eq!(resolve_shape(&arena, node), ResolvedShape::Primitive);
        let (arena, node) = type_node("Array<Baz>");
        match resolve_shape(&arena, node) {
            ResolvedShape::Reference {
                name,
                type_arguments,
            } => {
                assert_eq!(name, "Array");
                assert_eq!(type_arguments.len(), 1);
            }
            other => panic!("expected reference, got {other:?}"),
        }
        let (arena, node) = type_node("{ x: number }");
        assert!(matches!(
            resolve_shape(&arena, node),
            ResolvedShape::InlineRecord(_)
        ));
    }
}
