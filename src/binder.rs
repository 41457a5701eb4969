//! Symbol binding: the type-name registry and declaration collection pass.
//!
//! Binding is a separate phase that runs to completion before any call site
//! is rewritten. It walks the parsed statements once, creating symbols for
//! top-level type declarations, named imports, and ambient functions, and
//! pre-binding member symbols for every inline type literal reachable from a
//! declaration. The resulting [`BindResult`] is immutable for the rest of
//! the pass: the walker and rewriter only read it.

use crate::ast::{ModifierFlags, Node, NodeArena, NodeIndex};
use bitflags::bitflags;
use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

/// The marker function name recognized at call sites.
pub const MARKER_FUNCTION: &str = "typedData";

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct SymbolFlags: u16 {
        const INTERFACE = 1 << 0;
        const TYPE_ALIAS = 1 << 1;
        const PROPERTY = 1 << 2;
        const METHOD = 1 << 3;
        const FUNCTION = 1 << 4;
        const IMPORT = 1 << 5;
        /// The sentinel `typedData` declaration; calls resolving here are
        /// rewrite targets.
        const MARKER = 1 << 6;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SymbolId(pub u32);

/// A named declaration: its declaration nodes and, for record types, its
/// member symbols in declaration order.
#[derive(Clone, Debug)]
pub struct Symbol {
    pub name: String,
    pub flags: SymbolFlags,
    pub declarations: Vec<NodeIndex>,
    pub value_declaration: NodeIndex,
    pub members: Vec<SymbolId>,
    /// Exported declarations register a facade symbol whose members live on
    /// the export target; member resolution falls through to it.
    pub export_target: Option<SymbolId>,
}

#[derive(Debug, Default)]
pub struct SymbolArena {
    symbols: Vec<Symbol>,
}

impl SymbolArena {
    pub fn alloc(&mut self, symbol: Symbol) -> SymbolId {
        let id = SymbolId(self.symbols.len() as u32);
        self.symbols.push(symbol);
        id
    }

    pub fn get(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.0 as usize]
    }

    fn get_mut(&mut self, id: SymbolId) -> &mut Symbol {
        &mut self.symbols[id.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

/// Type-name registry. First registration for a name wins; later same-named
/// declarations are ignored (one-pass top-level scanning policy). There is
/// no removal for the lifetime of a pass.
#[derive(Debug, Default)]
pub struct SymbolTable {
    map: FxHashMap<String, SymbolId>,
}

impl SymbolTable {
    pub fn register(&mut self, name: &str, symbol: SymbolId) {
        self.map.entry(name.to_string()).or_insert(symbol);
    }

    pub fn lookup(&self, name: &str) -> Option<SymbolId> {
        self.map.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Output of the collection pass.
#[derive(Debug)]
pub struct BindResult {
    pub symbols: SymbolArena,
    pub table: SymbolTable,
    /// Member symbols pre-bound for each inline `TypeLiteral` node.
    pub literal_members: FxHashMap<NodeIndex, Vec<SymbolId>>,
    /// Root member list resolved for each call expression's first type
    /// argument, keyed by the call node. Covers arguments with no table
    /// entry of their own: inline literals, unions, intersections.
    pub call_root_members: FxHashMap<NodeIndex, Vec<SymbolId>>,
}

impl BindResult {
    /// Member list of a symbol, following the export-target indirection when
    /// the symbol itself carries no members.
    pub fn members_of(&self, id: SymbolId) -> &[SymbolId] {
        let symbol = self.symbols.get(id);
        if !symbol.members.is_empty() {
            return &symbol.members;
        }
        match symbol.export_target {
            Some(target) => &self.symbols.get(target).members,
            None => &[],
        }
    }

    pub fn is_marker(&self, id: SymbolId) -> bool {
        self.symbols.get(id).flags.contains(SymbolFlags::MARKER)
    }
}

/// Bind all top-level declarations of a parsed source file.
pub fn bind_source_file(
    arena: &NodeArena,
    source_file: NodeIndex,
    marker_modules: &[String],
) -> BindResult {
    let mut binder = BinderState {
        arena,
        marker_modules,
        symbols: SymbolArena::default(),
        table: SymbolTable::default(),
        literal_members: FxHashMap::default(),
        call_root_members: FxHashMap::default(),
    };
    binder.collect(source_file);
    binder.resolve_alias_members(source_file);
    binder.resolve_call_roots(source_file);
    debug!(
        symbols = binder.symbols.len(),
        names = binder.table.len(),
        "bound source file"
    );
    BindResult {
        symbols: binder.symbols,
        table: binder.table,
        literal_members: binder.literal_members,
        call_root_members: binder.call_root_members,
    }
}

struct BinderState<'a> {
    arena: &'a NodeArena,
    marker_modules: &'a [String],
    symbols: SymbolArena,
    table: SymbolTable,
    literal_members: FxHashMap<NodeIndex, Vec<SymbolId>>,
    call_root_members: FxHashMap<NodeIndex, Vec<SymbolId>>,
}

impl<'a> BinderState<'a> {
    fn collect(&mut self, source_file: NodeIndex) {
        let statements = match self.arena.get(source_file) {
            Some(Node::SourceFile(sf)) => sf.statements.clone(),
            _ => return,
        };
        for stmt in statements {
            match self.arena.get(stmt) {
                Some(Node::InterfaceDeclaration(iface)) => {
                    let name = match self.arena.identifier_text(iface.name) {
                        Some(name) => name.to_string(),
                        None => continue,
                    };
                    let members = self.bind_members(&iface.members);
                    let inner = self.symbols.alloc(Symbol {
                        name: name.clone(),
                        flags: SymbolFlags::INTERFACE,
                        declarations: vec![stmt],
                        value_declaration: stmt,
                        members,
                        export_target: None,
                    });
                    if iface.modifiers.contains(ModifierFlags::EXPORT) {
                        let facade = self.symbols.alloc(Symbol {
                            name: name.clone(),
                            flags: SymbolFlags::INTERFACE,
                            declarations: vec![stmt],
                            value_declaration: stmt,
                            members: Vec::new(),
                            export_target: Some(inner),
                        });
                        self.table.register(&name, facade);
                    } else {
                        self.table.register(&name, inner);
                    }
                }
                Some(Node::TypeAliasDeclaration(alias)) => {
                    let name = match self.arena.identifier_text(alias.name) {
                        Some(name) => name.to_string(),
                        None => continue,
                    };
                    self.visit_type(alias.type_node);
                    let id = self.symbols.alloc(Symbol {
                        name: name.clone(),
                        flags: SymbolFlags::TYPE_ALIAS,
                        declarations: vec![stmt],
                        value_declaration: stmt,
                        members: Vec::new(), // resolved in the second sweep
                        export_target: None,
                    });
                    self.table.register(&name, id);
                }
                Some(Node::ImportDeclaration(import)) => {
                    let from_marker_module = is_marker_module(&import.module, self.marker_modules);
                    for &spec in &import.specifiers {
                        if let Some(Node::ImportSpecifier(s)) = self.arena.get(spec) {
                            let mut flags = SymbolFlags::IMPORT;
                            if from_marker_module && s.imported == MARKER_FUNCTION {
                                flags |= SymbolFlags::MARKER;
                            }
                            let local = s.local.clone();
                            let id = self.symbols.alloc(Symbol {
                                name: local.clone(),
                                flags,
                                declarations: vec![spec],
                                value_declaration: spec,
                                members: Vec::new(),
                                export_target: None,
                            });
                            self.table.register(&local, id);
                        }
                    }
                }
                Some(Node::FunctionDeclaration(func)) => {
                    let name = match self.arena.identifier_text(func.name) {
                        Some(name) => name.to_string(),
                        None => continue,
                    };
                    let mut flags = SymbolFlags::FUNCTION;
                    // An ambient declare of the marker acts as the sentinel
                    // in single-file mode.
                    if name == MARKER_FUNCTION {
                        flags |= SymbolFlags::MARKER;
                    }
                    let id = self.symbols.alloc(Symbol {
                        name: name.clone(),
                        flags,
                        declarations: vec![stmt],
                        value_declaration: stmt,
                        members: Vec::new(),
                        export_target: None,
                    });
                    self.table.register(&name, id);
                }
                Some(Node::RawStatement(raw)) => {
                    // Type arguments written at call sites can carry inline
                    // literals; their members get bound like any other.
                    let calls = raw.calls.clone();
                    for call in calls {
                        if let Some(Node::CallExpression(c)) = self.arena.get(call) {
                            if let Some(args) = c.type_arguments.clone() {
                                for arg in args {
                                    self.visit_type(arg);
                                }
                            }
                        }
                    }
                }
                _ => {}
            }
        }
    }

    /// Bind property/method symbols for a member node list, visiting each
    /// member's type so nested literals get bound too.
    fn bind_members(&mut self, members: &[NodeIndex]) -> Vec<SymbolId> {
        let mut out = Vec::with_capacity(members.len());
        for &member in members {
            match self.arena.get(member) {
                Some(Node::PropertySignature(prop)) => {
                    let name = match self.arena.identifier_text(prop.name) {
                        Some(name) => name.to_string(),
                        None => continue,
                    };
                    self.visit_type(prop.type_node);
                    out.push(self.symbols.alloc(Symbol {
                        name,
                        flags: SymbolFlags::PROPERTY,
                        declarations: vec![member],
                        value_declaration: member,
                        members: Vec::new(),
                        export_target: None,
                    }));
                }
                Some(Node::MethodSignature(method)) => {
                    let name = match self.arena.identifier_text(method.name) {
                        Some(name) => name.to_string(),
                        None => continue,
                    };
                    out.push(self.symbols.alloc(Symbol {
                        name,
                        flags: SymbolFlags::METHOD,
                        declarations: vec![member],
                        value_declaration: member,
                        members: Vec::new(),
                        export_target: None,
                    }));
                }
                _ => {}
            }
        }
        out
    }

    /// Pre-bind member symbols for every type literal under `node`.
    fn visit_type(&mut self, node: NodeIndex) {
        match self.arena.get(node) {
            Some(Node::TypeLiteral(lit)) => {
                if !self.literal_members.contains_key(&node) {
                    let members = self.bind_members(&lit.members);
                    self.literal_members.insert(node, members);
                }
            }
            Some(Node::ArrayType(arr)) => self.visit_type(arr.element_type),
            Some(Node::TypeReference(re)) => {
                if let Some(args) = &re.type_arguments {
                    for &arg in args {
                        self.visit_type(arg);
                    }
                }
            }
            Some(Node::UnionType(u)) => {
                for &t in &u.types {
                    self.visit_type(t);
                }
            }
            Some(Node::IntersectionType(i)) => {
                for &t in &i.types {
                    self.visit_type(t);
                }
            }
            Some(Node::ParenthesizedType(p)) => self.visit_type(p.type_node),
            _ => {}
        }
    }

    /// Second sweep: alias members can reference names declared later in the
    /// file, so they resolve only after every top-level name is registered.
    fn resolve_alias_members(&mut self, source_file: NodeIndex) {
        let statements = match self.arena.get(source_file) {
            Some(Node::SourceFile(sf)) => sf.statements.clone(),
            _ => return,
        };
        for stmt in statements {
            let (name, type_node) = match self.arena.get(stmt) {
                Some(Node::TypeAliasDeclaration(alias)) => {
                    match self.arena.identifier_text(alias.name) {
                        Some(name) => (name.to_string(), alias.type_node),
                        None => continue,
                    }
                }
                _ => continue,
            };
            let Some(id) = self.table.lookup(&name) else {
                continue;
            };
            // First-wins registration: only resolve when this statement is
            // the registered declaration.
            if self.symbols.get(id).value_declaration != stmt {
                continue;
            }
            let mut visiting = FxHashSet::default();
            visiting.insert(id);
            let members = self.members_of_type_node(type_node, &mut visiting);
            self.symbols.get_mut(id).members = members;
        }
    }

    /// Member symbols of a type node: literal members directly, record
    /// members through the table for references, and a name-merged union of
    /// constituent members for unions/intersections (one symbol per property
    /// name, carrying one declaration per constituent that declares it).
    fn members_of_type_node(
        &mut self,
        node: NodeIndex,
        visiting: &mut FxHashSet<SymbolId>,
    ) -> Vec<SymbolId> {
        match self.arena.get(node) {
            Some(Node::TypeLiteral(_)) => self
                .literal_members
                .get(&node)
                .cloned()
                .unwrap_or_default(),
            Some(Node::TypeReference(re)) => {
                let Some(name) = self.arena.identifier_text(re.type_name) else {
                    return Vec::new();
                };
                let Some(id) = self.table.lookup(name) else {
                    return Vec::new();
                };
                if !visiting.insert(id) {
                    return Vec::new(); // alias cycle
                }
                let symbol = self.symbols.get(id);
                if !symbol.members.is_empty() {
                    return symbol.members.clone();
                }
                if let Some(target) = symbol.export_target {
                    return self.symbols.get(target).members.clone();
                }
                if symbol.flags.contains(SymbolFlags::TYPE_ALIAS) {
                    let alias_type = match self.arena.get(symbol.value_declaration) {
                        Some(Node::TypeAliasDeclaration(alias)) => alias.type_node,
                        _ => return Vec::new(),
                    };
                    return self.members_of_type_node(alias_type, visiting);
                }
                Vec::new()
            }
            Some(Node::UnionType(u)) => {
                let types = u.types.clone();
                self.merge_constituent_members(&types, visiting)
            }
            Some(Node::IntersectionType(i)) => {
                let types = i.types.clone();
                self.merge_constituent_members(&types, visiting)
            }
            Some(Node::ParenthesizedType(p)) => self.members_of_type_node(p.type_node, visiting),
            _ => Vec::new(),
        }
    }

    /// Third sweep: resolve the root member list of every call's first type
    /// argument, so the rewriter can enumerate unions, intersections, and
    /// inline literals that have no table entry.
    fn resolve_call_roots(&mut self, source_file: NodeIndex) {
        let statements = match self.arena.get(source_file) {
            Some(Node::SourceFile(sf)) => sf.statements.clone(),
            _ => return,
        };
        for stmt in statements {
            let calls = match self.arena.get(stmt) {
                Some(Node::RawStatement(raw)) => raw.calls.clone(),
                _ => continue,
            };
            for call in calls {
                let first_arg = match self.arena.get(call) {
                    Some(Node::CallExpression(c)) => {
                        c.type_arguments.as_ref().and_then(|args| args.first().copied())
                    }
                    _ => None,
                };
                if let Some(arg) = first_arg {
                    let mut visiting = FxHashSet::default();
                    let members = self.members_of_type_node(arg, &mut visiting);
                    self.call_root_members.insert(call, members);
                }
            }
        }
    }

    fn merge_constituent_members(
        &mut self,
        types: &[NodeIndex],
        visiting: &mut FxHashSet<SymbolId>,
    ) -> Vec<SymbolId> {
        let mut merged: IndexMap<String, SymbolId> = IndexMap::new();
        let mut fresh: FxHashSet<SymbolId> = FxHashSet::default();
        for &t in types {
            for member in self.members_of_type_node(t, visiting) {
                let (name, decls, flags) = {
                    let s = self.symbols.get(member);
                    (s.name.clone(), s.declarations.clone(), s.flags)
                };
                match merged.get(&name).copied() {
                    None => {
                        merged.insert(name, member);
                    }
                    Some(existing) if fresh.contains(&existing) => {
                        // Already a merge-local symbol; append declarations.
                        self.symbols.get_mut(existing).declarations.extend(decls);
                        self.symbols.get_mut(existing).flags |= flags;
                    }
                    Some(existing) => {
                        // Clone into a merge-local symbol so the original
                        // interface member is never mutated.
                        let base = self.symbols.get(existing).clone();
                        let mut declarations = base.declarations.clone();
                        declarations.extend(decls);
                        let value_declaration = base.value_declaration;
                        let id = self.symbols.alloc(Symbol {
                            name: name.clone(),
                            flags: base.flags | flags,
                            declarations,
                            value_declaration,
                            members: Vec::new(),
                            export_target: None,
                        });
                        fresh.insert(id);
                        merged.insert(name, id);
                    }
                }
            }
        }
        merged.into_values().collect()
    }
}

/// A module specifier refers to the marker package when its final path
/// segment matches one of the configured module names.
pub fn is_marker_module(specifier: &str, marker_modules: &[String]) -> bool {
    let last = specifier.rsplit('/').next().unwrap_or(specifier);
    marker_modules.iter().any(|m| m == last || m == specifier)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::DiagnosticBag;
    use crate::parser::parse_source;

    fn bind(source: &str) -> (crate::parser::ParseResult, BindResult) {
        let mut bag = DiagnosticBag::new();
        let parsed = parse_source(source, "test.ts", &mut bag);
        assert!(!bag.has_errors(), "{bag:?}");
        let marker_modules = vec!["typed-data".to_string()];
        let bound = bind_source_file(&parsed.arena, parsed.source_file, &marker_modules);
        (parsed, bound)
    }

    #[test]
    fn registers_interface_with_members() {
        let (_, bound) = bind("interface Foo { a: string; b: number }");
        let id = bound.table.lookup("Foo").expect("Foo registered");
        let members = bound.members_of(id);
        assert_eq!(members.len(), 2);
        assert_eq!(bound.symbols.get(members[0]).name, "a");
        assert_eq!(bound.symbols.get(members[1]).name, "b");
    }

    #[test]
    fn first_registration_wins() {
        let (_, bound) = bind("interface A { x: string }\ninterface A { y: string }");
        let id = bound.table.lookup("A").unwrap();
        let members = bound.members_of(id);
        assert_eq!(members.len(), 1);
        assert_eq!(bound.symbols.get(members[0]).name, "x");
    }

    #[test]
    fn exported_interface_resolves_through_export_target() {
        let (_, bound) = bind("export interface Foo { a: string }");
        let id = bound.table.lookup("Foo").unwrap();
        assert!(bound.symbols.get(id).members.is_empty());
        assert!(bound.symbols.get(id).export_target.is_some());
        assert_eq!(bound.members_of(id).len(), 1);
    }

    #[test]
    fn marker_import_is_flagged() {
        let (_, bound) = bind("import { typedData } from 'typed-data';");
        let id = bound.table.lookup("typedData").unwrap();
        assert!(bound.is_marker(id));
    }

    #[test]
    fn aliased_marker_import_keeps_flag_on_local_name() {
        let (_, bound) = bind("import { typedData as td } from '@scope/typed-data';");
        let id = bound.table.lookup("td").unwrap();
        assert!(bound.is_marker(id));
        assert!(bound.table.lookup("typedData").is_none());
    }

    #[test]
    fn non_marker_module_import_is_not_flagged() {
        let (_, bound) = bind("import { typedData } from './my-utils';");
        let id = bound.table.lookup("typedData").unwrap();
        assert!(!bound.is_marker(id));
    }

    #[test]
    fn ambient_declare_is_marker() {
        let (_, bound) = bind("declare function typedData<T>(): void;");
        let id = bound.table.lookup("typedData").unwrap();
        assert!(bound.is_marker(id));
    }

    #[test]
    fn type_literal_members_are_prebound() {
        let (parsed, bound) = bind("interface T { nested: { a: number; b: string } }");
        let literal = parsed
            .arena
            .nodes
            .iter()
            .position(|n| matches!(n, Node::TypeLiteral(_)))
            .map(|i| NodeIndex(i as u32))
            .expect("literal node");
        let members = bound.literal_members.get(&literal).expect("bound members");
        assert_eq!(members.len(), 2);
    }

    #[test]
    fn intersection_alias_merges_members_with_all_declarations() {
        let (_, bound) = bind(
            "interface A { x?: string; y: number }\n\
             interface B { x: string; z: boolean }\n\
             type AB = A & B;",
        );
        let id = bound.table.lookup("AB").unwrap();
        let members = bound.members_of(id);
        let names: Vec<&str> = members
            .iter()
            .map(|&m| bound.symbols.get(m).name.as_str())
            .collect();
        assert_eq!(names, vec!["x", "y", "z"]);
        // Merged `x` carries both declarations.
        assert_eq!(bound.symbols.get(members[0]).declarations.len(), 2);
        // Merging must not mutate A's own member symbol.
        let a = bound.table.lookup("A").unwrap();
        let ax = bound.members_of(a)[0];
        assert_eq!(bound.symbols.get(ax).declarations.len(), 1);
    }

    #[test]
    fn alias_of_alias_resolves() {
        let (_, bound) = bind("interface A { x: string }\ntype B = A;\ntype C = B;");
        let id = bound.table.lookup("C").unwrap();
        assert_eq!(bound.members_of(id).len(), 1);
    }

    #[test]
    fn recursive_alias_does_not_loop() {
        let (_, bound) = bind("type T = T;");
        let id = bound.table.lookup("T").unwrap();
        assert!(bound.members_of(id).is_empty());
    }

    #[test]
    fn marker_module_matching() {
        let mods = vec!["typed-data".to_string()];
        assert!(is_marker_module("typed-data", &mods));
        assert!(is_marker_module("./typed-data", &mods));
        assert!(is_marker_module("@scope/typed-data", &mods));
        assert!(!is_marker_module("other", &mods));
    }
}
