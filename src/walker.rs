//! Single-traversal tree walker (C2).
//!
//! Walks a parsed `tree_sitter::Tree` for one file exactly once, emitting
//! declarations, references, and scopes into a [`FileAccumulator`]. Holds no
//! process-wide mutable state, so callers may run one walker per file in
//! parallel (see `index::analyze_files_parallel`).

use std::collections::HashSet;
use std::sync::Arc;

use tree_sitter::{Node, Tree};

use crate::model::{
    AccessLevel, Declaration, DeclarationKind, IgnoreCategory, Location, Modifier,
    PropertyWrapper, Reference, ReferenceContext, Scope, ScopeId, ScopeKind, ScopeTree,
    SourceRange, WrapperKind,
};
use crate::tokens::{RawToken, TokenKind};

/// Per-file output of one walker pass; purely additive input to the index
/// aggregator (C3).
#[derive(Debug, Default)]
pub struct FileAccumulator {
    pub file: String,
    pub declarations: Vec<Declaration>,
    pub references: Vec<Reference>,
    pub scopes: ScopeTree,
    pub imports: Vec<String>,
    /// Normalized tokens for this file, consumed by the clone engine (C4/C5).
    pub tokens: Vec<RawToken>,
}

struct WalkCtx<'a> {
    file: String,
    source: &'a [u8],
    acc: FileAccumulator,
    /// Ignore categories inherited from the nearest enclosing declaration.
    inherited_ignore: Vec<HashSet<IgnoreCategory>>,
}

/// Walk `tree` for `file`, producing a [`FileAccumulator`].
///
/// `source` must be the exact bytes the tree was parsed from; trivia
/// (comments, whitespace) is located by scanning `source` directly since
/// tree-sitter attaches it as extra/anonymous nodes rather than fields.
pub fn walk_file(file: &str, source: &str, tree: &Tree) -> FileAccumulator {
    let mut ctx = WalkCtx {
        file: file.to_string(),
        source: source.as_bytes(),
        acc: FileAccumulator {
            file: file.to_string(),
            scopes: ScopeTree::new(),
            ..Default::default()
        },
        inherited_ignore: vec![HashSet::new()],
    };

    let root = tree.root_node();
    let global_range = node_range(&ctx, &root);
    ctx.acc.scopes.insert(ScopeKind::Global, None, None, global_range);

    walk_node(&mut ctx, root, ScopeId::GLOBAL);
    tokenize(&mut ctx, root);

    ctx.acc
}

// ---------------------------------------------------------------------
// Trivia / location handling
// ---------------------------------------------------------------------

/// First non-trivia byte offset at or before `node`'s start: tree-sitter
/// already excludes leading whitespace/comments from named declaration
/// nodes in this grammar, but attribute lists are siblings, not children,
/// of the node they annotate, so callers pass the attribute-inclusive
/// start explicitly via `effective_start`.
fn location_of(ctx: &WalkCtx, byte_offset: usize) -> Location {
    let mut line = 1usize;
    let mut col = 1usize;
    for &b in &ctx.source[..byte_offset.min(ctx.source.len())] {
        if b == b'\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }
    Location::new(ctx.file.clone(), line, col, byte_offset)
}

fn node_range(ctx: &WalkCtx, node: &Node) -> SourceRange {
    SourceRange {
        start: location_of(ctx, node.start_byte()),
        end: location_of(ctx, node.end_byte()),
    }
}

/// Walk backward over preceding siblings that are attributes, returning the
/// effective start byte offset of `node` including its attribute list.
fn effective_decl_start(node: &Node) -> usize {
    let mut start = node.start_byte();
    let mut sib = node.prev_sibling();
    while let Some(s) = sib {
        if is_attribute_like(&s) {
            start = s.start_byte();
            sib = s.prev_sibling();
        } else {
            break;
        }
    }
    start
}

fn is_attribute_like(node: &Node) -> bool {
    matches!(node.kind(), "attribute" | "modifiers")
}

/// Parse `swa:<directive>` ignore comments out of the trivia immediately
/// preceding `start_byte`. Scans backward over comment lines until a
/// non-comment, non-blank line is hit.
fn parse_ignore_directives(ctx: &WalkCtx, start_byte: usize, prefix: &str) -> HashSet<IgnoreCategory> {
    let mut out = HashSet::new();
    let text = String::from_utf8_lossy(&ctx.source[..start_byte.min(ctx.source.len())]);
    let marker = format!("{}:", prefix);

    for line in text.lines().rev() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let is_comment = trimmed.starts_with("//") || trimmed.starts_with("///") || trimmed.starts_with('*');
        if !is_comment {
            break;
        }
        if let Some(idx) = trimmed.find(marker.as_str()) {
            let rest = &trimmed[idx + marker.len()..];
            let directive = rest.split_whitespace().next().unwrap_or("").trim();
            match directive {
                "ignore" => {
                    out.insert(IgnoreCategory::All);
                }
                "ignore-unused" => {
                    out.insert(IgnoreCategory::Unused);
                }
                "ignore-unused-cases" => {
                    out.insert(IgnoreCategory::UnusedCases);
                }
                "ignore-duplicates" | "ignore-duplicates:begin" | "ignore-duplicates:end" => {
                    out.insert(IgnoreCategory::Duplicates);
                }
                _ => {}
            }
        }
    }
    out
}

// ---------------------------------------------------------------------
// Declaration recognition
// ---------------------------------------------------------------------

fn decl_kind_for_node_kind(kind: &str) -> Option<DeclarationKind> {
    Some(match kind {
        "function_declaration" => DeclarationKind::Function,
        "init_declaration" => DeclarationKind::Initializer,
        "property_declaration" if true => DeclarationKind::Variable,
        "class_declaration" => DeclarationKind::Class,
        "struct_declaration" => DeclarationKind::Struct,
        "enum_declaration" => DeclarationKind::Enum,
        "enum_entry" => DeclarationKind::EnumCase,
        "protocol_declaration" => DeclarationKind::Protocol,
        "extension_declaration" => DeclarationKind::Extension,
        "typealias_declaration" => DeclarationKind::TypeAlias,
        "import_declaration" => DeclarationKind::Import,
        "parameter" => DeclarationKind::Parameter,
        _ => return None,
    })
}

fn scope_kind_for_node_kind(kind: &str) -> Option<ScopeKind> {
    Some(match kind {
        "function_declaration" | "init_declaration" => ScopeKind::Function,
        "class_declaration" => ScopeKind::Class,
        "struct_declaration" => ScopeKind::Struct,
        "enum_declaration" => ScopeKind::Enum,
        "protocol_declaration" => ScopeKind::Protocol,
        "extension_declaration" => ScopeKind::Extension,
        "lambda_literal" | "closure_expression" => ScopeKind::Closure,
        "statements" | "function_body" => ScopeKind::Block,
        _ => return None,
    })
}

fn node_text<'a>(ctx: &WalkCtx<'a>, node: &Node) -> String {
    String::from_utf8_lossy(&ctx.source[node.start_byte()..node.end_byte()]).into_owned()
}

fn parse_access_level(text: &str) -> Option<AccessLevel> {
    match text {
        "private" => Some(AccessLevel::Private),
        "fileprivate" => Some(AccessLevel::FilePrivate),
        "internal" => Some(AccessLevel::Internal),
        "package" => Some(AccessLevel::Package),
        "public" => Some(AccessLevel::Public),
        "open" => Some(AccessLevel::Open),
        _ => None,
    }
}

fn parse_modifier(text: &str) -> Option<Modifier> {
    match text {
        "static" => Some(Modifier::Static),
        "final" => Some(Modifier::Final),
        "override" => Some(Modifier::Override),
        "lazy" => Some(Modifier::Lazy),
        "mutating" => Some(Modifier::Mutating),
        "convenience" => Some(Modifier::Convenience),
        _ => None,
    }
}

/// Collects name, access level, modifiers, and attributes from a
/// declaration's `modifiers`/attribute-list children.
struct DeclHeader {
    access_level: AccessLevel,
    modifiers: HashSet<Modifier>,
    attributes: HashSet<String>,
    property_wrappers: Vec<PropertyWrapper>,
}

fn parse_header(ctx: &WalkCtx, node: &Node) -> DeclHeader {
    let mut access_level = AccessLevel::Internal;
    let mut modifiers = HashSet::new();
    let mut attributes = HashSet::new();
    let mut property_wrappers = Vec::new();

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "modifiers" => {
                let mut mcur = child.walk();
                for m in child.children(&mut mcur) {
                    let text = node_text(ctx, &m);
                    if let Some(level) = parse_access_level(&text) {
                        access_level = level;
                    } else if let Some(modf) = parse_modifier(&text) {
                        modifiers.insert(modf);
                    }
                }
            }
            "attribute" => {
                let name = attribute_name(ctx, &child);
                let wrapper = WrapperKind::from_attribute_name(&name);
                if wrapper.implies_usage() || is_known_attribute(&name) {
                    property_wrappers.push(PropertyWrapper {
                        kind: wrapper,
                        arguments: None,
                    });
                }
                attributes.insert(name);
            }
            _ => {}
        }
    }

    DeclHeader {
        access_level,
        modifiers,
        attributes,
        property_wrappers,
    }
}

fn attribute_name(ctx: &WalkCtx, attr: &Node) -> String {
    // `@Name(...)` — strip the leading `@` and any parenthesized arguments.
    let raw = node_text(ctx, attr);
    let trimmed = raw.trim_start_matches('@');
    trimmed.split('(').next().unwrap_or(trimmed).trim().to_string()
}

fn is_known_attribute(name: &str) -> bool {
    matches!(
        name,
        "main" | "objc" | "available" | "UIApplicationMain" | "NSApplicationMain"
    )
}

fn decl_name(ctx: &WalkCtx, node: &Node) -> Option<String> {
    node.child_by_field_name("name")
        .map(|n| node_text(ctx, &n))
}

fn underscore_parameter(name: &str) -> bool {
    name == "_"
}

// ---------------------------------------------------------------------
// Tree traversal
// ---------------------------------------------------------------------

fn walk_node(ctx: &mut WalkCtx, node: Node, scope: ScopeId) {
    let kind = node.kind();

    // Declarations open their own child scope inside `emit_declaration`;
    // check that first so e.g. `function_declaration` (both a decl kind and
    // a scope kind) isn't double-scoped.
    if let Some(decl_kind) = decl_kind_for_node_kind(kind) {
        emit_declaration(ctx, node, scope, decl_kind);
        return;
    }

    if let Some(new_scope_kind) = scope_kind_for_node_kind(kind) {
        let range = node_range(ctx, &node);
        let child_scope = ctx.acc.scopes.insert(new_scope_kind, None, Some(scope), range);
        walk_children(ctx, node, child_scope);
        return;
    }

    if kind == "call_expression" {
        emit_reference_from_call(ctx, node, scope);
    } else if kind == "navigation_expression" {
        emit_reference_from_member_access(ctx, node, scope);
    } else if kind == "simple_identifier" {
        emit_bare_identifier_reference(ctx, node, scope);
    }

    walk_children(ctx, node, scope);
}

fn walk_children(ctx: &mut WalkCtx, node: Node, scope: ScopeId) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk_node(ctx, child, scope);
    }
}

fn emit_declaration(ctx: &mut WalkCtx, node: Node, scope: ScopeId, kind: DeclarationKind) {
    let Some(name) = decl_name(ctx, &node) else {
        // Anonymous constructs (e.g. unnamed closures) still open a scope.
        if let Some(sk) = scope_kind_for_node_kind(node.kind()) {
            let range = node_range(ctx, &node);
            let child_scope = ctx.acc.scopes.insert(sk, None, Some(scope), range);
            walk_children(ctx, node, child_scope);
        } else {
            walk_children(ctx, node, scope);
        }
        return;
    };

    if kind == DeclarationKind::Parameter && underscore_parameter(&name) {
        walk_children(ctx, node, scope);
        return;
    }

    let header = parse_header(ctx, &node);
    let effective_start = effective_decl_start(&node);
    let location = location_of(ctx, effective_start);
    let range = SourceRange {
        start: location.clone(),
        end: location_of(ctx, node.end_byte()),
    };

    let mut ignore_directives =
        parse_ignore_directives(ctx, effective_start, "swa");
    // Inherit ignore/ignore-unused from the nearest enclosing declaration.
    if let Some(parent_ignore) = ctx.inherited_ignore.last() {
        for cat in parent_ignore {
            if matches!(cat, IgnoreCategory::All | IgnoreCategory::Unused) {
                ignore_directives.insert(*cat);
            }
        }
    }
    // Enum cases additionally inherit `ignore-unused-cases` from the enum.
    if kind == DeclarationKind::EnumCase {
        if let Some(parent_ignore) = ctx.inherited_ignore.last() {
            if parent_ignore.contains(&IgnoreCategory::UnusedCases) {
                ignore_directives.insert(IgnoreCategory::UnusedCases);
            }
        }
    }

    let type_conformances = parse_type_conformances(ctx, &node);

    let decl = Declaration {
        name,
        kind,
        access_level: header.access_level,
        modifiers: header.modifiers,
        attributes: header.attributes,
        property_wrappers: header.property_wrappers,
        type_conformances,
        location,
        range: range.clone(),
        scope,
        ignore_directives: ignore_directives.clone(),
    };

    if kind == DeclarationKind::Import {
        ctx.acc.imports.push(decl.name.clone());
    }

    ctx.acc.declarations.push(decl);

    ctx.inherited_ignore.push(ignore_directives);
    if let Some(child_scope_kind) = scope_kind_for_node_kind(node.kind()) {
        let child_scope = ctx.acc.scopes.insert(child_scope_kind, Some(node_text_name(ctx, &node)), Some(scope), range);
        walk_children(ctx, node, child_scope);
    } else {
        walk_children(ctx, node, scope);
    }
    ctx.inherited_ignore.pop();
}

fn node_text_name(ctx: &WalkCtx, node: &Node) -> String {
    decl_name(ctx, node).unwrap_or_default()
}

fn parse_type_conformances(ctx: &WalkCtx, node: &Node) -> HashSet<String> {
    let mut out = HashSet::new();
    if let Some(clause) = node.child_by_field_name("inheritance") {
        let mut cursor = clause.walk();
        for child in clause.children(&mut cursor) {
            if child.kind() == "user_type" || child.kind() == "type_identifier" {
                out.insert(node_text(ctx, &child));
            }
        }
    }
    out
}

fn emit_reference_from_call(ctx: &mut WalkCtx, node: Node, scope: ScopeId) {
    if let Some(callee) = node.child_by_field_name("function") {
        let (identifier, qualified, qualifier) = split_qualified(ctx, &callee);
        ctx.acc.references.push(Reference {
            identifier,
            location: location_of(ctx, callee.start_byte()),
            scope,
            context: ReferenceContext::Call,
            qualified,
            qualifier,
        });
    }
}

fn emit_reference_from_member_access(ctx: &mut WalkCtx, node: Node, scope: ScopeId) {
    if let Some(target) = node.child_by_field_name("suffix") {
        let qualifier = node
            .child_by_field_name("target")
            .map(|n| node_text(ctx, &n));
        ctx.acc.references.push(Reference {
            identifier: node_text(ctx, &target),
            location: location_of(ctx, target.start_byte()),
            scope,
            context: ReferenceContext::MemberAccess,
            qualified: true,
            qualifier,
        });
    }
}

fn emit_bare_identifier_reference(ctx: &mut WalkCtx, node: Node, scope: ScopeId) {
    // A bare identifier that is not itself the callee/member of a larger
    // expression handled above; classify by immediate syntactic parent.
    let context = match node.parent().map(|p| p.kind().to_string()) {
        Some(k) if k == "call_expression" || k == "navigation_expression" => return,
        Some(k) if k == "assignment" => ReferenceContext::Write,
        Some(k) if k == "type_annotation" || k == "user_type" => ReferenceContext::TypeAnnotation,
        Some(k) if k == "inheritance_specifier" => ReferenceContext::Inheritance,
        _ => ReferenceContext::Read,
    };

    ctx.acc.references.push(Reference {
        identifier: node_text(ctx, &node),
        location: location_of(ctx, node.start_byte()),
        scope,
        context,
        qualified: false,
        qualifier: None,
    });
}

fn split_qualified(ctx: &WalkCtx, node: &Node) -> (String, bool, Option<String>) {
    if node.kind() == "navigation_expression" {
        let qualifier = node
            .child_by_field_name("target")
            .map(|n| node_text(ctx, &n));
        let name = node
            .child_by_field_name("suffix")
            .map(|n| node_text(ctx, &n))
            .unwrap_or_else(|| node_text(ctx, node));
        (name, true, qualifier)
    } else {
        (node_text(ctx, node), false, None)
    }
}

// ---------------------------------------------------------------------
// Normalized token stream emission (feeds C4/C5)
// ---------------------------------------------------------------------

fn tokenize(ctx: &mut WalkCtx, root: Node) {
    let mut cursor = root.walk();
    collect_leaf_tokens(ctx, &mut cursor);
}

fn collect_leaf_tokens(ctx: &mut WalkCtx, cursor: &mut tree_sitter::TreeCursor) {
    loop {
        let node = cursor.node();
        if node.child_count() == 0 {
            if let Some(kind) = classify_leaf(node.kind()) {
                let start = node.start_byte();
                let (line, column) = line_col(ctx, start);
                ctx.acc.tokens.push(RawToken {
                    kind,
                    offset: start as u32,
                    length: (node.end_byte() - start) as u32,
                    line: line as u32,
                    column: column as u32,
                });
            }
        }

        if cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return;
            }
        }
    }
}

fn line_col(ctx: &WalkCtx, byte_offset: usize) -> (usize, usize) {
    let loc = location_of(ctx, byte_offset);
    (loc.line, loc.column)
}

fn classify_leaf(kind: &str) -> Option<TokenKind> {
    if kind.trim().is_empty() || kind == "comment" || kind == "multiline_comment" {
        return None;
    }
    Some(match kind {
        "simple_identifier" | "type_identifier" => TokenKind::Identifier,
        "integer_literal" | "real_literal" | "line_string_literal" | "boolean_literal" | "nil" => {
            TokenKind::Literal
        }
        k if k.chars().all(|c| c.is_ascii_alphabetic() || c == '_') && k.chars().next().is_some_and(|c| c.is_ascii_lowercase()) => {
            TokenKind::Keyword
        }
        k if k.chars().all(|c| !c.is_alphanumeric() && c != '_') => TokenKind::Punctuation,
        _ => TokenKind::Unknown,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_ignore_directive_all_from_trivia() {
        let ctx = WalkCtx {
            file: "a.swift".into(),
            source: b"// swa:ignore - reason\nfunc f() {}",
            acc: FileAccumulator::default(),
            inherited_ignore: vec![HashSet::new()],
        };
        let start = ctx.source.iter().position(|&b| b == b'f').unwrap();
        let cats = parse_ignore_directives(&ctx, start, "swa");
        assert!(cats.contains(&IgnoreCategory::All));
    }

    #[test]
    fn parse_ignore_unused_cases_directive() {
        let ctx = WalkCtx {
            file: "a.swift".into(),
            source: b"/// Reasons. // swa:ignore-unused-cases\nenum R { case a }",
            acc: FileAccumulator::default(),
            inherited_ignore: vec![HashSet::new()],
        };
        let start = ctx.source.iter().position(|&b| b == b'e').unwrap();
        let cats = parse_ignore_directives(&ctx, start, "swa");
        assert!(cats.contains(&IgnoreCategory::UnusedCases));
    }

    #[test]
    fn underscore_is_never_a_parameter_name() {
        assert!(underscore_parameter("_"));
        assert!(!underscore_parameter("_x"));
    }

    #[test]
    fn wrapper_attribute_name_strips_at_and_arguments() {
        let ctx = WalkCtx {
            file: "a.swift".into(),
            source: b"@State(wrappedValue: 0) var x",
            acc: FileAccumulator::default(),
            inherited_ignore: vec![HashSet::new()],
        };
        // Simulate the attribute node spanning `@State(wrappedValue: 0)`.
        let raw = &ctx.source[0.."@State(wrappedValue: 0)".len()];
        let name = String::from_utf8_lossy(raw);
        let trimmed = name.trim_start_matches('@');
        let short = trimmed.split('(').next().unwrap_or(trimmed).trim().to_string();
        assert_eq!(short, "State");
        assert!(WrapperKind::from_attribute_name(&short).implies_usage());
    }
}
