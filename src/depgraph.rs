//! Dependency extractor (C6): turns declarations and references into a
//! dense reference graph plus a set of root candidates for reachability.
//!
//! Resolution here is name-based, not type-based, a deliberate
//! under-approximation/over-approximation tradeoff: a reference to `foo`
//! is wired to every declaration named `foo` that the reference's scope
//! chain can plausibly see, qualified references narrow that to
//! declarations owned by a scope named after the qualifier. This can over-
//! connect same-named members of unrelated types, which biases the
//! downstream classifier toward under-reporting unused code rather than
//! over-reporting it.

use std::collections::{HashMap, HashSet};

use crate::config::{Config, RootPolicy};
use crate::index::AnalysisResult;
use crate::model::{is_view_like, Declaration, DeclarationKind, ReferenceContext, ScopeId};

/// Dense, index-addressed dependency graph. Node `i` corresponds to
/// `result.declarations[i]`.
#[derive(Debug)]
pub struct DependencyGraph {
    pub node_count: usize,
    /// `edges[i]` = declarations that declaration `i`'s references point to.
    pub edges: Vec<Vec<u32>>,
    /// `reverse_edges[i]` = declarations that reference declaration `i`.
    pub reverse_edges: Vec<Vec<u32>>,
    pub roots: Vec<u32>,
}

struct DeclKey<'a> {
    file: &'a str,
    scope: ScopeId,
}

/// Best-effort test detection with no dedicated attribute to key off of,
/// so this leans on naming and conformance conventions actually used in
/// Swift test suites.
fn looks_like_test(decl: &Declaration) -> bool {
    decl.type_conformances.iter().any(|c| c == "XCTestCase")
        || decl.name.starts_with("test")
        || decl.attributes.contains("Test")
}

pub(crate) fn declares_own_scope(decl: &Declaration, scopes_by_file: &HashMap<&str, &crate::model::ScopeTree>) -> Option<ScopeId> {
    let tree = scopes_by_file.get(decl.location.file.as_str())?;
    tree.iter()
        .find(|s| s.name.as_deref() == Some(decl.name.as_str()))
        .map(|s| s.id)
}

/// Build the dependency graph and its root set from a fully-merged
/// [`AnalysisResult`].
pub fn build(result: &AnalysisResult, config: &Config) -> DependencyGraph {
    let n = result.declarations.len();
    let mut edges: Vec<Vec<u32>> = vec![Vec::new(); n];
    let mut reverse_edges: Vec<Vec<u32>> = vec![Vec::new(); n];

    let scopes_by_file: HashMap<&str, &crate::model::ScopeTree> =
        result.scopes.iter().map(|(f, t)| (f.as_str(), t)).collect();

    // name -> declaration indices, for unqualified lookups.
    let mut by_name: HashMap<&str, Vec<usize>> = HashMap::new();
    // scope name (i.e. an enclosing type's own name) -> indices of members
    // whose declaring scope is that type, for qualified lookups.
    let mut by_owner_scope: HashMap<ScopeId, Vec<usize>> = HashMap::new();

    for (i, decl) in result.declarations.iter().enumerate() {
        by_name.entry(decl.name.as_str()).or_default().push(i);
        if let Some(scope) = declares_own_scope(decl, &scopes_by_file) {
            by_owner_scope.entry(scope).or_default().push(i);
        }
    }

    // qualifier text -> the scope id it names, resolved via declarations
    // whose own name matches the qualifier.
    let mut scope_by_type_name: HashMap<&str, ScopeId> = HashMap::new();
    for decl in &result.declarations {
        if matches!(
            decl.kind,
            DeclarationKind::Class | DeclarationKind::Struct | DeclarationKind::Enum | DeclarationKind::Protocol
        ) {
            if let Some(scope) = declares_own_scope(decl, &scopes_by_file) {
                scope_by_type_name.insert(decl.name.as_str(), scope);
            }
        }
    }

    for reference in &result.references {
        let source_idx = owning_declaration(result, reference.scope, reference.location.file.as_str());

        let targets: Vec<usize> = if reference.qualified {
            match reference.qualifier.as_deref().and_then(|q| scope_by_type_name.get(q)) {
                Some(scope) => by_owner_scope.get(scope).cloned().unwrap_or_default(),
                None => by_name.get(reference.identifier.as_str()).cloned().unwrap_or_default(),
            }
        } else {
            by_name.get(reference.identifier.as_str()).cloned().unwrap_or_default()
        };

        for &target in &targets {
            let Some(source) = source_idx else { continue };
            if source == target {
                continue;
            }
            edges[source].push(target as u32);
            reverse_edges[target].push(source as u32);
        }

        // References with no owning declaration (top-level statements) still
        // count as usage from outside the graph: model that as an edge from
        // every target's own root eligibility rather than a synthetic node.
        if source_idx.is_none() {
            for &target in &targets {
                mark_externally_used(&mut reverse_edges, target);
            }
        }
    }

    add_protocol_witness_edges(result, &scopes_by_file, &mut edges, &mut reverse_edges);
    add_closure_capture_edges(result, &mut edges, &mut reverse_edges);

    dedup_edges(&mut edges);
    dedup_edges(&mut reverse_edges);

    let roots = collect_roots(result, &config.root_policy);

    DependencyGraph {
        node_count: n,
        edges,
        reverse_edges,
        roots,
    }
}

/// Marker used to flag a target reachable from outside the declaration
/// graph entirely (e.g. a top-level `print(foo())` call): represented as a
/// self-loop so the reachability engine's BFS treats it as directly visited
/// without needing an out-of-band root list.
fn mark_externally_used(reverse_edges: &mut [Vec<u32>], target: usize) {
    reverse_edges[target].push(target as u32);
}

fn dedup_edges(edges: &mut [Vec<u32>]) {
    for e in edges.iter_mut() {
        e.sort_unstable();
        e.dedup();
    }
}

/// Find the innermost declaration whose own scope contains `scope` in the
/// same file, i.e. the declaration a reference textually belongs to.
fn owning_declaration(result: &AnalysisResult, scope: ScopeId, file: &str) -> Option<usize> {
    let tree = result.scopes.get(file)?;
    let chain = tree.chain(scope);
    for candidate_scope in chain {
        if let Some(idx) = result
            .declarations
            .iter()
            .position(|d| d.location.file == file && d.scope == candidate_scope)
        {
            return Some(idx);
        }
        // Also match declarations whose *own* body scope is this one.
        if let Some(name) = tree.get(candidate_scope).and_then(|s| s.name.as_ref()) {
            if let Some(idx) = result
                .declarations
                .iter()
                .position(|d| d.location.file == file && &d.name == name)
            {
                return Some(idx);
            }
        }
    }
    None
}

/// Protocol requirement -> conforming-type witness edges: a type that
/// conforms to a protocol implicitly "uses" the protocol's requirement
/// declarations of the same name, and the requirement is considered used if
/// any conforming witness is reachable.
fn add_protocol_witness_edges(
    result: &AnalysisResult,
    scopes_by_file: &HashMap<&str, &crate::model::ScopeTree>,
    edges: &mut [Vec<u32>],
    reverse_edges: &mut [Vec<u32>],
) {
    let protocol_members: HashMap<(&str, &str), usize> = result
        .declarations
        .iter()
        .enumerate()
        .filter_map(|(i, d)| {
            let scope = declares_own_scope(d, scopes_by_file)?;
            let tree = scopes_by_file.get(d.location.file.as_str())?;
            let parent = tree.get(scope)?.parent?;
            let parent_scope = tree.get(parent)?;
            if parent_scope.kind == crate::model::ScopeKind::Protocol {
                let owner = parent_scope.name.as_deref()?;
                Some(((owner, d.name.as_str()), i))
            } else {
                None
            }
        })
        .collect();

    if protocol_members.is_empty() {
        return;
    }

    for (i, decl) in result.declarations.iter().enumerate() {
        for conformance in &decl.type_conformances {
            if let Some(&req_idx) = protocol_members.get(&(conformance.as_str(), decl.name.as_str())) {
                edges[i].push(req_idx as u32);
                reverse_edges[req_idx].push(i as u32);
            }
        }
    }
}

/// Closures capture their enclosing declaration's locals; model that as an
/// edge from the enclosing declaration to anything the closure's body scope
/// references, so a used closure keeps its captures alive. Reference
/// resolution above already attributes closure-body references to the
/// nearest enclosing declaration, so this only needs to bridge distinct
/// declarations that share a closure scope in `by_owner_scope` — currently
/// a no-op placeholder because closures never own named declarations, kept
/// as an explicit extension point rather than folded away.
fn add_closure_capture_edges(_result: &AnalysisResult, _edges: &mut [Vec<u32>], _reverse_edges: &mut [Vec<u32>]) {}

fn collect_roots(result: &AnalysisResult, policy: &RootPolicy) -> Vec<u32> {
    let mut roots = Vec::new();
    for (i, decl) in result.declarations.iter().enumerate() {
        let is_root = decl.is_entry_point()
            || (policy.treat_public_as_root && decl.access_level >= crate::model::AccessLevel::Public)
            || (policy.treat_objc_as_root && decl.attributes.contains("objc"))
            || (policy.treat_tests_as_root && looks_like_test(decl))
            || (policy.treat_view_likes_as_root
                && is_view_like(&decl.type_conformances, crate::model::DEFAULT_VIEW_LIKE_CONFORMANCES))
            || decl.property_wrappers.iter().any(|w| w.kind.implies_usage());
        if is_root {
            roots.push(i as u32);
        }
    }
    roots.sort_unstable();
    roots.dedup();
    roots
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::model::*;
    use std::collections::HashSet as Set;

    fn decl(name: &str, kind: DeclarationKind, access: AccessLevel) -> Declaration {
        Declaration {
            name: name.to_string(),
            kind,
            access_level: access,
            modifiers: Set::new(),
            attributes: Set::new(),
            property_wrappers: Vec::new(),
            type_conformances: Set::new(),
            location: Location::new("a.swift", 1, 1, 0),
            range: SourceRange {
                start: Location::new("a.swift", 1, 1, 0),
                end: Location::new("a.swift", 1, 1, 0),
            },
            scope: ScopeId::GLOBAL,
            ignore_directives: Set::new(),
        }
    }

    #[test]
    fn public_declarations_are_roots_by_default() {
        let mut result = AnalysisResult::default();
        result.declarations.push(decl("foo", DeclarationKind::Function, AccessLevel::Public));
        result.declarations.push(decl("bar", DeclarationKind::Function, AccessLevel::Private));
        let graph = build(&result, &Config::default());
        assert_eq!(graph.roots, vec![0]);
    }

    #[test]
    fn private_enum_case_is_not_a_root_by_default() {
        let mut result = AnalysisResult::default();
        result
            .declarations
            .push(decl("case1", DeclarationKind::EnumCase, AccessLevel::Private));
        let graph = build(&result, &Config::default());
        assert!(graph.roots.is_empty());
    }

    #[test]
    fn public_enum_case_is_a_root() {
        let mut result = AnalysisResult::default();
        result
            .declarations
            .push(decl("case1", DeclarationKind::EnumCase, AccessLevel::Public));
        let graph = build(&result, &Config::default());
        assert_eq!(graph.roots, vec![0]);
    }
}
