//! Unused classifier (C8): turns reachability results into findings a user
//! can act on, applying ignore directives and SwiftUI-specific exclusions
//! reachability alone doesn't know about.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::depgraph::{declares_own_scope, DependencyGraph};
use crate::index::AnalysisResult;
use crate::model::{AccessLevel, Declaration, DeclarationKind, IgnoreCategory, Location, ReferenceContext, ScopeTree};
use crate::reachability::ReachabilityResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Confidence {
    Low,
    Medium,
    High,
}

/// Why a declaration was flagged, computed from its references rather than
/// a free-form message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UnusedReason {
    NeverReferenced,
    OnlyAssigned,
    OnlySelfReferenced,
    ImportNotUsed,
    ParameterUnused,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnusedFinding {
    pub name: String,
    pub kind: DeclarationKind,
    pub location: Location,
    pub reason: UnusedReason,
    pub confidence: Confidence,
    pub suggestion: String,
}

fn suggestion_for(kind: DeclarationKind) -> &'static str {
    match kind {
        DeclarationKind::Function | DeclarationKind::Method => "remove the function if no external caller depends on it",
        DeclarationKind::Initializer => "remove the initializer if no caller constructs the type this way",
        DeclarationKind::Variable | DeclarationKind::Constant => "remove the binding, or inline its value at the single use site",
        DeclarationKind::Parameter => "remove the parameter and update all call sites",
        DeclarationKind::Class | DeclarationKind::Struct | DeclarationKind::Enum => "remove the type if nothing constructs or references it",
        DeclarationKind::EnumCase => "remove the case, checking exhaustive switches at call sites",
        DeclarationKind::Protocol => "remove the protocol if nothing conforms to or calls through it",
        DeclarationKind::Extension => "remove the extension if none of its members are used",
        DeclarationKind::TypeAlias => "remove the alias and replace usages with the underlying type",
        DeclarationKind::Import => "remove the unused import",
    }
}

/// Pure function of access level: narrower visibility means a missing
/// reference is more likely to be real, so confidence runs
/// `private|fileprivate` (high) > `internal|package` (medium) >
/// `public|open` (low). Imports have no meaningful access level and are
/// always reported at low confidence.
fn confidence_for(decl: &Declaration) -> Confidence {
    if decl.kind == DeclarationKind::Import {
        return Confidence::Low;
    }
    match decl.access_level {
        AccessLevel::Private | AccessLevel::FilePrivate => Confidence::High,
        AccessLevel::Internal | AccessLevel::Package => Confidence::Medium,
        AccessLevel::Public | AccessLevel::Open => Confidence::Low,
    }
}

/// All references whose identifier names `decl`, under the same name-based
/// approximation the dependency graph itself uses.
fn references_to<'a>(result: &'a AnalysisResult, decl: &Declaration) -> Vec<&'a crate::model::Reference> {
    result
        .references
        .iter()
        .filter(|r| r.identifier == decl.name)
        .collect()
}

/// Whether every reference in `refs` is textually nested inside `decl`'s own
/// body scope — a declaration (typically recursive) that only refers to
/// itself and is never reached from anywhere else.
fn all_self_referenced(
    decl: &Declaration,
    refs: &[&crate::model::Reference],
    scopes_by_file: &HashMap<&str, &ScopeTree>,
) -> bool {
    if refs.is_empty() {
        return false;
    }
    let Some(own_scope) = declares_own_scope(decl, scopes_by_file) else {
        return false;
    };
    refs.iter().all(|r| {
        scopes_by_file
            .get(decl.location.file.as_str())
            .is_some_and(|tree| tree.chain(r.scope).contains(&own_scope))
    })
}

/// Determine `reason` from the declaration's references: writes with no
/// reads mean it's assigned but never consulted, references confined to its
/// own body mean it only ever calls itself, otherwise fall back to the
/// declaration kind (`parameterUnused`, `importNotUsed`) or, absent any of
/// those signals, a plain `neverReferenced`.
fn reason_for(
    decl: &Declaration,
    refs: &[&crate::model::Reference],
    scopes_by_file: &HashMap<&str, &ScopeTree>,
) -> UnusedReason {
    if !refs.is_empty() {
        if refs.iter().all(|r| r.context == ReferenceContext::Write) {
            return UnusedReason::OnlyAssigned;
        }
        if all_self_referenced(decl, refs, scopes_by_file) {
            return UnusedReason::OnlySelfReferenced;
        }
    }
    match decl.kind {
        DeclarationKind::Parameter => UnusedReason::ParameterUnused,
        DeclarationKind::Import => UnusedReason::ImportNotUsed,
        _ => UnusedReason::NeverReferenced,
    }
}

/// Classify unreachable declarations into findings, honoring ignore
/// directives and the enum-case-specific `ignore-unused-cases`
/// inheritance the walker already resolved per-declaration.
pub fn classify(
    result: &AnalysisResult,
    graph: &DependencyGraph,
    reachability: &ReachabilityResult,
) -> Vec<UnusedFinding> {
    let _ = graph; // reachability already folds the graph in; kept for API symmetry with depgraph callers
    let mut findings = Vec::new();

    let scopes_by_file: HashMap<&str, &ScopeTree> =
        result.scopes.iter().map(|(f, t)| (f.as_str(), t)).collect();

    for (i, decl) in result.declarations.iter().enumerate() {
        if reachability.is_reachable(i) {
            continue;
        }
        if decl.kind == DeclarationKind::EnumCase {
            if decl.has_ignore(IgnoreCategory::UnusedCases) {
                continue;
            }
        } else if decl.has_ignore(IgnoreCategory::Unused) {
            continue;
        }
        if decl.property_wrappers.iter().any(|w| w.kind.implies_usage()) {
            continue;
        }

        let refs = references_to(result, decl);

        findings.push(UnusedFinding {
            name: decl.name.clone(),
            kind: decl.kind,
            location: decl.location.clone(),
            reason: reason_for(decl, &refs, &scopes_by_file),
            confidence: confidence_for(decl),
            suggestion: suggestion_for(decl.kind).to_string(),
        });
    }

    findings.sort_by(|a, b| {
        b.confidence
            .cmp(&a.confidence)
            .then_with(|| a.location.cmp(&b.location))
    });
    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::model::*;
    use std::collections::HashSet as Set;

    fn decl(name: &str, kind: DeclarationKind, ignore: Set<IgnoreCategory>) -> Declaration {
        Declaration {
            name: name.to_string(),
            kind,
            access_level: AccessLevel::Internal,
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
            ignore_directives: ignore,
        }
    }

    #[test]
    fn unreachable_declaration_without_ignore_is_flagged() {
        let mut result = AnalysisResult::default();
        result.declarations.push(decl("helper", DeclarationKind::Function, Set::new()));
        let graph = crate::depgraph::build(&result, &Config::default());
        let reachability = crate::reachability::compute(&graph, &Config::default());
        let findings = classify(&result, &graph, &reachability);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].name, "helper");
    }

    #[test]
    fn ignore_unused_directive_suppresses_the_finding() {
        let mut result = AnalysisResult::default();
        let mut ignore = Set::new();
        ignore.insert(IgnoreCategory::Unused);
        result
            .declarations
            .push(decl("helper", DeclarationKind::Function, ignore));
        let graph = crate::depgraph::build(&result, &Config::default());
        let reachability = crate::reachability::compute(&graph, &Config::default());
        let findings = classify(&result, &graph, &reachability);
        assert!(findings.is_empty());
    }

    #[test]
    fn reachable_public_root_is_never_flagged() {
        let mut result = AnalysisResult::default();
        result.declarations.push(decl("Entry", DeclarationKind::Function, Set::new()));
        result.declarations[0].access_level = AccessLevel::Public;
        let graph = crate::depgraph::build(&result, &Config::default());
        let reachability = crate::reachability::compute(&graph, &Config::default());
        let findings = classify(&result, &graph, &reachability);
        assert!(findings.is_empty());
    }

    #[test]
    fn confidence_is_a_pure_function_of_access_level() {
        let mut d = decl("x", DeclarationKind::Function, Set::new());
        d.access_level = AccessLevel::Private;
        assert_eq!(confidence_for(&d), Confidence::High);
        d.access_level = AccessLevel::FilePrivate;
        assert_eq!(confidence_for(&d), Confidence::High);
        d.access_level = AccessLevel::Internal;
        assert_eq!(confidence_for(&d), Confidence::Medium);
        d.access_level = AccessLevel::Package;
        assert_eq!(confidence_for(&d), Confidence::Medium);
        d.access_level = AccessLevel::Public;
        assert_eq!(confidence_for(&d), Confidence::Low);
        d.access_level = AccessLevel::Open;
        assert_eq!(confidence_for(&d), Confidence::Low);
    }

    #[test]
    fn attributes_no_longer_override_confidence() {
        let mut d = decl("x", DeclarationKind::Function, Set::new());
        d.access_level = AccessLevel::Private;
        d.attributes.insert("objc".to_string());
        assert_eq!(confidence_for(&d), Confidence::High);
    }

    #[test]
    fn unused_import_is_reported_with_import_not_used_reason() {
        let mut result = AnalysisResult::default();
        result
            .declarations
            .push(decl("Combine", DeclarationKind::Import, Set::new()));
        let graph = crate::depgraph::build(&result, &Config::default());
        let reachability = crate::reachability::compute(&graph, &Config::default());
        let findings = classify(&result, &graph, &reachability);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].reason, UnusedReason::ImportNotUsed);
        assert_eq!(findings[0].confidence, Confidence::Low);
    }

    #[test]
    fn never_referenced_declaration_gets_that_reason() {
        let mut result = AnalysisResult::default();
        result
            .declarations
            .push(decl("helper", DeclarationKind::Function, Set::new()));
        let graph = crate::depgraph::build(&result, &Config::default());
        let reachability = crate::reachability::compute(&graph, &Config::default());
        let findings = classify(&result, &graph, &reachability);
        assert_eq!(findings[0].reason, UnusedReason::NeverReferenced);
    }

    #[test]
    fn write_only_references_yield_only_assigned_reason() {
        // The write lives inside `App`'s body, not at the top level, so it
        // doesn't trip the "referenced from outside the graph" root marker
        // and `count` stays reachable only through `App`, which is itself
        // unreachable here.
        let mut result = AnalysisResult::default();
        let mut tree = ScopeTree::new();
        let range = SourceRange {
            start: Location::new("a.swift", 1, 1, 0),
            end: Location::new("a.swift", 1, 1, 0),
        };
        let app_body = tree.insert(ScopeKind::Function, Some("App".to_string()), Some(ScopeId::GLOBAL), range);
        result.scopes.insert("a.swift".to_string(), tree);

        result.declarations.push(decl("App", DeclarationKind::Function, Set::new()));
        result
            .declarations
            .push(decl("count", DeclarationKind::Variable, Set::new()));
        result.references.push(Reference {
            identifier: "count".to_string(),
            location: Location::new("a.swift", 5, 1, 0),
            scope: app_body,
            context: ReferenceContext::Write,
            qualified: false,
            qualifier: None,
        });
        let graph = crate::depgraph::build(&result, &Config::default());
        let reachability = crate::reachability::compute(&graph, &Config::default());
        let findings = classify(&result, &graph, &reachability);
        let count_finding = findings.iter().find(|f| f.name == "count").expect("count flagged");
        assert_eq!(count_finding.reason, UnusedReason::OnlyAssigned);
    }

    #[test]
    fn unused_parameter_gets_parameter_unused_reason() {
        let mut result = AnalysisResult::default();
        result
            .declarations
            .push(decl("callback", DeclarationKind::Parameter, Set::new()));
        let graph = crate::depgraph::build(&result, &Config::default());
        let reachability = crate::reachability::compute(&graph, &Config::default());
        let findings = classify(&result, &graph, &reachability);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].reason, UnusedReason::ParameterUnused);
    }
}
