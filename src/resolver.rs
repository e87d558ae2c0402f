//! Symbol resolver (C9): looks up declarations by name pattern, preferring
//! an external compiler index when one is wired in and falling back to the
//! in-memory syntax-based analysis result otherwise.

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex as StdMutex;

use crate::index::AnalysisResult;
use crate::model::{AccessLevel, Declaration, Location};

#[derive(Debug, Clone)]
pub enum QueryPattern {
    SimpleName(String),
    QualifiedName { owner: String, name: String },
    Selector(String),
    QualifiedSelector { owner: String, selector: String },
    Usr(String),
    Regex(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolMatch {
    pub name: String,
    pub location: Location,
    pub usr: Option<String>,
    pub source: MatchSource,
    /// An external index typically has no notion of source-level access
    /// control, so its hits start with `None` here and are enriched from
    /// `AnalysisResult` before being returned; syntax-resolved matches
    /// always carry it directly from the declaration.
    pub access_level: Option<AccessLevel>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchSource {
    ExternalIndex,
    Syntax,
}

/// An external compiler/semantic index (e.g. a SourceKit-backed symbol
/// database). Not `Sync` in general implementations — index libraries like
/// this are typically wrapped behind a single-threaded FFI handle, hence the
/// `Mutex` at the call site rather than requiring `Sync` here.
pub trait ExternalIndex {
    fn find(&mut self, pattern: &QueryPattern) -> Vec<SymbolMatch>;
    fn usages(&mut self, usr: &str) -> Vec<Location>;
}

pub enum Resolver<'a> {
    /// External index takes precedence; falls back to `fallback` for
    /// anything the index doesn't cover.
    Index {
        index: Mutex<Box<dyn ExternalIndex + Send>>,
        fallback: &'a AnalysisResult,
    },
    Syntax(&'a AnalysisResult),
}

impl<'a> Resolver<'a> {
    pub fn syntax_only(result: &'a AnalysisResult) -> Self {
        Resolver::Syntax(result)
    }

    pub fn with_index(index: Box<dyn ExternalIndex + Send>, fallback: &'a AnalysisResult) -> Self {
        Resolver::Index {
            index: Mutex::new(index),
            fallback,
        }
    }

    /// Resolve `pattern`, deduped, optionally limited, and sorted by
    /// location. The external index takes full precedence per query: if it
    /// returns any match at all, the syntax-based fallback is not consulted
    /// for that query, though its hits are still enriched with an
    /// access level read from the matching source declaration, since the
    /// index itself has no notion of one. Only when the index comes back
    /// empty does syntax resolution run, so a project's syntax-only
    /// declarations are still findable when the index simply doesn't know
    /// about them.
    pub fn resolve(&self, pattern: &QueryPattern, limit: Option<usize>) -> Vec<SymbolMatch> {
        let mut matches = match self {
            Resolver::Index { index, fallback } => {
                let index_matches = index.lock().find(pattern);
                if index_matches.is_empty() {
                    resolve_syntax(fallback, pattern)
                } else {
                    enrich_access_levels(fallback, index_matches)
                }
            }
            Resolver::Syntax(result) => resolve_syntax(result, pattern),
        };

        dedup_matches(&mut matches);
        matches.sort_by(|a, b| a.location.cmp(&b.location));
        if let Some(limit) = limit {
            matches.truncate(limit);
        }
        matches
    }

    /// All reference locations for a resolved symbol's USR, preferring the
    /// external index and only falling back to syntax-based references
    /// when the index has nothing for this USR.
    pub fn usages(&self, decl: &Declaration) -> Vec<Location> {
        match self {
            Resolver::Index { index, fallback } => {
                if let Some(usr) = synthesize_usr(decl) {
                    let locs = index.lock().usages(&usr);
                    if !locs.is_empty() {
                        return locs;
                    }
                }
                syntax_usages(fallback, &decl.name)
            }
            Resolver::Syntax(result) => syntax_usages(result, &decl.name),
        }
    }
}

/// Fill in `access_level` on external-index hits that don't already carry
/// one, from the source declaration at the same location — the index
/// itself has no notion of source-level access control.
fn enrich_access_levels(result: &AnalysisResult, matches: Vec<SymbolMatch>) -> Vec<SymbolMatch> {
    matches
        .into_iter()
        .map(|mut m| {
            if m.access_level.is_none() {
                m.access_level = result
                    .declarations
                    .iter()
                    .find(|d| d.location == m.location)
                    .map(|d| d.access_level);
            }
            m
        })
        .collect()
}

fn dedup_matches(matches: &mut Vec<SymbolMatch>) {
    let mut seen = std::collections::HashSet::new();
    matches.retain(|m| seen.insert((m.location.file.clone(), m.location.line, m.location.column)));
}

fn syntax_usages(result: &AnalysisResult, name: &str) -> Vec<Location> {
    result
        .references_by_identifier(name)
        .into_iter()
        .map(|r| r.location.clone())
        .collect()
}

/// There is no real compiler-derived USR available in syntax-only mode;
/// this synthesizes a stable stand-in from file+name+kind so `usages`
/// still has a join key. A deliberate heuristic, not a real USR.
fn synthesize_usr(decl: &Declaration) -> Option<String> {
    Some(format!("swa-usr:{}:{:?}:{}", decl.location.file, decl.kind, decl.name))
}

fn resolve_syntax(result: &AnalysisResult, pattern: &QueryPattern) -> Vec<SymbolMatch> {
    match pattern {
        QueryPattern::SimpleName(name) => result
            .declarations_by_name(name)
            .into_iter()
            .map(to_match)
            .collect(),
        QueryPattern::QualifiedName { owner, name } => result
            .declarations
            .iter()
            .filter(|d| &d.name == name && declared_under(result, d, owner))
            .map(to_match)
            .collect(),
        QueryPattern::Selector(selector) => result
            .declarations
            .iter()
            .filter(|d| selector_matches(d, selector))
            .map(to_match)
            .collect(),
        QueryPattern::QualifiedSelector { owner, selector } => result
            .declarations
            .iter()
            .filter(|d| selector_matches(d, selector) && declared_under(result, d, owner))
            .map(to_match)
            .collect(),
        QueryPattern::Usr(usr) => result
            .declarations
            .iter()
            .filter(|d| synthesize_usr(d).as_deref() == Some(usr.as_str()))
            .map(to_match)
            .collect(),
        QueryPattern::Regex(pattern) => match compiled_regex(pattern) {
            Some(re) => result
                .declarations
                .iter()
                .filter(|d| re.is_match(&d.name))
                .map(to_match)
                .collect(),
            None => Vec::new(),
        },
    }
}

/// Process-wide cache of compiled `regex()` query patterns, keyed by the raw
/// pattern string. A `find-symbol --regex` run typically repeats the same
/// pattern across many declarations, so recompiling per call would be pure
/// waste; `None` entries record patterns that failed to compile so a bad
/// pattern doesn't get retried on every lookup either.
static REGEX_CACHE: Lazy<StdMutex<HashMap<String, Option<Regex>>>> = Lazy::new(|| StdMutex::new(HashMap::new()));

fn compiled_regex(pattern: &str) -> Option<Regex> {
    let mut cache = REGEX_CACHE.lock().expect("regex cache mutex poisoned");
    cache
        .entry(pattern.to_string())
        .or_insert_with(|| Regex::new(pattern).ok())
        .clone()
}

fn selector_matches(decl: &Declaration, selector: &str) -> bool {
    // A selector like `foo(bar:)` matches by prefix of the declaration name
    // up to the first `(`, which is as close as syntax-only resolution gets
    // to Objective-C-style selector matching without parameter labels.
    let base = selector.split('(').next().unwrap_or(selector);
    decl.name == base || decl.name == selector
}

fn declared_under(result: &AnalysisResult, decl: &Declaration, owner: &str) -> bool {
    let Some(tree) = result.scopes.get(&decl.location.file) else {
        return false;
    };
    tree.chain(decl.scope)
        .iter()
        .any(|&s| tree.get(s).and_then(|sc| sc.name.as_deref()) == Some(owner))
}

fn to_match(decl: &Declaration) -> SymbolMatch {
    SymbolMatch {
        name: decl.name.clone(),
        location: decl.location.clone(),
        usr: synthesize_usr(decl),
        source: MatchSource::Syntax,
        access_level: Some(decl.access_level),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::*;
    use std::collections::HashSet as Set;

    fn decl(name: &str) -> Declaration {
        Declaration {
            name: name.to_string(),
            kind: DeclarationKind::Function,
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
            ignore_directives: Set::new(),
        }
    }

    #[test]
    fn simple_name_lookup_finds_syntax_declaration() {
        let mut result = AnalysisResult::default();
        result.declarations.push(decl("foo"));
        let resolver = Resolver::syntax_only(&result);
        let matches = resolver.resolve(&QueryPattern::SimpleName("foo".to_string()), None);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].source, MatchSource::Syntax);
    }

    #[test]
    fn regex_pattern_filters_by_name() {
        let mut result = AnalysisResult::default();
        result.declarations.push(decl("fetchUser"));
        result.declarations.push(decl("saveUser"));
        let resolver = Resolver::syntax_only(&result);
        let matches = resolver.resolve(&QueryPattern::Regex("^fetch".to_string()), None);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].name, "fetchUser");
    }

    #[test]
    fn limit_truncates_sorted_results() {
        let mut result = AnalysisResult::default();
        result.declarations.push(decl("a"));
        result.declarations.push(decl("a"));
        let resolver = Resolver::syntax_only(&result);
        let matches = resolver.resolve(&QueryPattern::SimpleName("a".to_string()), Some(1));
        assert_eq!(matches.len(), 1);
    }
}
