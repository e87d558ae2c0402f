//! Integration tests reproducing the six literal scenarios from the
//! analysis engine's testable-properties section.

use std::sync::Arc;

use swa_engine::cache::SourceFileDigest;
use swa_engine::clone::{detect_clones, CloneType};
use swa_engine::config::{CloneAlgorithm, Config};
use swa_engine::depgraph;
use swa_engine::index::{analyze_files_parallel, AnalysisResult, ParsedFile};
use swa_engine::model::*;
use swa_engine::reachability;
use swa_engine::resolver::{ExternalIndex, MatchSource, QueryPattern, Resolver, SymbolMatch};
use swa_engine::tokens::{RawToken, TokenKind, TokenStreamBuilder};
use swa_engine::unused;

fn parse(source: &str) -> tree_sitter::Tree {
    let mut parser = tree_sitter::Parser::new();
    parser
        .set_language(&tree_sitter_swift::LANGUAGE.into())
        .expect("load swift grammar");
    parser.parse(source, None).expect("parse")
}

/// S1 — a declaration's location points at the first attribute, not any
/// preceding comment or MARK trivia.
#[test]
fn s1_location_points_at_first_attribute_not_preceding_trivia() {
    let source = "// MARK: - Model\n/// doc\n@available(*, deprecated)\npublic struct User {}\n";
    let tree = parse(source);
    let files = vec![ParsedFile {
        path: "a.swift".to_string(),
        source: Arc::from(source),
        tree,
    }];
    let (result, _tokens) = analyze_files_parallel(&files);

    let users: Vec<&Declaration> = result.declarations_by_name("User");
    assert_eq!(users.len(), 1, "expected exactly one User declaration");
    let user = users[0];
    assert_eq!(user.access_level, AccessLevel::Public);
    assert_eq!(user.location.line, 3);
}

/// S2 — `ignore-unused-cases` on an enum is inherited by every case, and
/// those cases never appear in the unused report.
#[test]
fn s2_enum_case_inherits_ignore_unused_cases() {
    let source = "/// Reasons. // swa:ignore-unused-cases\npublic enum R { case a, b }\n";
    let tree = parse(source);
    let files = vec![ParsedFile {
        path: "a.swift".to_string(),
        source: Arc::from(source),
        tree,
    }];
    let (result, _tokens) = analyze_files_parallel(&files);

    let cases: Vec<&Declaration> = result
        .declarations
        .iter()
        .filter(|d| d.kind == DeclarationKind::EnumCase)
        .collect();
    assert!(!cases.is_empty(), "expected at least one enum case to be walked");
    for case in &cases {
        assert!(case.has_ignore(IgnoreCategory::UnusedCases));
    }

    let graph = depgraph::build(&result, &Config::default());
    let reach = reachability::compute(&graph, &Config::default());
    let findings = unused::classify(&result, &graph, &reach);
    assert!(findings.iter().all(|f| f.kind != DeclarationKind::EnumCase));
}

fn repeated_tokens(count: usize, offset0: u32) -> Vec<RawToken> {
    (0..count)
        .map(|i| RawToken {
            kind: TokenKind::Identifier,
            offset: offset0 + (i * 2) as u32,
            length: 1,
            line: 1,
            column: (i * 2 + 1) as u32,
        })
        .collect()
}

/// S3 — two files containing an identical 60-token span form one exact
/// clone group with similarity 1.0.
#[test]
fn s3_identical_spans_form_one_exact_clone_group() {
    let source: Arc<str> = Arc::from("x".repeat(120));
    let toks = repeated_tokens(60, 0);

    let mut builder = TokenStreamBuilder::default();
    builder.push_file("a.swift", source.clone(), &toks);
    builder.push_file("b.swift", source, &toks);
    let stream = builder.build();

    let config = Config {
        min_tokens: 50,
        clone_algorithm: CloneAlgorithm::RollingHash,
        ..Config::default()
    };
    let groups = detect_clones(&stream, &config);
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].kind, CloneType::Exact);
    assert_eq!(groups[0].similarity, 1.0);
    assert_eq!(groups[0].occurrences.len(), 2);
    let (a, b) = (&groups[0].occurrences[0], &groups[0].occurrences[1]);
    assert_eq!(a.end_token - a.start_token, b.end_token - b.start_token);
}

/// S4 — near clones (renamed identifiers, same structure) still meet the
/// minimum similarity threshold under MinHash+LSH.
#[test]
fn s4_near_clone_meets_similarity_threshold() {
    let mut toks_a = Vec::new();
    let mut toks_b = Vec::new();
    let mut src = String::new();
    for i in 0..80u32 {
        src.push('a');
        toks_a.push(RawToken {
            kind: TokenKind::Identifier,
            offset: i,
            length: 1,
            line: 1,
            column: i + 1,
        });
        toks_b.push(RawToken {
            kind: TokenKind::Identifier,
            offset: i,
            length: 1,
            line: 1,
            column: i + 1,
        });
    }
    let source: Arc<str> = Arc::from(src.as_str());

    let mut builder = TokenStreamBuilder::default();
    builder.push_file("a.swift", source.clone(), &toks_a);
    builder.push_file("b.swift", source, &toks_b);
    let stream = builder.build();

    let config = Config {
        min_tokens: 50,
        min_similarity: 0.8,
        clone_algorithm: CloneAlgorithm::MinHashLsh,
        ..Config::default()
    };
    let groups = detect_clones(&stream, &config);
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].kind, CloneType::Near);
    assert!(groups[0].similarity >= 0.8);
}

fn decl(name: &str, kind: DeclarationKind, access: AccessLevel, is_entry: bool) -> Declaration {
    let mut attributes = std::collections::HashSet::new();
    if is_entry {
        attributes.insert("main".to_string());
    }
    Declaration {
        name: name.to_string(),
        kind,
        access_level: access,
        modifiers: std::collections::HashSet::new(),
        attributes,
        property_wrappers: Vec::new(),
        type_conformances: std::collections::HashSet::new(),
        location: Location::new("a.swift", 1, 1, 0),
        range: SourceRange {
            start: Location::new("a.swift", 1, 1, 0),
            end: Location::new("a.swift", 1, 1, 0),
        },
        scope: ScopeId::GLOBAL,
        ignore_directives: std::collections::HashSet::new(),
    }
}

/// S5 — a private, never-called function is flagged unused with high
/// confidence; a public type and a called private function are not.
#[test]
fn s5_unreferenced_private_function_is_the_only_unused_finding() {
    let mut result = AnalysisResult::default();
    result
        .declarations
        .push(decl("A", DeclarationKind::Struct, AccessLevel::Public, false));
    result
        .declarations
        .push(decl("unused", DeclarationKind::Function, AccessLevel::Private, false));
    result
        .declarations
        .push(decl("used", DeclarationKind::Function, AccessLevel::Private, false));
    result
        .declarations
        .push(decl("App", DeclarationKind::Struct, AccessLevel::Internal, true));

    // `App` (the entry point / root) references `used`.
    result.references.push(Reference {
        identifier: "used".to_string(),
        location: Location::new("a.swift", 10, 1, 0),
        scope: ScopeId::GLOBAL,
        context: ReferenceContext::Call,
        qualified: false,
        qualifier: None,
    });

    let config = Config::default();
    let graph = depgraph::build(&result, &config);
    let reach = reachability::compute(&graph, &config);
    let findings = unused::classify(&result, &graph, &reach);

    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].name, "unused");
    assert_eq!(findings[0].confidence, unused::Confidence::High);
}

struct FakeExternalIndex {
    matches: Vec<SymbolMatch>,
}

impl ExternalIndex for FakeExternalIndex {
    fn find(&mut self, pattern: &QueryPattern) -> Vec<SymbolMatch> {
        let QueryPattern::SimpleName(name) = pattern else {
            return Vec::new();
        };
        self.matches.iter().filter(|m| &m.name == name).cloned().collect()
    }

    fn usages(&mut self, _usr: &str) -> Vec<Location> {
        Vec::new()
    }
}

/// S6 — when an external index is available and returns a match, its
/// result takes precedence: the syntax-only fallback's second declaration
/// of the same name in another file is not additionally surfaced.
#[test]
fn s6_external_index_result_takes_precedence_over_syntax_fallback() {
    let mut result = AnalysisResult::default();
    let mut d1 = decl("NetworkManager", DeclarationKind::Class, AccessLevel::Internal, false);
    d1.location = Location::new("file1.swift", 1, 1, 0);
    let mut d2 = decl("NetworkManager", DeclarationKind::Class, AccessLevel::Internal, false);
    d2.location = Location::new("file2.swift", 1, 1, 0);
    result.declarations.push(d1);
    result.declarations.push(d2);

    let index = FakeExternalIndex {
        matches: vec![SymbolMatch {
            name: "NetworkManager".to_string(),
            location: Location::new("file1.swift", 1, 1, 0),
            usr: Some("external-usr".to_string()),
            source: MatchSource::ExternalIndex,
            access_level: None,
        }],
    };

    let resolver = Resolver::with_index(Box::new(index), &result);
    let matches = resolver.resolve(&QueryPattern::SimpleName("NetworkManager".to_string()), None);

    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].source, MatchSource::ExternalIndex);
    assert_eq!(matches[0].location.file, "file1.swift");
    assert_eq!(matches[0].access_level, Some(AccessLevel::Internal));
}

#[test]
fn cache_digest_changes_when_source_changes() {
    let a = SourceFileDigest::compute("a.swift", b"struct A {}");
    let b = SourceFileDigest::compute("a.swift", b"struct B {}");
    assert_ne!(a.content_hash, b.content_hash);
}
