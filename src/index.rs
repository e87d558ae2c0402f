//! Index aggregator (C3): merges per-file walker output into a
//! project-wide, read-only [`AnalysisResult`].
//!
//! Merging is purely additive — no cross-file resolution happens here,
//! so files can be walked in any order or in parallel (see
//! `analyze_files_parallel`). Declarations are immutable once inserted;
//! readers sort at read time rather than the aggregator mutating on insert.

use std::collections::HashMap;
use std::sync::Arc;

use rayon::prelude::*;
use tree_sitter::Tree;

use crate::model::{Declaration, Reference, ScopeTree};
use crate::tokens::{TokenStream, TokenStreamBuilder};
use crate::walker::{walk_file, FileAccumulator};

/// One source file to ingest: a path, its UTF-8 bytes, and its parsed tree.
/// The tree is a collaborator supplied by the caller — this crate does not
/// parse files itself outside of `parsing::parse_file`.
pub struct ParsedFile {
    pub path: String,
    pub source: Arc<str>,
    pub tree: Tree,
}

/// Project-wide, read-only analysis result.
#[derive(Debug, Default)]
pub struct AnalysisResult {
    pub declarations: Vec<Declaration>,
    pub references: Vec<Reference>,
    /// One scope tree per file, keyed by file path (scope ids are only
    /// unique within a file).
    pub scopes: HashMap<String, ScopeTree>,
    pub files: Vec<String>,
    pub imports: Vec<String>,
}

impl AnalysisResult {
    /// Declarations sorted by `(file, line, column)`; never mutates self.
    pub fn declarations_sorted(&self) -> Vec<&Declaration> {
        let mut out: Vec<&Declaration> = self.declarations.iter().collect();
        out.sort_by(|a, b| a.location.cmp(&b.location));
        out
    }

    pub fn declarations_by_name(&self, name: &str) -> Vec<&Declaration> {
        self.declarations.iter().filter(|d| d.name == name).collect()
    }

    pub fn references_by_identifier(&self, identifier: &str) -> Vec<&Reference> {
        self.references
            .iter()
            .filter(|r| r.identifier == identifier)
            .collect()
    }

    fn merge(&mut self, acc: FileAccumulator) {
        self.files.push(acc.file.clone());
        self.imports.extend(acc.imports);
        self.declarations.extend(acc.declarations);
        self.references.extend(acc.references);
        self.scopes.insert(acc.file, acc.scopes);
    }
}

/// Walk every file once (in parallel via `rayon`) and merge the results in
/// input order, so the merge step itself needs no cross-file
/// synchronization.
pub fn analyze_files_parallel(files: &[ParsedFile]) -> (AnalysisResult, TokenStream) {
    let accumulators: Vec<FileAccumulator> = files
        .par_iter()
        .map(|f| walk_file(&f.path, &f.source, &f.tree))
        .collect();

    let mut result = AnalysisResult::default();
    let mut token_builder = TokenStreamBuilder::default();

    for (file, acc) in files.iter().zip(accumulators) {
        token_builder.push_file(file.path.clone(), file.source.clone(), &acc.tokens);
        result.merge(acc);
    }

    (result, token_builder.build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tree_sitter::Parser;

    fn parse(source: &str) -> Tree {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_swift::LANGUAGE.into())
            .expect("load swift grammar");
        parser.parse(source, None).expect("parse")
    }

    #[test]
    fn merge_is_additive_and_order_independent() {
        let files = vec![
            ParsedFile {
                path: "a.swift".into(),
                source: Arc::from("public func a() {}"),
                tree: parse("public func a() {}"),
            },
            ParsedFile {
                path: "b.swift".into(),
                source: Arc::from("public func b() {}"),
                tree: parse("public func b() {}"),
            },
        ];

        let (result, _tokens) = analyze_files_parallel(&files);
        assert_eq!(result.files.len(), 2);
        assert!(result.declarations_by_name("a").len() == 1 || result.declarations_by_name("b").len() == 1);
    }

    #[test]
    fn declarations_sorted_orders_by_file_then_location() {
        let mut result = AnalysisResult::default();
        let mut acc_b = FileAccumulator {
            file: "b.swift".into(),
            scopes: ScopeTree::new(),
            ..Default::default()
        };
        let mut acc_a = FileAccumulator {
            file: "a.swift".into(),
            scopes: ScopeTree::new(),
            ..Default::default()
        };
        use crate::model::{AccessLevel, DeclarationKind, Location, ScopeId, SourceRange};
        use std::collections::HashSet;

        let mk = |file: &str, line: usize| Declaration {
            name: "x".into(),
            kind: DeclarationKind::Function,
            access_level: AccessLevel::Internal,
            modifiers: HashSet::new(),
            attributes: HashSet::new(),
            property_wrappers: Vec::new(),
            type_conformances: HashSet::new(),
            location: Location::new(file, line, 1, 0),
            range: SourceRange {
                start: Location::new(file, line, 1, 0),
                end: Location::new(file, line, 1, 0),
            },
            scope: ScopeId::GLOBAL,
            ignore_directives: HashSet::new(),
        };

        acc_b.declarations.push(mk("b.swift", 1));
        acc_a.declarations.push(mk("a.swift", 5));
        result.merge(acc_b);
        result.merge(acc_a);

        let sorted = result.declarations_sorted();
        assert_eq!(sorted[0].location.file, "a.swift");
        assert_eq!(sorted[1].location.file, "b.swift");
    }
}
