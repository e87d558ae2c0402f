//! Thin wrapper around the syntax-tree provider.
//!
//! The provider itself — grammar, trivia attachment, error recovery — is a
//! collaborator outside this crate's scope; this module just owns the
//! `tree_sitter::Parser` lifecycle the way the rest of the pipeline expects
//! to consume it (see `index::ParsedFile`).

use std::path::Path;
use std::sync::Arc;

use tree_sitter::{Parser, Tree};

use crate::error::{Error, Result};
use crate::index::ParsedFile;

/// Parse `source` as Swift. Parse errors are never fatal: the provider
/// yields a best-effort tree even with syntax errors, and callers
/// downstream (the walker) extract what they can from it. This function
/// only returns `Err` if the grammar itself could not be loaded or
/// tree-sitter refused to produce any tree at all (e.g. cancelled mid-parse).
pub fn parse_source(path: &Path, source: &str) -> Result<Tree> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_swift::LANGUAGE.into())
        .map_err(|e| Error::Parse {
            path: path.display().to_string(),
            message: format!("failed to load Swift grammar: {e}"),
        })?;

    parser.parse(source, None).ok_or_else(|| Error::Parse {
        path: path.display().to_string(),
        message: "parser returned no tree".to_string(),
    })
}

/// Read, parse, and wrap one file as a [`ParsedFile`] ready for
/// `index::analyze_files_parallel`.
pub fn parse_file(path: &Path) -> Result<ParsedFile> {
    let bytes = std::fs::read(path).map_err(|source| Error::Io {
        path: path.display().to_string(),
        source,
    })?;
    let source = String::from_utf8_lossy(&bytes).into_owned();
    let tree = parse_source(path, &source)?;

    Ok(ParsedFile {
        path: path.display().to_string(),
        source: Arc::from(source),
        tree,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_function() {
        let tree = parse_source(Path::new("a.swift"), "func f() {}").unwrap();
        assert!(!tree.root_node().has_error());
    }

    #[test]
    fn parse_errors_are_not_fatal() {
        // Tree-sitter is error-tolerant; malformed input still yields a tree.
        let tree = parse_source(Path::new("a.swift"), "func f( {{{").unwrap();
        let _ = tree.root_node();
    }
}
