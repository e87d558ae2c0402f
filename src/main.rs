//! swa-engine CLI entry point.

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{info, warn};

use swa_engine::cli::{Cli, Command};
use swa_engine::config::Config;
use swa_engine::index::{analyze_files_parallel, ParsedFile};
use swa_engine::resolver::{QueryPattern, Resolver};
use swa_engine::{cache, depgraph, parsing, reachability, unused, Error, Result};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            e.exit_code()
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_level.into()),
        )
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    let mut config = Config::default();
    config.min_tokens = cli.min_tokens;
    if let Command::Clones { algorithm, min_similarity } = &cli.command {
        config.clone_algorithm = (*algorithm).into();
        config.min_similarity = *min_similarity;
    }
    if let Command::Unused { no_public_roots, no_test_roots } = &cli.command {
        config.root_policy.treat_public_as_root = !no_public_roots;
        config.root_policy.treat_tests_as_root = !no_test_roots;
    }
    config.validate()?;

    let files = discover_files(&cli.project)?;
    info!("discovered {} Swift source files", files.len());

    let cache_path = cache::entry_path(&cli.project, "analysis");
    let digests: Vec<cache::SourceFileDigest> = files
        .iter()
        .map(|f| cache::SourceFileDigest::compute(&f.path, f.source.as_bytes()))
        .collect();

    if !cli.no_cache {
        if let Ok(Some(entry)) = cache::load::<()>(&cache_path) {
            if entry.is_fresh(&digests) {
                info!("cache hit, but swa-engine recomputes in-memory state regardless of a fresh sidecar");
            }
        }
    }

    let (result, tokens) = analyze_files_parallel(&files);

    if !cli.no_cache {
        let entry = cache::CacheEntry::new(digests, (), chrono::Utc::now().to_rfc3339());
        if let Err(e) = cache::store(&cache_path, &entry) {
            warn!("failed to persist analysis cache: {e}");
        }
    }

    match &cli.command {
        Command::Clones { .. } => {
            let groups = swa_engine::clone::detect_clones(&tokens, &config);
            print_json(&groups)
        }
        Command::Unused { .. } => {
            let graph = depgraph::build(&result, &config);
            let reachability = reachability::compute(&graph, &config);
            let findings = unused::classify(&result, &graph, &reachability);
            print_json(&findings)
        }
        Command::FindSymbol { name, regex, limit } => {
            let pattern = if *regex {
                QueryPattern::Regex(name.clone())
            } else {
                QueryPattern::SimpleName(name.clone())
            };
            let resolver = Resolver::syntax_only(&result);
            let matches = resolver.resolve(&pattern, *limit);
            print_json(&matches)
        }
    }

    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{s}"),
        Err(e) => eprintln!("failed to serialize output: {e}"),
    }
}

fn discover_files(project_root: &Path) -> Result<Vec<ParsedFile>> {
    let mut out = Vec::new();
    let walker = ignore::WalkBuilder::new(project_root).build();
    for entry in walker {
        let entry = entry.map_err(|e| Error::Io {
            path: project_root.display().to_string(),
            source: std::io::Error::new(std::io::ErrorKind::Other, e.to_string()),
        })?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("swift") {
            continue;
        }
        let bytes = std::fs::read(path).map_err(|source| Error::Io {
            path: path.display().to_string(),
            source,
        })?;
        let source = String::from_utf8_lossy(&bytes).into_owned();
        let tree = parsing::parse_source(path, &source)?;
        out.push(ParsedFile {
            path: path.display().to_string(),
            source: Arc::from(source),
            tree,
        });
    }
    Ok(out)
}
