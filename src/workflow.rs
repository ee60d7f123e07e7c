use crate::{cli, clipboard, source, tui};
use anyhow::{Context, Result};
use sharepick::{BuildEvent, BuildSupervisor, EngineConfig, PathTree, SelectionTree, seed_selection};
use std::fs;
use tracing::{debug, info, warn};

// Reads previously written `share` lines, if the user pointed at a file.
fn read_existing_directives(cli_args: &cli::Cli) -> Result<Vec<String>> {
    let Some(path) = &cli_args.existing else {
        return Ok(Vec::new());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read existing directives {}", path.display()))?;
    Ok(text.lines().map(str::to_string).collect())
}

// Builds the tree on the worker thread and blocks until it reports back.
fn build_tree_blocking(paths: Vec<String>, config: &EngineConfig) -> Result<PathTree> {
    let mut builds = BuildSupervisor::new();
    builds.start(paths, config.progress_every);
    loop {
        match builds.wait() {
            Some(BuildEvent::Progress(p)) => {
                debug!(processed = p.processed, total = p.total, "building path tree");
            }
            Some(BuildEvent::Completed(tree)) => return Ok(tree),
            Some(BuildEvent::Failed(err)) => {
                return Err(err).context("could not build the path tree");
            }
            None => anyhow::bail!("path tree build ended without a result"),
        }
    }
}

// "." and "" both name the stream root.
fn normalize_select(path: &str) -> &str {
    match path.trim_end_matches('/') {
        "." => "",
        other => other,
    }
}

// Applies --select paths on top of any existing selection, no UI involved.
fn run_headless_mode(
    cli_args: &cli::Cli,
    paths: Vec<String>,
    existing: &[String],
    config: EngineConfig,
) -> Result<Vec<String>> {
    let tree = build_tree_blocking(paths, &config)?;
    let (selection, skipped) = seed_selection(&tree, existing.iter().map(String::as_str));
    for line in &skipped {
        warn!(line = %line, "existing directive does not match the path list; dropped");
    }

    let mut engine = SelectionTree::with_selection(tree, selection, config);
    let batch = cli_args
        .select
        .iter()
        .map(|p| (normalize_select(p), true));
    engine.apply(batch).context("invalid --select path")?;

    let lines = engine.directive_lines();
    info!(directives = lines.len(), "compiled selection");
    Ok(lines)
}

// Prints the lines, or hands them to the clipboard with --copy.
fn perform_final_action(lines: &[String], copy: bool) -> Result<()> {
    if !copy {
        for line in lines {
            println!("{line}");
        }
        return Ok(());
    }
    if lines.is_empty() {
        anyhow::bail!("nothing selected; clipboard left untouched");
    }
    clipboard::copy_directives(lines)?;
    println!("✅ Copied {} share directives to the clipboard.", lines.len());
    Ok(())
}

/// Main orchestrator: load the path list, select, emit directives.
pub fn run_sharepick(cli_args: cli::Cli) -> Result<()> {
    let paths = source::load_paths(&cli_args)?;
    let existing = read_existing_directives(&cli_args)?;
    let config = cli_args.engine_config();

    let lines = if cli_args.headless {
        run_headless_mode(&cli_args, paths, &existing, config)?
    } else {
        match tui::run_tui(paths, existing, config)? {
            Some(lines) => lines,
            None => {
                println!("Selection cancelled");
                return Ok(());
            }
        }
    };

    perform_final_action(&lines, cli_args.copy)
}
