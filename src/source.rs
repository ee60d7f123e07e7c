use anyhow::{Context, Result};
use ignore::WalkBuilder;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use tracing::{debug, warn};

use crate::cli::Cli;

/// Loads the flat path list for a session from whichever source the CLI names.
pub fn load_paths(cli: &Cli) -> Result<Vec<String>> {
    let paths = match (&cli.paths, &cli.scan) {
        (_, Some(root)) => scan_files(root, cli.include_ignored)?,
        (Some(list), None) if list.as_os_str() == "-" => {
            read_path_list(io::stdin().lock(), cli.strip_prefix.as_deref())?
        }
        (Some(list), None) => {
            let file = File::open(list)
                .with_context(|| format!("failed to open path list {}", list.display()))?;
            read_path_list(BufReader::new(file), cli.strip_prefix.as_deref())?
        }
        (None, None) => anyhow::bail!("either --paths or --scan is required"),
    };
    debug!(entries = paths.len(), "loaded path list");
    Ok(paths)
}

/// Reads one path per line. Blank lines are skipped, backslashes become
/// forward slashes, and `strip_prefix` (a depot or stream root) is removed.
pub fn read_path_list<R: BufRead>(reader: R, strip_prefix: Option<&str>) -> Result<Vec<String>> {
    let prefix = strip_prefix.map(|p| format!("{}/", p.trim_end_matches('/')));
    let mut collected = Vec::new();
    for (lineno, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("failed to read path list line {}", lineno + 1))?;
        let line = line.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() {
            continue;
        }
        let normalized = line.replace('\\', "/");
        let relative = match &prefix {
            Some(prefix) => match normalized.strip_prefix(prefix.as_str()) {
                Some(rest) => rest.to_string(),
                None => {
                    warn!(line = lineno + 1, path = %normalized, "path outside the stripped prefix; skipping");
                    continue;
                }
            },
            None => normalized,
        };
        collected.push(relative);
    }
    Ok(collected)
}

/// Walks `root` and returns every file as a root-relative forward-slash path.
pub fn scan_files(root: &Path, include_ignored: bool) -> Result<Vec<String>> {
    anyhow::ensure!(root.is_dir(), "{} is not a directory", root.display());
    let mut walker = WalkBuilder::new(root);
    if include_ignored {
        walker.git_ignore(false).ignore(false);
    }

    let mut collected_paths: Vec<String> = Vec::new();
    for result in walker.build() {
        let dirent = match result {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "skipping unreadable entry during scan");
                continue;
            }
        };
        if !dirent.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }
        let Ok(relative) = dirent.path().strip_prefix(root) else {
            continue;
        };
        match relative.to_str() {
            Some(s) => collected_paths.push(s.replace('\\', "/")),
            None => warn!(path = %relative.display(), "skipping non UTF-8 path"),
        }
    }

    collected_paths.sort();
    collected_paths.dedup();
    Ok(collected_paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn reads_lines_and_normalizes_separators() {
        let input = "a/x.txt\r\n\n  \nDCC\\Reaper\\song.rpp\nAmbient Music/a b.wav\n";
        let paths = read_path_list(input.as_bytes(), None).unwrap();
        assert_eq!(paths, vec!["a/x.txt", "DCC/Reaper/song.rpp", "Ambient Music/a b.wav"]);
    }

    #[test]
    fn strips_the_stream_prefix_and_skips_outsiders() {
        let input = "//Game/main/DCC/a.wav\n//Game/other/b.wav\n//Game/main/p4ignore.txt\n";
        let paths = read_path_list(input.as_bytes(), Some("//Game/main/")).unwrap();
        assert_eq!(paths, vec!["DCC/a.wav", "p4ignore.txt"]);
    }

    #[test]
    fn scans_files_relative_to_the_root() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src/nested")).unwrap();
        fs::write(dir.path().join("src/nested/lib.rs"), "").unwrap();
        fs::write(dir.path().join("README"), "").unwrap();

        let paths = scan_files(dir.path(), false).unwrap();
        assert_eq!(paths, vec!["README", "src/nested/lib.rs"]);
    }

    #[test]
    fn scanning_a_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("f");
        fs::write(&file, "").unwrap();
        assert!(scan_files(&file, false).is_err());
    }
}
