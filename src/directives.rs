//! Compiles a selection into `share` directive lines for a stream spec.
//!
//! The compiler is a single pass over the lexicographically sorted entries:
//! a candidate is dropped when an already kept folder directive covers it.
//! That is minimal for the prefix rule without attempting a set cover.

use std::collections::{BTreeSet, HashSet};
use std::fmt;

use tracing::{debug, warn};

use crate::path_tree::PathTree;
use crate::selection::{SelectionSet, lineage};

const KEYWORD: &str = "share";
const FOLDER_WILDCARD: &str = "...";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Directive {
    path: String,
    folder: bool,
}

impl Directive {
    pub fn file(path: impl Into<String>) -> Self {
        Directive {
            path: path.into(),
            folder: false,
        }
    }

    pub fn folder(path: impl Into<String>) -> Self {
        Directive {
            path: path.into(),
            folder: true,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_folder(&self) -> bool {
        self.folder
    }

    /// The path as written after the keyword, without quoting.
    pub fn target(&self) -> String {
        match (self.folder, self.path.is_empty()) {
            (true, true) => FOLDER_WILDCARD.to_string(),
            (true, false) => format!("{}/{}", self.path, FOLDER_WILDCARD),
            (false, _) => self.path.clone(),
        }
    }

    /// Parses one `share` line back into a directive. Other view line types
    /// and blank lines yield `None`.
    pub fn parse(line: &str) -> Option<Directive> {
        let rest = line.trim().strip_prefix(KEYWORD)?;
        if !rest.starts_with(char::is_whitespace) {
            return None;
        }
        let rest = rest.trim();
        let target = match rest.strip_prefix('"').and_then(|r| r.strip_suffix('"')) {
            Some(quoted) => quoted,
            None => rest,
        };
        if target.is_empty() {
            return None;
        }
        if target == FOLDER_WILDCARD {
            return Some(Directive::folder(""));
        }
        match target.strip_suffix(FOLDER_WILDCARD).and_then(|t| t.strip_suffix('/')) {
            Some(folder) if !folder.is_empty() => Some(Directive::folder(folder)),
            Some(_) => None,
            None => Some(Directive::file(target)),
        }
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let target = self.target();
        if target.contains(' ') {
            write!(f, "{KEYWORD} \"{target}\"")
        } else {
            write!(f, "{KEYWORD} {target}")
        }
    }
}

/// Turns the selection into the smallest directive list the prefix rule allows.
pub fn compile(tree: &PathTree, selection: &SelectionSet) -> Vec<Directive> {
    let mut candidates: Vec<Directive> = selection
        .iter()
        .filter_map(|path| match tree.get(path) {
            Some(node) if node.is_folder() => Some(Directive::folder(path)),
            Some(_) => Some(Directive::file(path)),
            None => {
                warn!(path, "selection entry is not in the path tree; skipping");
                None
            }
        })
        .collect();
    candidates.sort_by(|a, b| a.path.cmp(&b.path));
    candidates.dedup();

    let mut kept_folders: HashSet<String> = HashSet::new();
    let mut kept = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        if lineage(&candidate.path).any(|p| kept_folders.contains(p)) {
            continue;
        }
        if candidate.folder {
            kept_folders.insert(candidate.path.clone());
        }
        kept.push(candidate);
    }
    debug!(directives = kept.len(), entries = selection.len(), "compiled selection");
    kept
}

pub fn render(directives: &[Directive]) -> Vec<String> {
    directives.iter().map(Directive::to_string).collect()
}

/// Files of the full tree that `directives` denote.
pub fn expand<'a>(tree: &'a PathTree, directives: &[Directive]) -> BTreeSet<&'a str> {
    let mut files = BTreeSet::new();
    for directive in directives {
        let Some(node) = tree.get(&directive.path) else {
            continue;
        };
        if directive.folder == node.is_folder() {
            files.extend(node.file_paths());
        }
    }
    files
}

/// Rebuilds a selection from existing `share` lines. Lines naming paths the
/// tree does not know are returned separately instead of failing the seed.
pub fn seed_selection<'l, I>(tree: &PathTree, lines: I) -> (SelectionSet, Vec<String>)
where
    I: IntoIterator<Item = &'l str>,
{
    let mut selection = SelectionSet::new();
    let mut skipped = Vec::new();
    for line in lines {
        let Some(directive) = Directive::parse(line) else {
            continue;
        };
        match tree.get(&directive.path) {
            Some(node) if node.is_folder() == directive.folder => {
                selection.include(&directive.path);
            }
            _ => skipped.push(line.trim().to_string()),
        }
    }
    (selection, skipped)
}
