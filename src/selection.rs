use std::collections::BTreeSet;
use std::ops::Bound;

use crate::error::{SelectionError, SelectionResult};
use crate::path_tree::{NodeKind, PathTree};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckState {
    Unchecked,
    Checked,
    PartiallyChecked,
}

impl CheckState {
    pub fn from_checked(checked: bool) -> Self {
        if checked {
            CheckState::Checked
        } else {
            CheckState::Unchecked
        }
    }
}

/// Yields `""` (the root), every proper ancestor folder of `path`, and then
/// `path` itself, shallowest first.
pub(crate) fn lineage(path: &str) -> impl Iterator<Item = &str> {
    std::iter::once("")
        .chain(path.match_indices('/').map(move |(i, _)| &path[..i]))
        .chain((!path.is_empty()).then_some(path))
}

fn subtree_prefix(path: &str) -> String {
    format!("{path}/")
}

/// Canonical record of fully included paths.
///
/// Entries are kept collapsed: including a folder drops every entry below
/// it, and including a path that an ancestor entry already covers is a
/// no-op. An entry implicitly includes every file below it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    entries: BTreeSet<String>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains(path)
    }

    /// True when `path` or one of its ancestors is an entry.
    pub fn covers(&self, path: &str) -> bool {
        lineage(path).any(|p| self.entries.contains(p))
    }

    /// True when some entry lies strictly below `path`.
    pub fn has_descendant(&self, path: &str) -> bool {
        if path.is_empty() {
            return self.entries.iter().any(|e| !e.is_empty());
        }
        let prefix = subtree_prefix(path);
        self.entries
            .range::<str, _>((Bound::Included(prefix.as_str()), Bound::Unbounded))
            .next()
            .is_some_and(|e| e.starts_with(&prefix))
    }

    /// State a not-yet-materialized node of `kind` at `path` starts with.
    pub fn derived_state(&self, path: &str, kind: NodeKind) -> CheckState {
        if self.covers(path) {
            CheckState::Checked
        } else if kind == NodeKind::Folder && self.has_descendant(path) {
            CheckState::PartiallyChecked
        } else {
            CheckState::Unchecked
        }
    }

    /// Mirrors an explicit check or uncheck of `path` into the set.
    ///
    /// Unchecking a path covered by an ancestor entry splits that entry into
    /// the sibling subtrees along the way down, so everything else under the
    /// ancestor stays included. Unknown paths fail before anything changes.
    pub fn record(&mut self, tree: &PathTree, path: &str, included: bool) -> SelectionResult<()> {
        if !tree.contains(path) {
            return Err(SelectionError::unknown(path));
        }
        if included {
            self.include(path);
            return Ok(());
        }

        let mut split = Vec::new();
        let covering = lineage(path)
            .take_while(|p| *p != path)
            .find(|p| self.entries.contains(*p));
        if let Some(ancestor) = covering {
            let mut node = tree.get(ancestor).ok_or_else(|| SelectionError::unknown(ancestor))?;
            let rest = if ancestor.is_empty() {
                path
            } else {
                &path[ancestor.len() + 1..]
            };
            for segment in rest.split('/') {
                split.extend(
                    node.ordered_children()
                        .into_iter()
                        .filter(|c| c.name() != segment)
                        .map(|c| c.path().to_string()),
                );
                node = node.child(segment).ok_or_else(|| SelectionError::unknown(path))?;
            }
            self.entries.remove(ancestor);
        }
        self.remove_subtree(path);
        self.entries.extend(split);
        Ok(())
    }

    /// Adds `path` as an entry unless it is already covered, collapsing any
    /// entries beneath it.
    pub(crate) fn include(&mut self, path: &str) -> bool {
        if self.covers(path) {
            return false;
        }
        self.remove_subtree(path);
        self.entries.insert(path.to_string());
        true
    }

    #[cfg(test)]
    pub(crate) fn insert_unchecked(&mut self, path: &str) {
        self.entries.insert(path.to_string());
    }

    fn remove_subtree(&mut self, path: &str) {
        if path.is_empty() {
            self.entries.clear();
            return;
        }
        self.entries.remove(path);
        let prefix = subtree_prefix(path);
        let doomed: Vec<String> = self
            .entries
            .range::<str, _>((Bound::Included(prefix.as_str()), Bound::Unbounded))
            .take_while(|e| e.starts_with(&prefix))
            .cloned()
            .collect();
        for entry in doomed {
            self.entries.remove(&entry);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> PathTree {
        PathTree::build(["a/x.txt", "a/y.txt", "a/b/z.txt", "a/b/w.txt", "c/q.txt"]).unwrap()
    }

    fn entries(set: &SelectionSet) -> Vec<&str> {
        set.iter().collect()
    }

    #[test]
    fn lineage_walks_from_root_down() {
        assert_eq!(lineage("a/b/c").collect::<Vec<_>>(), vec!["", "a", "a/b", "a/b/c"]);
        assert_eq!(lineage("").collect::<Vec<_>>(), vec![""]);
    }

    #[test]
    fn including_a_folder_collapses_its_descendants() {
        let tree = tree();
        let mut set = SelectionSet::new();
        set.record(&tree, "a/x.txt", true).unwrap();
        set.record(&tree, "a/b/z.txt", true).unwrap();
        set.record(&tree, "a", true).unwrap();
        assert_eq!(entries(&set), vec!["a"]);

        // Already covered, nothing to add.
        set.record(&tree, "a/b", true).unwrap();
        assert_eq!(entries(&set), vec!["a"]);
    }

    #[test]
    fn unchecking_under_an_included_folder_splits_it() {
        let tree = tree();
        let mut set = SelectionSet::new();
        set.record(&tree, "a", true).unwrap();
        set.record(&tree, "a/b/z.txt", false).unwrap();
        assert_eq!(entries(&set), vec!["a/b/w.txt", "a/x.txt", "a/y.txt"]);
        assert!(!set.covers("a/b/z.txt"));
        assert!(set.covers("a/y.txt"));
    }

    #[test]
    fn unchecking_a_child_of_the_root_entry_keeps_the_rest() {
        let tree = tree();
        let mut set = SelectionSet::new();
        set.record(&tree, "", true).unwrap();
        set.record(&tree, "c", false).unwrap();
        assert_eq!(entries(&set), vec!["a"]);
    }

    #[test]
    fn unchecking_a_folder_drops_everything_below() {
        let tree = tree();
        let mut set = SelectionSet::new();
        set.record(&tree, "a/x.txt", true).unwrap();
        set.record(&tree, "a/b", true).unwrap();
        set.record(&tree, "c/q.txt", true).unwrap();
        set.record(&tree, "a", false).unwrap();
        assert_eq!(entries(&set), vec!["c/q.txt"]);
    }

    #[test]
    fn unknown_paths_leave_the_set_untouched() {
        let tree = tree();
        let mut set = SelectionSet::new();
        set.record(&tree, "a", true).unwrap();
        let before = set.clone();
        assert_eq!(
            set.record(&tree, "a/nope", false),
            Err(SelectionError::UnknownPath { path: "a/nope".into() })
        );
        assert_eq!(set, before);
    }

    #[test]
    fn derived_state_reflects_membership() {
        let tree = tree();
        let mut set = SelectionSet::new();
        set.record(&tree, "a/b/z.txt", true).unwrap();
        assert_eq!(set.derived_state("a", NodeKind::Folder), CheckState::PartiallyChecked);
        assert_eq!(set.derived_state("a/b/z.txt", NodeKind::File), CheckState::Checked);
        assert_eq!(set.derived_state("c", NodeKind::Folder), CheckState::Unchecked);
        assert_eq!(set.derived_state("", NodeKind::Folder), CheckState::PartiallyChecked);

        set.record(&tree, "a", true).unwrap();
        assert_eq!(set.derived_state("a/b/w.txt", NodeKind::File), CheckState::Checked);
    }

    #[test]
    fn has_descendant_ignores_lookalike_siblings() {
        let tree = PathTree::build(["a/x", "ab/y"]).unwrap();
        let mut set = SelectionSet::new();
        set.record(&tree, "ab/y", true).unwrap();
        assert!(!set.has_descendant("a"));
        assert!(set.has_descendant("ab"));
    }
}
