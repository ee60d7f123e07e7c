//! Lazy materialization: folders reveal one level of children on demand.
//!
//! Newly revealed children take their state from the selection set, so a
//! folder toggled long before it was opened still shows the right marks.

use tracing::debug;

use crate::engine::{ROOT, SelectionTree, ViewNode};
use crate::error::{SelectionError, SelectionResult};
use crate::path_tree::NodeKind;
use crate::selection::{CheckState, lineage};

impl SelectionTree {
    /// Reveals `path` (materializing its ancestors as needed) and then
    /// realizes its children. Returns how many nodes were created; files and
    /// already materialized folders yield 0.
    pub fn materialize_children(&mut self, path: &str) -> SelectionResult<usize> {
        let idx = self.reveal(path)?;
        Ok(self.materialize_at(idx))
    }

    /// Makes sure a view node exists for `path` and returns its index.
    pub fn reveal(&mut self, path: &str) -> SelectionResult<usize> {
        if !self.tree.contains(path) {
            return Err(SelectionError::unknown(path));
        }
        let mut idx = ROOT;
        for prefix in lineage(path).skip(1) {
            if let Some(found) = self.index_of(prefix) {
                idx = found;
                continue;
            }
            self.materialize_at(idx);
            idx = self
                .index_of(prefix)
                .ok_or_else(|| SelectionError::unknown(prefix))?;
        }
        Ok(idx)
    }

    pub(crate) fn materialize_at(&mut self, idx: usize) -> usize {
        let Some(parent) = self.nodes.get(idx) else {
            return 0;
        };
        if parent.materialized || !parent.is_dir() {
            return 0;
        }
        let depth = parent.depth + 1;
        let Some(folder) = self.tree.get(&parent.path) else {
            return 0;
        };

        let mut created = Vec::new();
        let mut sentinel_recorded = false;
        for child in folder.ordered_children() {
            let state = if child.kind() == NodeKind::File && self.config.is_sentinel(child.name()) {
                sentinel_recorded |= self.selection.include(child.path());
                CheckState::Checked
            } else {
                self.selection.derived_state(child.path(), child.kind())
            };
            let child_idx = self.nodes.len();
            self.nodes.push(ViewNode {
                name: child.name().to_string(),
                path: child.path().to_string(),
                kind: child.kind(),
                depth,
                state,
                materialized: false,
                expanded: false,
                children_indices: Vec::new(),
                parent_index: Some(idx),
            });
            self.index.insert(child.path().to_string(), child_idx);
            created.push(child_idx);
        }

        let count = created.len();
        self.nodes[idx].children_indices = created;
        self.nodes[idx].materialized = true;
        if sentinel_recorded {
            self.invalidate_directives();
        }
        debug!(path = %self.nodes[idx].path, children = count, "materialized folder");

        let computed = self.computed_state(idx);
        if computed != self.nodes[idx].state {
            self.nodes[idx].state = computed;
            self.propagate_up(idx);
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use crate::config::EngineConfig;
    use crate::engine::SelectionTree;
    use crate::path_tree::PathTree;
    use crate::selection::CheckState;

    fn engine(paths: &[&str]) -> SelectionTree {
        SelectionTree::new(PathTree::build(paths).unwrap(), EngineConfig::default())
    }

    fn child_names(engine: &SelectionTree, path: &str) -> Vec<String> {
        let idx = engine.index_of(path).unwrap();
        engine.nodes()[idx]
            .children_indices
            .iter()
            .map(|&c| engine.nodes()[c].name.clone())
            .collect()
    }

    #[test]
    fn reveals_one_level_folders_first() {
        let mut engine = engine(&["a/z.txt", "a/b/deep.txt", "a/c/deep.txt", "a/a.txt"]);
        assert_eq!(engine.materialize_children("a").unwrap(), 4);
        assert_eq!(child_names(&engine, "a"), vec!["b", "c", "a.txt", "z.txt"]);
        assert!(engine.index_of("a/b/deep.txt").is_none());
    }

    #[test]
    fn materializing_twice_is_a_no_op() {
        let mut engine = engine(&["a/x", "a/y"]);
        assert_eq!(engine.materialize_children("a").unwrap(), 2);
        let len = engine.nodes().len();
        assert_eq!(engine.materialize_children("a").unwrap(), 0);
        assert_eq!(engine.nodes().len(), len);
        assert_eq!(engine.materialize_children("a/x").unwrap(), 0);
    }

    #[test]
    fn children_of_a_checked_ancestor_start_checked() {
        let mut engine = engine(&["a/b/x", "a/b/y", "a/c"]);
        engine.set_checked("a", true).unwrap();
        engine.materialize_children("a/b").unwrap();
        for path in ["a/b", "a/c", "a/b/x", "a/b/y"] {
            let idx = engine.index_of(path).unwrap();
            assert_eq!(engine.nodes()[idx].state, CheckState::Checked, "{path}");
        }
    }

    #[test]
    fn children_seed_partial_from_deeper_entries() {
        let mut engine = engine(&["a/b/c/x", "a/b/y", "a/d"]);
        engine.set_checked("a/b/c/x", true).unwrap();
        engine.materialize_children("a").unwrap();
        let b = engine.index_of("a/b").unwrap();
        let d = engine.index_of("a/d").unwrap();
        assert_eq!(engine.nodes()[b].state, CheckState::PartiallyChecked);
        assert_eq!(engine.nodes()[d].state, CheckState::Unchecked);
    }

    #[test]
    fn sentinel_files_start_checked_and_are_shared() {
        let mut engine = engine(&["Imports/Music/a.wav", "Imports/p4ignore.txt", "p4ignore.txt"]);
        // The root level is revealed on construction.
        assert_eq!(engine.state("p4ignore.txt").unwrap(), CheckState::Checked);
        assert_eq!(engine.state("").unwrap(), CheckState::PartiallyChecked);

        engine.materialize_children("Imports").unwrap();
        assert_eq!(engine.state("Imports/p4ignore.txt").unwrap(), CheckState::Checked);
        assert_eq!(engine.state("Imports").unwrap(), CheckState::PartiallyChecked);
        assert_eq!(
            engine.directive_lines(),
            vec!["share Imports/p4ignore.txt", "share p4ignore.txt"]
        );
    }

    #[test]
    fn sentinel_list_is_configurable() {
        let config = EngineConfig {
            sentinel_names: vec!["KEEP".into()],
            ..EngineConfig::default()
        };
        let mut engine = SelectionTree::new(PathTree::build(["KEEP", "p4ignore.txt"]).unwrap(), config);
        assert_eq!(engine.state("KEEP").unwrap(), CheckState::Checked);
        assert_eq!(engine.state("p4ignore.txt").unwrap(), CheckState::Unchecked);
        assert_eq!(engine.directive_lines(), vec!["share KEEP"]);
    }

    #[test]
    fn reveal_materializes_the_ancestor_chain() {
        let mut engine = engine(&["a/b/c/d.txt"]);
        let idx = engine.reveal("a/b/c/d.txt").unwrap();
        assert_eq!(engine.nodes()[idx].path, "a/b/c/d.txt");
        assert!(engine.nodes()[engine.index_of("a/b").unwrap()].materialized);
        assert!(engine.reveal("a/x").is_err());
    }

    #[test]
    fn full_materialization_round_trips_the_input() {
        let input = ["DCC/Reaper/placeholder.txt", "DCC/Reaper/SFX/Footsteps.rpp", "Imports/Music/HeartThump.wav", "p4ignore.txt"];
        let mut engine = engine(&input);
        for path in input {
            engine.reveal(path).unwrap();
        }
        let mut leaves: Vec<&str> = engine
            .nodes()
            .iter()
            .filter(|n| !n.is_dir())
            .map(|n| n.path.as_str())
            .collect();
        leaves.sort();
        let mut expected = input.to_vec();
        expected.sort();
        assert_eq!(leaves, expected);
    }
}
