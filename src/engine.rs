//! The selection tree engine: owns the full path tree, the canonical
//! [`SelectionSet`], and the arena of materialized nodes a host renders.
//!
//! Every mutation goes through `&mut self`, so one propagation always runs
//! to completion before the next begins. Compiled directives are cached and
//! rebuilt at most once per read after any number of mutations.

use std::collections::HashMap;

use tracing::{debug, trace};

use crate::config::EngineConfig;
use crate::directives::{self, Directive};
use crate::error::{SelectionError, SelectionResult};
use crate::path_tree::{NodeKind, PathTree};
use crate::selection::{CheckState, SelectionSet, lineage};

/// Index of the root node in [`SelectionTree::nodes`].
pub const ROOT: usize = 0;

/// A node that has been revealed from the full tree.
#[derive(Debug, Clone)]
pub struct ViewNode {
    pub name: String,
    pub path: String,
    pub kind: NodeKind,
    pub depth: usize,
    pub state: CheckState,
    /// Whether the children of this folder have been realized.
    pub materialized: bool,
    pub expanded: bool,
    pub children_indices: Vec<usize>,
    pub parent_index: Option<usize>,
}

impl ViewNode {
    pub fn is_dir(&self) -> bool {
        self.kind == NodeKind::Folder
    }
}

#[derive(Debug)]
pub struct SelectionTree {
    pub(crate) tree: PathTree,
    pub(crate) selection: SelectionSet,
    pub(crate) nodes: Vec<ViewNode>,
    pub(crate) index: HashMap<String, usize>,
    pub(crate) config: EngineConfig,
    compiled: Option<Vec<Directive>>,
}

impl SelectionTree {
    pub fn new(tree: PathTree, config: EngineConfig) -> Self {
        Self::with_selection(tree, SelectionSet::new(), config)
    }

    /// Starts a session from a previously recorded selection. Only the root
    /// and its direct children are materialized.
    pub fn with_selection(tree: PathTree, selection: SelectionSet, config: EngineConfig) -> Self {
        let root = ViewNode {
            name: String::new(),
            path: String::new(),
            kind: NodeKind::Folder,
            depth: 0,
            state: selection.derived_state("", NodeKind::Folder),
            materialized: false,
            expanded: true,
            children_indices: Vec::new(),
            parent_index: None,
        };
        let mut engine = SelectionTree {
            tree,
            selection,
            nodes: vec![root],
            index: HashMap::from([(String::new(), ROOT)]),
            config,
            compiled: None,
        };
        engine.materialize_at(ROOT);
        engine
    }

    pub fn tree(&self) -> &PathTree {
        &self.tree
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn nodes(&self) -> &[ViewNode] {
        &self.nodes
    }

    pub fn node(&self, idx: usize) -> Option<&ViewNode> {
        self.nodes.get(idx)
    }

    pub fn index_of(&self, path: &str) -> Option<usize> {
        self.index.get(path).copied()
    }

    /// Current state of any known path, materialized or not.
    pub fn state(&self, path: &str) -> SelectionResult<CheckState> {
        if let Some(idx) = self.index_of(path) {
            return Ok(self.nodes[idx].state);
        }
        let node = self.tree.get(path).ok_or_else(|| SelectionError::unknown(path))?;
        Ok(self.selection.derived_state(path, node.kind()))
    }

    /// Explicitly checks or unchecks `path`, then brings the materialized
    /// nodes back in line. Unknown paths fail without touching any state.
    pub fn set_checked(&mut self, path: &str, checked: bool) -> SelectionResult<()> {
        self.selection.record(&self.tree, path, checked)?;
        self.compiled = None;
        let state = CheckState::from_checked(checked);
        debug!(path, ?state, "selection changed");

        match self.index_of(path) {
            Some(idx) => {
                self.nodes[idx].state = state;
                self.propagate_down(idx, state);
                self.propagate_up(idx);
            }
            None => {
                // The deepest revealed ancestor is an unmaterialized folder,
                // so its state comes straight from the selection set.
                let anchor = lineage(path)
                    .filter_map(|p| self.index.get(p).copied())
                    .last()
                    .unwrap_or(ROOT);
                let node = &self.nodes[anchor];
                let derived = self.selection.derived_state(&node.path, node.kind);
                if derived != node.state {
                    self.nodes[anchor].state = derived;
                    self.propagate_up(anchor);
                }
            }
        }
        Ok(())
    }

    /// Checks anything not fully checked, unchecks the rest. Returns the new state.
    pub fn toggle(&mut self, path: &str) -> SelectionResult<CheckState> {
        let checked = self.state(path)? != CheckState::Checked;
        self.set_checked(path, checked)?;
        Ok(CheckState::from_checked(checked))
    }

    /// Applies several explicit settings as one transaction: every path is
    /// validated before the first one is applied.
    pub fn apply<I, S>(&mut self, batch: I) -> SelectionResult<()>
    where
        I: IntoIterator<Item = (S, bool)>,
        S: AsRef<str>,
    {
        let batch: Vec<(S, bool)> = batch.into_iter().collect();
        if let Some((path, _)) = batch.iter().find(|(p, _)| !self.tree.contains(p.as_ref())) {
            return Err(SelectionError::unknown(path.as_ref()));
        }
        for (path, checked) in &batch {
            self.set_checked(path.as_ref(), *checked)?;
        }
        Ok(())
    }

    /// Forces every materialized descendant of `idx` to `state`.
    /// Unmaterialized subtrees are left to selection set membership.
    pub fn propagate_down(&mut self, idx: usize, state: CheckState) {
        let mut stack: Vec<usize> = self.nodes[idx].children_indices.clone();
        while let Some(child) = stack.pop() {
            self.nodes[child].state = state;
            stack.extend_from_slice(&self.nodes[child].children_indices);
        }
    }

    /// Recomputes the ancestors of `idx`, stopping at the first one whose
    /// state does not change.
    pub fn propagate_up(&mut self, idx: usize) {
        let mut current = self.nodes[idx].parent_index;
        while let Some(parent) = current {
            let computed = self.computed_state(parent);
            if computed == self.nodes[parent].state {
                trace!(path = %self.nodes[parent].path, "propagation settled");
                break;
            }
            self.nodes[parent].state = computed;
            current = self.nodes[parent].parent_index;
        }
    }

    /// Folder state derived from its materialized children.
    pub(crate) fn computed_state(&self, idx: usize) -> CheckState {
        let node = &self.nodes[idx];
        if node.children_indices.is_empty() {
            return node.state;
        }
        let mut checked = 0;
        let mut unchecked = 0;
        for &child in &node.children_indices {
            match self.nodes[child].state {
                CheckState::Checked => checked += 1,
                CheckState::Unchecked => unchecked += 1,
                CheckState::PartiallyChecked => {}
            }
        }
        let total = node.children_indices.len();
        if checked == total {
            CheckState::Checked
        } else if unchecked == total {
            CheckState::Unchecked
        } else {
            CheckState::PartiallyChecked
        }
    }

    /// Expanding a folder reveals its children.
    pub fn set_expanded(&mut self, idx: usize, expanded: bool) {
        let Some(node) = self.nodes.get_mut(idx) else {
            return;
        };
        if !node.is_dir() {
            return;
        }
        node.expanded = expanded;
        if expanded {
            self.materialize_at(idx);
        }
    }

    /// Expands every folder that is already materialized.
    pub fn expand_materialized(&mut self) {
        for node in self.nodes.iter_mut() {
            if node.materialized {
                node.expanded = true;
            }
        }
    }

    /// Collapses everything except the root.
    pub fn collapse_all(&mut self) {
        for node in self.nodes.iter_mut().skip(1) {
            node.expanded = false;
        }
    }

    pub fn directives(&mut self) -> &[Directive] {
        self.compiled
            .get_or_insert_with(|| directives::compile(&self.tree, &self.selection))
    }

    pub fn directive_lines(&mut self) -> Vec<String> {
        directives::render(self.directives())
    }

    pub(crate) fn invalidate_directives(&mut self) {
        self.compiled = None;
    }
}
