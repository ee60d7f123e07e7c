use std::collections::BTreeMap;

use tracing::debug;

use crate::error::{SelectionError, SelectionResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Folder,
    File,
}

/// One folder or file of the full path tree.
///
/// `path` is root-relative; the root itself has an empty name and path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    name: String,
    path: String,
    kind: NodeKind,
    children: BTreeMap<String, TreeNode>,
}

impl TreeNode {
    fn new(name: &str, path: &str, kind: NodeKind) -> Self {
        TreeNode {
            name: name.to_string(),
            path: path.to_string(),
            kind,
            children: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn is_folder(&self) -> bool {
        self.kind == NodeKind::Folder
    }

    pub fn child(&self, name: &str) -> Option<&TreeNode> {
        self.children.get(name)
    }

    /// Children in display order: folders first, then files, each sorted by name.
    pub fn ordered_children(&self) -> Vec<&TreeNode> {
        let (mut ordered, files): (Vec<&TreeNode>, Vec<&TreeNode>) =
            self.children.values().partition(|c| c.is_folder());
        ordered.extend(files);
        ordered
    }

    /// Every file path at or below this node, in lexicographic order.
    pub fn file_paths(&self) -> Vec<&str> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            match node.kind {
                NodeKind::File => out.push(node.path.as_str()),
                // Reversed so the stack pops children in name order.
                NodeKind::Folder => stack.extend(node.children.values().rev()),
            }
        }
        out
    }
}

/// The complete hierarchy derived from the flat path list of one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTree {
    root: TreeNode,
    file_count: usize,
}

impl PathTree {
    /// Builds the whole tree in one go. Hosts that must stay responsive
    /// drive a [`PathTreeBuilder`] in chunks instead.
    pub fn build<I, S>(paths: I) -> SelectionResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        PathTreeBuilder::new(paths.into_iter().map(|p| p.as_ref().to_string()).collect()).finish()
    }

    pub fn root(&self) -> &TreeNode {
        &self.root
    }

    /// Looks a node up by its full path; `""` is the root.
    pub fn get(&self, path: &str) -> Option<&TreeNode> {
        if path.is_empty() {
            return Some(&self.root);
        }
        let mut node = &self.root;
        for segment in path.split('/') {
            node = node.children.get(segment)?;
        }
        Some(node)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    pub fn is_folder(&self, path: &str) -> bool {
        self.get(path).is_some_and(TreeNode::is_folder)
    }

    pub fn file_count(&self) -> usize {
        self.file_count
    }

    pub fn file_paths(&self) -> Vec<&str> {
        self.root.file_paths()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildProgress {
    pub processed: usize,
    pub total: usize,
}

/// Incremental tree construction: each [`step`](Self::step) consumes at most
/// `chunk` entries so the caller can report progress between chunks.
#[derive(Debug)]
pub struct PathTreeBuilder {
    pending: std::vec::IntoIter<String>,
    root: TreeNode,
    processed: usize,
    total: usize,
    file_count: usize,
    failure: Option<SelectionError>,
}

impl PathTreeBuilder {
    pub fn new(paths: Vec<String>) -> Self {
        let total = paths.len();
        PathTreeBuilder {
            pending: paths.into_iter(),
            root: TreeNode::new("", "", NodeKind::Folder),
            processed: 0,
            total,
            file_count: 0,
            failure: None,
        }
    }

    pub fn progress(&self) -> BuildProgress {
        BuildProgress {
            processed: self.processed,
            total: self.total,
        }
    }

    pub fn is_done(&self) -> bool {
        self.processed == self.total
    }

    /// Processes up to `chunk` entries. Once an entry fails, the builder is
    /// poisoned and every later call reports the same error.
    pub fn step(&mut self, chunk: usize) -> SelectionResult<BuildProgress> {
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }
        for _ in 0..chunk {
            let Some(path) = self.pending.next() else {
                break;
            };
            if let Err(err) = self.insert(&path) {
                self.failure = Some(err.clone());
                return Err(err);
            }
            self.processed += 1;
        }
        Ok(self.progress())
    }

    /// Drains whatever is left and hands over the finished tree.
    pub fn finish(mut self) -> SelectionResult<PathTree> {
        while !self.is_done() {
            self.step(usize::MAX)?;
        }
        debug!(files = self.file_count, "path tree built");
        Ok(PathTree {
            root: self.root,
            file_count: self.file_count,
        })
    }

    fn insert(&mut self, path: &str) -> SelectionResult<()> {
        if path.is_empty() {
            return Err(SelectionError::malformed(path, "empty path"));
        }
        if path.starts_with('/') {
            return Err(SelectionError::malformed(path, "leading slash"));
        }
        if path.ends_with('/') {
            return Err(SelectionError::malformed(path, "trailing slash"));
        }
        if path.split('/').any(str::is_empty) {
            return Err(SelectionError::malformed(path, "empty segment"));
        }

        let mut node = &mut self.root;
        let mut end = 0;
        let mut segments = path.split('/').peekable();
        while let Some(segment) = segments.next() {
            end += segment.len();
            let prefix = &path[..end];
            let is_last = segments.peek().is_none();
            let kind = if is_last {
                NodeKind::File
            } else {
                NodeKind::Folder
            };
            let created = !node.children.contains_key(segment);
            let child = node
                .children
                .entry(segment.to_string())
                .or_insert_with(|| TreeNode::new(segment, prefix, kind));
            if child.kind != kind {
                let reason = match child.kind {
                    NodeKind::File => format!("'{prefix}' is already a file"),
                    NodeKind::Folder => format!("'{prefix}' is already a folder"),
                };
                return Err(SelectionError::malformed(path, reason));
            }
            if is_last && created {
                self.file_count += 1;
            }
            node = child;
            end += 1;
        }
        Ok(())
    }
}
