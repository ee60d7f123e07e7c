use sharepick::{ROOT, ViewNode};
use std::collections::HashMap;

/// Build pretty tree-style labels for the visible rows in **O(n)**.
///
/// * `visible` must be in display (pre-)order, as produced by the app.
/// * Connectors are computed against *visible* siblings, so a filtered
///   list still draws a closed tree.
pub(super) fn build_tree_labels(nodes: &[ViewNode], visible: &[usize]) -> Vec<String> {
    let n = visible.len();
    let mut labels = Vec::with_capacity(n);
    // is_last_vec[i] is true if visible[i] is the last visible child of its parent.
    let mut is_last_vec = vec![false; n];
    let mut last_child_map = HashMap::<usize, usize>::new(); // parent node -> row of its last visible child

    // PASS #1 – record each folder's last visible child row
    for (row, &idx) in visible.iter().enumerate() {
        if let Some(parent) = nodes[idx].parent_index {
            last_child_map.insert(parent, row);
        }
    }

    // PASS #2 – scan once, using a stack of ancestor rows
    let mut ancestor_stack: Vec<usize> = Vec::new();
    for (row, &idx) in visible.iter().enumerate() {
        let node = &nodes[idx];
        let depth = node.depth;
        ancestor_stack.truncate(depth);

        let is_last_child = node
            .parent_index
            .is_some_and(|parent| last_child_map.get(&parent) == Some(&row));
        is_last_vec[row] = is_last_child;

        let label = if idx == ROOT {
            "./".to_string()
        } else {
            let mut prefix = String::new();
            // Skip the root row, then one guide per ancestor above the parent.
            for &ancestor_row in ancestor_stack.iter().skip(1) {
                prefix.push_str(if is_last_vec[ancestor_row] { "   " } else { "│  " });
            }
            prefix.push_str(if is_last_child { "└─ " } else { "├─ " });
            if node.is_dir() {
                format!("{}{}/", prefix, node.name)
            } else {
                format!("{}{}", prefix, node.name)
            }
        };
        labels.push(label);

        if ancestor_stack.len() == depth {
            ancestor_stack.push(row);
        }
    }
    labels
}

#[cfg(test)]
mod tests {
    use super::*;
    use sharepick::{EngineConfig, PathTree, SelectionTree};

    #[test]
    fn draws_guides_for_nested_rows() {
        let tree = PathTree::build(["a/b/x", "a/y", "z"]).unwrap();
        let mut engine = SelectionTree::new(tree, EngineConfig::default());
        engine.reveal("a/b/x").unwrap();
        let visible: Vec<usize> = ["", "a", "a/b", "a/b/x", "a/y", "z"]
            .iter()
            .map(|p| engine.index_of(p).unwrap())
            .collect();
        let labels = build_tree_labels(engine.nodes(), &visible);
        assert_eq!(
            labels,
            vec!["./", "├─ a/", "│  ├─ b/", "│  │  └─ x", "│  └─ y", "└─ z"]
        );
    }
}
