//! sharepick - pick files and folders out of a large stream path list and
//! compile the selection into minimal `share` directives.
//!
//! The engine is independent of any UI: a flat path list becomes a
//! [`PathTree`], a [`SelectionTree`] tracks tri-state selection over it with
//! lazy materialization, and [`directives::compile`] turns the selection
//! into directive lines.

pub mod config;
pub mod directives;
pub mod engine;
pub mod error;
mod materialize;
pub mod path_tree;
pub mod selection;
pub mod worker;

pub use config::EngineConfig;
pub use directives::{Directive, compile, seed_selection};
pub use engine::{ROOT, SelectionTree, ViewNode};
pub use error::{SelectionError, SelectionResult};
pub use path_tree::{BuildProgress, NodeKind, PathTree, PathTreeBuilder, TreeNode};
pub use selection::{CheckState, SelectionSet};
pub use worker::{BuildEvent, BuildSupervisor};
