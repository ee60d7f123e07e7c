use sharepick::{BuildProgress, SelectionTree};

/// Where the session is: waiting on the build worker, editing, or stuck
/// on a build failure.
#[derive(Debug)]
pub(super) enum Phase {
    Building(Option<BuildProgress>),
    Ready(SelectionTree),
    Failed(String),
}

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub(super) enum AppMode {
    Normal,
    Filtering,
}
