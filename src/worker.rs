//! Background construction of the path tree.
//!
//! The worker owns its builder outright and hands the finished tree over
//! through a channel; the interactive side only ever polls. Each build gets
//! its own channel, so starting a new build drops the receiver of the old
//! one and any late result from it goes nowhere.

use std::thread;

use crossbeam_channel::{Receiver, Sender, TryRecvError, TrySendError, bounded};
use tracing::{debug, info, warn};

use crate::error::SelectionError;
use crate::path_tree::{BuildProgress, PathTree, PathTreeBuilder};

/// Progress messages beyond this backlog are dropped, not queued.
const PROGRESS_BACKLOG: usize = 16;

#[derive(Debug)]
pub enum BuildEvent {
    Progress(BuildProgress),
    Completed(PathTree),
    Failed(SelectionError),
}

#[derive(Debug)]
struct ActiveBuild {
    generation: u64,
    rx: Receiver<BuildEvent>,
    processed: usize,
    finished: bool,
}

#[derive(Debug, Default)]
pub struct BuildSupervisor {
    generation: u64,
    active: Option<ActiveBuild>,
}

impl BuildSupervisor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts building `paths` on a worker thread, superseding any build
    /// still in flight. Returns the generation of the new build.
    pub fn start(&mut self, paths: Vec<String>, progress_every: usize) -> u64 {
        self.generation += 1;
        let generation = self.generation;
        let (tx, rx) = bounded(PROGRESS_BACKLOG);
        if let Some(old) = self.active.take() {
            if !old.finished {
                debug!(generation = old.generation, "superseding unfinished build");
            }
        }

        info!(generation, entries = paths.len(), "starting path tree build");
        let spawned = thread::Builder::new()
            .name(format!("path-tree-build-{generation}"))
            .spawn(move || run_build(paths, progress_every.max(1), tx));
        if let Err(err) = spawned {
            warn!(%err, "could not spawn build worker");
        }
        // A worker that never started drops its sender right away, which
        // poll() reports as an interrupted build.
        self.active = Some(ActiveBuild {
            generation,
            rx,
            processed: 0,
            finished: false,
        });
        generation
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_running(&self) -> bool {
        self.active.as_ref().is_some_and(|b| !b.finished)
    }

    /// Returns the next event of the current build without blocking.
    /// After a terminal event nothing more is reported.
    pub fn poll(&mut self) -> Option<BuildEvent> {
        let build = self.active.as_mut()?;
        if build.finished {
            return None;
        }
        match build.rx.try_recv() {
            Ok(event) => Some(build.accept(event)),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(build.lost()),
        }
    }

    /// Blocks until the current build reports its next event.
    pub fn wait(&mut self) -> Option<BuildEvent> {
        let build = self.active.as_mut()?;
        if build.finished {
            return None;
        }
        match build.rx.recv() {
            Ok(event) => Some(build.accept(event)),
            Err(_) => Some(build.lost()),
        }
    }
}

impl ActiveBuild {
    fn accept(&mut self, event: BuildEvent) -> BuildEvent {
        match &event {
            BuildEvent::Progress(progress) => self.processed = progress.processed,
            BuildEvent::Completed(_) | BuildEvent::Failed(_) => self.finished = true,
        }
        event
    }

    fn lost(&mut self) -> BuildEvent {
        self.finished = true;
        BuildEvent::Failed(SelectionError::BuildInterrupted {
            processed: self.processed,
            source: Box::new(SelectionError::WorkerLost(
                "build worker exited without a result".to_string(),
            )),
        })
    }
}

fn run_build(paths: Vec<String>, chunk: usize, tx: Sender<BuildEvent>) {
    let mut builder = PathTreeBuilder::new(paths);
    while !builder.is_done() {
        match builder.step(chunk) {
            Ok(progress) => match tx.try_send(BuildEvent::Progress(progress)) {
                Ok(()) | Err(TrySendError::Full(_)) => {}
                Err(TrySendError::Disconnected(_)) => {
                    debug!("build superseded; stopping worker");
                    return;
                }
            },
            Err(err) => {
                let processed = builder.progress().processed;
                warn!(%err, processed, "path tree build failed");
                let failure = SelectionError::BuildInterrupted {
                    processed,
                    source: Box::new(err),
                };
                if tx.send(BuildEvent::Failed(failure)).is_err() {
                    debug!("build superseded before failure was reported");
                }
                return;
            }
        }
    }

    let event = match builder.finish() {
        Ok(tree) => {
            info!(files = tree.file_count(), "path tree build finished");
            BuildEvent::Completed(tree)
        }
        Err(err) => BuildEvent::Failed(SelectionError::BuildInterrupted {
            processed: 0,
            source: Box::new(err),
        }),
    };
    if tx.send(event).is_err() {
        debug!("build superseded before completion was reported");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("dir{}/file{i}.txt", i % 7)).collect()
    }

    fn drain(supervisor: &mut BuildSupervisor) -> (Vec<BuildProgress>, BuildEvent) {
        let mut progress = Vec::new();
        loop {
            match supervisor.wait() {
                Some(BuildEvent::Progress(p)) => progress.push(p),
                Some(terminal) => return (progress, terminal),
                None => panic!("build ended without a terminal event"),
            }
        }
    }

    #[test]
    fn completes_with_the_full_tree() {
        let mut supervisor = BuildSupervisor::new();
        supervisor.start(paths(50), 10);
        let (progress, terminal) = drain(&mut supervisor);
        let BuildEvent::Completed(tree) = terminal else {
            panic!("expected completion, got {terminal:?}");
        };
        assert_eq!(tree.file_count(), 50);
        assert!(progress.iter().all(|p| p.total == 50 && p.processed <= 50));
        assert!(!supervisor.is_running());
        assert!(supervisor.poll().is_none());
    }

    #[test]
    fn reports_structural_errors_as_interrupted_builds() {
        let mut supervisor = BuildSupervisor::new();
        supervisor.start(vec!["a".into(), "b".into(), "a/c".into()], 1);
        let (_, terminal) = drain(&mut supervisor);
        match terminal {
            BuildEvent::Failed(SelectionError::BuildInterrupted { processed, source }) => {
                assert_eq!(processed, 2);
                assert!(matches!(*source, SelectionError::MalformedPath { .. }));
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn a_new_build_supersedes_the_old_one() {
        let mut supervisor = BuildSupervisor::new();
        let first = supervisor.start(paths(5_000), 100);
        let second = supervisor.start(vec!["only/one.txt".into()], 100);
        assert!(second > first);
        assert_eq!(supervisor.generation(), second);
        let (_, terminal) = drain(&mut supervisor);
        let BuildEvent::Completed(tree) = terminal else {
            panic!("expected completion, got {terminal:?}");
        };
        assert_eq!(tree.file_paths(), vec!["only/one.txt"]);
    }

    #[test]
    fn empty_input_builds_an_empty_tree() {
        let mut supervisor = BuildSupervisor::new();
        supervisor.start(Vec::new(), 10);
        let (_, terminal) = drain(&mut supervisor);
        assert!(matches!(terminal, BuildEvent::Completed(tree) if tree.file_count() == 0));
    }
}
