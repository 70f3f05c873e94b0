// State management module
//
// This module provides the StateManager which wraps RunState with thread-safe access
// using Arc<RwLock<T>> and emits change events for progress reporting.
// RunState holds counters only, so each update costs the same regardless of
// how many files the run has processed.

use crate::models::RunState;
use camino::Utf8PathBuf;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::broadcast;

/// Change events emitted when run state is modified
///
/// Subscribers (the CLI progress printer, tests) receive these without
/// polling the state.
#[derive(Clone, Debug, PartialEq)]
pub enum StateChange {
    /// A run has started
    RunStarted {
        format_name: Option<String>,
        total_files: usize,
    },

    /// Progress has been updated during a run
    ProgressUpdated {
        current: usize,
        total: usize,
        current_file: Option<Utf8PathBuf>,
    },

    /// A file reached its terminal outcome
    FileProcessed { path: Utf8PathBuf, status: String },

    /// A run has finished (normally or after cancellation)
    RunFinished {
        changed: usize,
        unchanged: usize,
        excluded: usize,
        failed: usize,
    },

    /// Cancellation was requested for the current run
    RunCancelled,
}

/// Thread-safe run state with event emission
///
/// - [`read()`](Self::read) for reading state under a short-lived lock
/// - [`update()`](Self::update) for mutations with automatic event emission
/// - [`subscribe()`](Self::subscribe) for listening to state changes
pub struct StateManager {
    state: Arc<RwLock<RunState>>,

    /// Broadcast channel for emitting state change events
    state_tx: broadcast::Sender<StateChange>,
}

impl StateManager {
    /// Create a new StateManager with a broadcast buffer of 256 events
    pub fn new() -> Self {
        let (state_tx, _) = broadcast::channel(256);
        Self {
            state: Arc::new(RwLock::new(RunState::default())),
            state_tx,
        }
    }

    /// Clone of the current state
    pub fn snapshot(&self) -> RunState {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Execute a function with read access to the state
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&RunState) -> R,
    {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        f(&state)
    }

    /// Update the state and emit change events
    ///
    /// Returns the events that were emitted.
    pub fn update<F>(&self, update_fn: F) -> Vec<StateChange>
    where
        F: FnOnce(&mut RunState),
    {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let old_state = state.clone();

        update_fn(&mut state);

        let changes = self.detect_changes(&old_state, &state);
        for change in &changes {
            // No subscribers is fine
            let _ = self.state_tx.send(change.clone());
        }

        changes
    }

    /// Subscribe to state change events
    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.state_tx.subscribe()
    }

    fn emit(&self, change: StateChange, changes: &mut Vec<StateChange>) {
        let _ = self.state_tx.send(change.clone());
        changes.push(change);
    }

    fn detect_changes(&self, old: &RunState, new: &RunState) -> Vec<StateChange> {
        let mut changes = Vec::new();

        if old.is_running != new.is_running {
            if new.is_running {
                changes.push(StateChange::RunStarted {
                    format_name: new.format_name.clone(),
                    total_files: new.total_files,
                });
            } else {
                changes.push(StateChange::RunFinished {
                    changed: new.changed_count,
                    unchanged: new.unchanged_count,
                    excluded: new.excluded_count,
                    failed: new.failed_count,
                });
            }
        }

        if old.progress != new.progress
            || old.total_files != new.total_files
            || old.current_file != new.current_file
        {
            changes.push(StateChange::ProgressUpdated {
                current: new.progress,
                total: new.total_files,
                current_file: new.current_file.clone(),
            });
        }

        if !old.was_cancelled && new.was_cancelled {
            changes.push(StateChange::RunCancelled);
        }

        changes
    }

    /// Start a run over `total_files` candidates (excluded ones included)
    pub fn start_run(&self, format_name: Option<String>, total_files: usize) -> Vec<StateChange> {
        self.update(|state| {
            state.reset();
            state.is_running = true;
            state.format_name = format_name;
            state.total_files = total_files;
        })
    }

    /// Mark a file as being worked on
    pub fn update_progress(&self, path: Utf8PathBuf) -> Vec<StateChange> {
        self.update(|state| {
            state.current_file = Some(path);
        })
    }

    /// Record a file's terminal outcome
    pub fn add_file_result(&self, path: Utf8PathBuf, status: &str) -> Vec<StateChange> {
        let mut changes = self.update(|state| {
            state.add_result(&path, status);
        });

        self.emit(
            StateChange::FileProcessed {
                path,
                status: status.to_string(),
            },
            &mut changes,
        );

        changes
    }

    /// Flag the run as cancelled; files not yet started will be skipped
    pub fn cancel_run(&self) -> Vec<StateChange> {
        self.update(|state| {
            state.was_cancelled = true;
        })
    }

    /// Finish the current run
    pub fn finish_run(&self) -> Vec<StateChange> {
        self.update(|state| {
            state.is_running = false;
            state.current_file = None;
        })
    }
}

impl Default for StateManager {
    fn default() -> Self {
        Self::new()
    }
}

// Clones share the same state and channel
impl Clone for StateManager {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            state_tx: self.state_tx.clone(),
        }
    }
}
