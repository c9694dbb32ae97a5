//! Execution state machine.
//!
//! One controller per compiler serializes lifecycle entry points: at most
//! one `run` or `watch` is in flight at a time, and `Closed` is terminal.

use parking_lot::Mutex;

use crate::error::CompileError;

/// Lifecycle state of a compiler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ExecState {
    Idle,
    Running,
    Watching,
    Closed,
}

/// Guards the `Idle → Running/Watching → Idle` transitions and the terminal
/// `Closed` state.
pub(crate) struct ExecutionController {
    state: Mutex<ExecState>,
}

impl ExecutionController {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(ExecState::Idle),
        }
    }

    pub(crate) fn begin_run(&self) -> Result<(), CompileError> {
        self.begin(ExecState::Running)
    }

    pub(crate) fn begin_watch(&self) -> Result<(), CompileError> {
        self.begin(ExecState::Watching)
    }

    fn begin(&self, target: ExecState) -> Result<(), CompileError> {
        let mut state = self.state.lock();
        match *state {
            ExecState::Idle => {
                *state = target;
                Ok(())
            }
            ExecState::Closed => Err(CompileError::Closed),
            ExecState::Running | ExecState::Watching => Err(CompileError::AlreadyRunning),
        }
    }

    /// Returns a `Running` or `Watching` compiler to `Idle`.
    pub(crate) fn finish(&self) {
        let mut state = self.state.lock();
        if matches!(*state, ExecState::Running | ExecState::Watching) {
            *state = ExecState::Idle;
        }
    }

    /// Transitions to `Closed`. `Ok(true)` on the first close, `Ok(false)`
    /// when already closed.
    pub(crate) fn close(&self) -> Result<bool, CompileError> {
        let mut state = self.state.lock();
        match *state {
            ExecState::Idle => {
                *state = ExecState::Closed;
                Ok(true)
            }
            ExecState::Closed => Ok(false),
            ExecState::Running | ExecState::Watching => Err(CompileError::AlreadyRunning),
        }
    }
}
