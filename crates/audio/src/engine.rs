use crate::command::AudioCommand;
use std::sync::{Arc, Mutex};

/// Errors reported by an audio engine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AudioError {
    #[error("audio engine rejected {command}: {reason}")]
    CallFailed {
        command: &'static str,
        reason: String,
    },
    #[error("audio context unavailable ({0:?})")]
    ContextUnavailable(ContextState),
}

/// Lifecycle state of the underlying audio context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextState {
    Suspended,
    Running,
    Closed,
}

/// The audio synthesis/spatialization engine this core keeps in sync.
///
/// Calls are synchronous; an `Err` means the engine did not apply the command.
pub trait AudioEngine {
    fn apply(&mut self, command: &AudioCommand) -> Result<(), AudioError>;

    fn is_context_valid(&self) -> bool;

    fn context_state(&self) -> ContextState;

    fn start_context(&mut self) -> Result<(), AudioError>;
}

/// Engine that accepts and discards everything. Used when running headless.
#[derive(Debug, Default)]
pub struct NullAudioEngine;

impl AudioEngine for NullAudioEngine {
    fn apply(&mut self, _command: &AudioCommand) -> Result<(), AudioError> {
        Ok(())
    }

    fn is_context_valid(&self) -> bool {
        true
    }

    fn context_state(&self) -> ContextState {
        ContextState::Running
    }

    fn start_context(&mut self) -> Result<(), AudioError> {
        Ok(())
    }
}

/// Engine double that records every command it receives and can be told to
/// fail specific commands.
///
/// The log is shared so a test can keep a handle after the engine has been
/// boxed into a facade.
#[derive(Debug, Clone)]
pub struct RecordingAudioEngine {
    log: Arc<Mutex<Vec<AudioCommand>>>,
    failing: Vec<&'static str>,
    state: ContextState,
    start_fails: bool,
}

impl Default for RecordingAudioEngine {
    fn default() -> Self {
        Self {
            log: Arc::new(Mutex::new(Vec::new())),
            failing: Vec::new(),
            state: ContextState::Running,
            start_fails: false,
        }
    }
}

impl RecordingAudioEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every command whose [`AudioCommand::name`] equals `command`.
    /// Failed commands are still recorded.
    pub fn failing_on(mut self, command: &'static str) -> Self {
        self.failing.push(command);
        self
    }

    pub fn with_context_state(mut self, state: ContextState) -> Self {
        self.state = state;
        self
    }

    pub fn with_failing_start(mut self) -> Self {
        self.start_fails = true;
        self
    }

    /// Shared handle to the received-command log.
    pub fn log_handle(&self) -> Arc<Mutex<Vec<AudioCommand>>> {
        Arc::clone(&self.log)
    }

    /// Copy of every command received so far.
    pub fn received(&self) -> Vec<AudioCommand> {
        self.log.lock().map(|l| l.clone()).unwrap_or_default()
    }
}

impl AudioEngine for RecordingAudioEngine {
    fn apply(&mut self, command: &AudioCommand) -> Result<(), AudioError> {
        if let Ok(mut log) = self.log.lock() {
            log.push(command.clone());
        }
        if self.failing.contains(&command.name()) {
            return Err(AudioError::CallFailed {
                command: command.name(),
                reason: "injected failure".into(),
            });
        }
        Ok(())
    }

    fn is_context_valid(&self) -> bool {
        self.state == ContextState::Running
    }

    fn context_state(&self) -> ContextState {
        self.state
    }

    fn start_context(&mut self) -> Result<(), AudioError> {
        if self.start_fails || self.state == ContextState::Closed {
            return Err(AudioError::ContextUnavailable(self.state));
        }
        self.state = ContextState::Running;
        Ok(())
    }
}
