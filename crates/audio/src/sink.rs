use crate::command::AudioCommand;
use crate::engine::{AudioEngine, AudioError, ContextState};

/// Destination for audio commands emitted by store mutations.
pub trait AudioSink {
    fn send(&mut self, command: AudioCommand);
}

/// Recording sink. Commands accumulate in emission order until drained.
#[derive(Debug, Clone, Default)]
pub struct Outbox {
    commands: Vec<AudioCommand>,
}

impl Outbox {
    /// Empty outbox.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pending commands, oldest first.
    pub fn commands(&self) -> &[AudioCommand] {
        &self.commands
    }

    /// Drain and return all pending commands.
    pub fn drain(&mut self) -> Vec<AudioCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Names of the recorded commands, in order.
    pub fn names(&self) -> Vec<&'static str> {
        self.commands.iter().map(AudioCommand::name).collect()
    }
}

impl AudioSink for Outbox {
    fn send(&mut self, command: AudioCommand) {
        self.commands.push(command);
    }
}

/// Dispatch counters for the bridge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AudioStats {
    pub dispatched: usize,
    pub failures: usize,
}

/// Sink that forwards each command to a live engine as soon as it is sent.
///
/// Engine failures are logged and counted; the caller's state mutation stands.
pub struct AudioBridge {
    engine: Box<dyn AudioEngine>,
    stats: AudioStats,
}

impl AudioBridge {
    /// Bridge to `engine` with zeroed counters.
    pub fn new(engine: Box<dyn AudioEngine>) -> Self {
        Self {
            engine,
            stats: AudioStats::default(),
        }
    }

    /// Dispatch counters since construction.
    pub fn stats(&self) -> AudioStats {
        self.stats
    }

    /// State of the engine's audio context.
    pub fn context_state(&self) -> ContextState {
        self.engine.context_state()
    }

    /// Start the audio context if it is not already running.
    pub fn ensure_context(&mut self) -> Result<ContextState, AudioError> {
        if self.engine.is_context_valid() {
            return Ok(self.engine.context_state());
        }
        tracing::info!(state = ?self.engine.context_state(), "starting audio context");
        self.engine.start_context()?;
        Ok(self.engine.context_state())
    }
}

impl AudioSink for AudioBridge {
    fn send(&mut self, command: AudioCommand) {
        match self.engine.apply(&command) {
            Ok(()) => {
                self.stats.dispatched += 1;
                tracing::trace!(command = command.name(), "audio command dispatched");
            }
            Err(err) => {
                self.stats.failures += 1;
                tracing::warn!(
                    command = command.name(),
                    target = ?command.target(),
                    error = %err,
                    "audio engine call failed, local state kept"
                );
            }
        }
    }
}

impl std::fmt::Debug for AudioBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioBridge")
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}
