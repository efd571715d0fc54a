use serde::{Deserialize, Serialize};
use soundscape_common::{EffectType, EntityId, Params, SoundObjectType, Vec3};

/// A single call into the audio engine.
///
/// Voice-scoped commands address a sound object by id; effect commands
/// address an effect zone by id and act on the global effect chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AudioCommand {
    /// Register a voice for a sound object.
    CreateSoundSource {
        id: EntityId,
        object_type: SoundObjectType,
        params: Params,
        position: Vec3,
    },
    /// Deregister a voice.
    RemoveSoundSource { id: EntityId },
    UpdateSoundPosition { id: EntityId, position: Vec3 },
    /// Replace the voice parameters with a full (merged) parameter set.
    UpdateSoundParams { id: EntityId, params: Params },
    /// Enter continuous mode.
    StartContinuousSound { id: EntityId, params: Params },
    /// Leave continuous mode or close a gate.
    StopSound { id: EntityId },
    TriggerNoteAttack { id: EntityId, params: Params },
    TriggerNoiseAttack { id: EntityId, params: Params },
    TriggerAttackRelease { id: EntityId, params: Params },
    /// Gate on.
    StartSound { id: EntityId, params: Params },
    CreateGlobalEffect {
        id: EntityId,
        effect_type: EffectType,
        position: Vec3,
    },
    UpdateGlobalEffect { id: EntityId, params: Params },
    RemoveGlobalEffect { id: EntityId },
    SetEffectZoneRadius { id: EntityId, radius: f64 },
    UpdateEffectZonePosition { id: EntityId, position: Vec3 },
    /// Rebuild every registered global effect graph.
    RefreshAllGlobalEffects,
}

impl AudioCommand {
    /// Short name used in logs and failure injection.
    pub fn name(&self) -> &'static str {
        match self {
            Self::CreateSoundSource { .. } => "createSoundSource",
            Self::RemoveSoundSource { .. } => "removeSoundSource",
            Self::UpdateSoundPosition { .. } => "updateSoundPosition",
            Self::UpdateSoundParams { .. } => "updateSoundParams",
            Self::StartContinuousSound { .. } => "startContinuousSound",
            Self::StopSound { .. } => "stopSound",
            Self::TriggerNoteAttack { .. } => "triggerNoteAttack",
            Self::TriggerNoiseAttack { .. } => "triggerNoiseAttack",
            Self::TriggerAttackRelease { .. } => "triggerAttackRelease",
            Self::StartSound { .. } => "startSound",
            Self::CreateGlobalEffect { .. } => "createGlobalEffect",
            Self::UpdateGlobalEffect { .. } => "updateGlobalEffect",
            Self::RemoveGlobalEffect { .. } => "removeGlobalEffect",
            Self::SetEffectZoneRadius { .. } => "setEffectZoneRadius",
            Self::UpdateEffectZonePosition { .. } => "updateEffectZonePosition",
            Self::RefreshAllGlobalEffects => "refreshAllGlobalEffects",
        }
    }

    /// The voice or effect this command addresses, if any.
    pub fn target(&self) -> Option<EntityId> {
        match self {
            Self::CreateSoundSource { id, .. }
            | Self::RemoveSoundSource { id }
            | Self::UpdateSoundPosition { id, .. }
            | Self::UpdateSoundParams { id, .. }
            | Self::StartContinuousSound { id, .. }
            | Self::StopSound { id }
            | Self::TriggerNoteAttack { id, .. }
            | Self::TriggerNoiseAttack { id, .. }
            | Self::TriggerAttackRelease { id, .. }
            | Self::StartSound { id, .. }
            | Self::CreateGlobalEffect { id, .. }
            | Self::UpdateGlobalEffect { id, .. }
            | Self::RemoveGlobalEffect { id }
            | Self::SetEffectZoneRadius { id, .. }
            | Self::UpdateEffectZonePosition { id, .. } => Some(*id),
            Self::RefreshAllGlobalEffects => None,
        }
    }
}
