use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Error returned when a kind name does not match any known variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} {name:?}")]
pub struct ParseKindError {
    pub kind: &'static str,
    pub name: String,
}

macro_rules! named_kinds {
    ($ty:ident, $label:literal, { $($variant:ident => $name:literal),+ $(,)? }) => {
        impl $ty {
            pub const ALL: &'static [$ty] = &[$($ty::$variant),+];

            /// Stable wire name, identical to the serde representation.
            pub fn as_str(self) -> &'static str {
                match self {
                    $($ty::$variant => $name),+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = ParseKindError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($name => Ok($ty::$variant),)+
                    _ => Err(ParseKindError { kind: $label, name: s.to_string() }),
                }
            }
        }
    };
}

/// Placeable sound object archetypes. Each is bound to one synthesizer
/// archetype in the audio engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SoundObjectType {
    Cube,
    Sphere,
    Cylinder,
    Cone,
    Pyramid,
    Icosahedron,
    Plane,
    Torus,
    DodecahedronRing,
    Spiral,
}

named_kinds!(SoundObjectType, "sound object type", {
    Cube => "cube",
    Sphere => "sphere",
    Cylinder => "cylinder",
    Cone => "cone",
    Pyramid => "pyramid",
    Icosahedron => "icosahedron",
    Plane => "plane",
    Torus => "torus",
    DodecahedronRing => "dodecahedronRing",
    Spiral => "spiral",
});

impl SoundObjectType {
    /// Percussion-only types fire one-shots and never sustain a tone.
    pub fn is_percussion_only(self) -> bool {
        matches!(self, Self::Plane | Self::Torus)
    }

    /// Synthesizer archetype the audio engine instantiates for this type.
    pub fn synth_archetype(self) -> &'static str {
        match self {
            Self::Cube => "Synth",
            Self::Sphere => "FMSynth",
            Self::Cylinder => "PolySynth",
            Self::Cone => "MonoSynth",
            Self::Pyramid => "AMSynth",
            Self::Icosahedron => "DuoSynth",
            Self::Plane => "NoiseSynth",
            Self::Torus => "MetalSynth",
            Self::DodecahedronRing => "PluckSynth",
            Self::Spiral => "Sampler",
        }
    }
}

/// Kinematic pattern driving a mobile object.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MovementType {
    Linear,
    #[default]
    Circular,
    Polar,
    Random,
    #[serde(rename = "figure8")]
    Figure8,
    Spiral,
}

named_kinds!(MovementType, "movement type", {
    Linear => "linear",
    Circular => "circular",
    Polar => "polar",
    Random => "random",
    Figure8 => "figure8",
    Spiral => "spiral",
});

/// Global audio effects an effect zone can apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EffectType {
    AutoFilter,
    AutoWah,
    Phaser,
    Distortion,
    FeedbackDelay,
    PingPongDelay,
    Reverb,
    Freeverb,
    JcReverb,
    Chorus,
    Tremolo,
    Vibrato,
    PitchShift,
    FrequencyShifter,
    StereoWidener,
    AutoPanner,
}

named_kinds!(EffectType, "effect type", {
    AutoFilter => "autoFilter",
    AutoWah => "autoWah",
    Phaser => "phaser",
    Distortion => "distortion",
    FeedbackDelay => "feedbackDelay",
    PingPongDelay => "pingPongDelay",
    Reverb => "reverb",
    Freeverb => "freeverb",
    JcReverb => "jcReverb",
    Chorus => "chorus",
    Tremolo => "tremolo",
    Vibrato => "vibrato",
    PitchShift => "pitchShift",
    FrequencyShifter => "frequencyShifter",
    StereoWidener => "stereoWidener",
    AutoPanner => "autoPanner",
});

/// Volume shape of an effect zone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EffectShape {
    #[default]
    Sphere,
    Cube,
}

named_kinds!(EffectShape, "effect shape", {
    Sphere => "sphere",
    Cube => "cube",
});

/// Gizmo mode applied to the selected entity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TransformMode {
    #[default]
    Translate,
    Rotate,
    Scale,
}

named_kinds!(TransformMode, "transform mode", {
    Translate => "translate",
    Rotate => "rotate",
    Scale => "scale",
});
