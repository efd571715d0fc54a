//! Default audio parameters per sound object type, and their validation.

use soundscape_common::{ParamValue, Params, SoundObjectType};

fn envelope(params: Params, attack: f64, decay: f64, sustain: f64, release: f64) -> Params {
    params
        .with("attack", attack)
        .with("decay", decay)
        .with("sustain", sustain)
        .with("release", release)
}

fn material(params: Params, color: &str, metalness: f64, roughness: f64) -> Params {
    params
        .with("color", color)
        .with("metalness", metalness)
        .with("roughness", roughness)
}

/// Initial parameter set for a newly placed object of `object_type`.
///
/// Deterministic: the same type always yields the same map.
pub fn default_audio_params(object_type: SoundObjectType) -> Params {
    match object_type {
        SoundObjectType::Cube => {
            let p = Params::new()
                .with("frequency", 220.0)
                .with("volume", 0.6)
                .with("waveform", "sine")
                .with("duration", 1.0);
            material(envelope(p, 0.01, 0.2, 0.5, 1.0), "#4fc3f7", 0.3, 0.4)
        }
        SoundObjectType::Sphere => {
            let p = Params::new()
                .with("frequency", 440.0)
                .with("volume", 0.7)
                .with("waveform", "sine")
                .with("harmonicity", 3.0)
                .with("modulationIndex", 10.0)
                .with("duration", 1.0);
            material(envelope(p, 0.01, 0.3, 0.4, 1.2), "#ba68c8", 0.5, 0.2)
        }
        SoundObjectType::Cylinder => {
            let p = Params::new()
                .with("frequency", 261.63)
                .with("chord", vec![261.63, 329.63, 392.0])
                .with("volume", 0.5)
                .with("waveform", "triangle")
                .with("duration", 1.5);
            material(envelope(p, 0.05, 0.3, 0.6, 1.5), "#81c784", 0.2, 0.5)
        }
        SoundObjectType::Cone => {
            let p = Params::new()
                .with("frequency", 110.0)
                .with("volume", 0.6)
                .with("waveform", "sawtooth")
                .with("filterFrequency", 800.0)
                .with("detune", 0.0)
                .with("duration", 1.0);
            material(envelope(p, 0.02, 0.2, 0.7, 0.8), "#ffb74d", 0.1, 0.6)
        }
        SoundObjectType::Pyramid => {
            let p = Params::new()
                .with("frequency", 330.0)
                .with("volume", 0.6)
                .with("waveform", "square")
                .with("harmonicity", 2.0)
                .with("duration", 1.0);
            material(envelope(p, 0.01, 0.2, 0.5, 1.0), "#e57373", 0.4, 0.3)
        }
        SoundObjectType::Icosahedron => {
            let p = Params::new()
                .with("frequency", 293.66)
                .with("volume", 0.5)
                .with("harmonicity", 1.5)
                .with("vibratoAmount", 0.5)
                .with("vibratoRate", 5.0)
                .with("duration", 1.0);
            material(envelope(p, 0.02, 0.4, 0.5, 1.4), "#4db6ac", 0.6, 0.2)
        }
        SoundObjectType::Plane => {
            let p = Params::new()
                .with("volume", 0.5)
                .with("noiseType", "white")
                .with("duration", 0.2);
            material(envelope(p, 0.005, 0.1, 0.0, 0.2), "#eeeeee", 0.0, 0.9)
        }
        SoundObjectType::Torus => {
            let p = Params::new()
                .with("frequency", 200.0)
                .with("volume", 0.4)
                .with("harmonicity", 5.1)
                .with("modulationIndex", 32.0)
                .with("resonance", 4000.0)
                .with("octaves", 1.5)
                .with("duration", 0.3);
            material(envelope(p, 0.001, 0.4, 0.0, 0.2), "#ffd54f", 0.9, 0.1)
        }
        SoundObjectType::DodecahedronRing => {
            let p = Params::new()
                .with("frequency", 196.0)
                .with("volume", 0.6)
                .with("attackNoise", 1.0)
                .with("dampening", 4000.0)
                .with("resonance", 0.9)
                .with("duration", 1.0);
            material(p, "#9575cd", 0.5, 0.3)
        }
        SoundObjectType::Spiral => {
            let p = Params::new()
                .with("frequency", 261.63)
                .with("volume", 0.6)
                .with("sampleUrl", "/samples/default.wav")
                .with("loop", false)
                .with("duration", 2.0);
            material(envelope(p, 0.01, 0.1, 1.0, 1.0), "#f06292", 0.3, 0.4)
        }
    }
}

const FREQUENCY_RANGE: std::ops::RangeInclusive<f64> = 20.0..=20_000.0;

/// Check the fields that have known ranges. Unknown keys are accepted.
///
/// Advisory: callers may mutate without consulting it.
pub fn validate_audio_params(params: &Params) -> bool {
    for (key, value) in params.iter() {
        let ok = match (key, value) {
            (_, ParamValue::Number(n)) if !n.is_finite() => false,
            ("frequency", ParamValue::Number(f)) => FREQUENCY_RANGE.contains(f),
            ("volume" | "sustain", ParamValue::Number(v)) => (0.0..=1.0).contains(v),
            ("attack" | "decay" | "release", ParamValue::Number(v)) => *v >= 0.0,
            ("duration", ParamValue::Number(v)) => *v > 0.0,
            ("harmonicity", ParamValue::Number(v)) => *v > 0.0,
            ("modulationIndex", ParamValue::Number(v)) => *v >= 0.0,
            ("detune", ParamValue::Number(v)) => (-1200.0..=1200.0).contains(v),
            ("chord", ParamValue::List(notes)) => {
                !notes.is_empty() && notes.iter().all(|f| FREQUENCY_RANGE.contains(f))
            }
            (
                "frequency" | "volume" | "sustain" | "attack" | "decay" | "release" | "duration"
                | "harmonicity" | "modulationIndex" | "detune" | "chord",
                _,
            ) => false,
            _ => true,
        };
        if !ok {
            tracing::debug!(key, ?value, "audio parameter out of range");
            return false;
        }
    }
    true
}
