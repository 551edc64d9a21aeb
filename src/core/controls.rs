use super::passes::PassId;

#[derive(Clone, Debug, PartialEq)]
pub enum KeyAction {
    TogglePlayback,
    Nudge {
        pass: PassId,
        name: &'static str,
        delta: f32,
    },
    Repopulate,
    ProbeDepth,
    ToggleOverlay,
}

const BLOOM_STEP: f32 = 0.1;
const ABERRATION_STEP: f32 = 0.0005;
const BLUR_STEP: f32 = 1.0;

/// Map a `KeyboardEvent.key` value to an action.
pub fn action_for_key(key: &str) -> Option<KeyAction> {
    let nudge = |pass, name, delta| Some(KeyAction::Nudge { pass, name, delta });
    match key {
        " " | "Spacebar" => Some(KeyAction::TogglePlayback),
        "[" => nudge(PassId::Bloom, "strength", -BLOOM_STEP),
        "]" => nudge(PassId::Bloom, "strength", BLOOM_STEP),
        ";" => nudge(PassId::Chromatic, "strength", -ABERRATION_STEP),
        "'" => nudge(PassId::Chromatic, "strength", ABERRATION_STEP),
        "-" => nudge(PassId::DepthBlur, "max_blur_size", -BLUR_STEP),
        "=" | "+" => nudge(PassId::DepthBlur, "max_blur_size", BLUR_STEP),
        "r" | "R" => Some(KeyAction::Repopulate),
        "d" | "D" => Some(KeyAction::ProbeDepth),
        "h" | "H" => Some(KeyAction::ToggleOverlay),
        _ => None,
    }
}
