// Wellness tool registry
// The fixed set of guided exercises the UI panel knows how to open.

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

/// Identifier of a guided wellness exercise.
///
/// These ids are the contract with the UI panel: suggestion payloads carry
/// one of them, and the panel matches on the string form to decide which
/// exercise to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WellnessTool {
    Breathing,
    Sounds,
    Grounding,
    Journal,
    Pomodoro,
    Bodyscan,
    Visualization,
    Affirmations,
}

impl WellnessTool {
    /// Every tool the UI panel understands, in display order.
    pub const ALL: [WellnessTool; 8] = [
        WellnessTool::Breathing,
        WellnessTool::Sounds,
        WellnessTool::Grounding,
        WellnessTool::Journal,
        WellnessTool::Pomodoro,
        WellnessTool::Bodyscan,
        WellnessTool::Visualization,
        WellnessTool::Affirmations,
    ];

    /// Stable string id (matches the serde form)
    pub fn id(&self) -> &'static str {
        match self {
            WellnessTool::Breathing => "breathing",
            WellnessTool::Sounds => "sounds",
            WellnessTool::Grounding => "grounding",
            WellnessTool::Journal => "journal",
            WellnessTool::Pomodoro => "pomodoro",
            WellnessTool::Bodyscan => "bodyscan",
            WellnessTool::Visualization => "visualization",
            WellnessTool::Affirmations => "affirmations",
        }
    }

    /// Human-readable name for listings
    pub fn display_name(&self) -> &'static str {
        match self {
            WellnessTool::Breathing => "Guided Breathing",
            WellnessTool::Sounds => "Calming Sounds",
            WellnessTool::Grounding => "5-4-3-2-1 Grounding",
            WellnessTool::Journal => "Journal",
            WellnessTool::Pomodoro => "Focus Timer",
            WellnessTool::Bodyscan => "Body Scan",
            WellnessTool::Visualization => "Visualization",
            WellnessTool::Affirmations => "Affirmations",
        }
    }

    /// Short description shown next to the tool in listings
    pub fn description(&self) -> &'static str {
        match self {
            WellnessTool::Breathing => "Slow box-breathing with a visual pacer",
            WellnessTool::Sounds => "Ambient soundscapes for resting or studying",
            WellnessTool::Grounding => "Name five things you can see to come back to now",
            WellnessTool::Journal => "A private space to write feelings down",
            WellnessTool::Pomodoro => "Work in short focused sprints with real breaks",
            WellnessTool::Bodyscan => "Release tension one muscle group at a time",
            WellnessTool::Visualization => "Picture a calm place in guided detail",
            WellnessTool::Affirmations => "Kind words for hard days",
        }
    }
}

/// Affirmation pool served by the affirmations tool.
const AFFIRMATIONS: &[&str] = &[
    "One rejection is a redirection, not a verdict on you.",
    "You are more than your resume.",
    "Progress today can be as small as showing up.",
    "Your pace is allowed to be different from everyone else's.",
    "Interviews measure fit, not worth.",
    "You have gotten through every hard day so far.",
    "Rest is part of the work, not a break from it.",
    "You belong in the rooms you are working toward.",
    "A bad day during recruitment season is still just one day.",
    "The right opportunity needs you at your healthiest, not your busiest.",
    "Asking for help is a skill, and you have it.",
    "You are building a life, not just a career.",
];

/// Pick one affirmation at random.
pub fn random_affirmation() -> &'static str {
    let mut rng = rand::thread_rng();
    AFFIRMATIONS
        .choose(&mut rng)
        .copied()
        .unwrap_or(AFFIRMATIONS[0])
}
