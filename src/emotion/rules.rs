// Emotion rule table
// Keyword lists, suggested tools, and UI copy for each supported emotion

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::wellness::WellnessTool;

/// Emotions the suggestion engine can surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Emotion {
    Anxiety,
    Stress,
    Sadness,
    Anger,
    Overwhelmed,
    Lonely,
    Tired,
    Grateful,
    Excited,
}

impl Emotion {
    /// Stable identifier, matching the serialized form.
    pub fn id(&self) -> &'static str {
        match self {
            Emotion::Anxiety => "anxiety",
            Emotion::Stress => "stress",
            Emotion::Sadness => "sadness",
            Emotion::Anger => "anger",
            Emotion::Overwhelmed => "overwhelmed",
            Emotion::Lonely => "lonely",
            Emotion::Tired => "tired",
            Emotion::Grateful => "grateful",
            Emotion::Excited => "excited",
        }
    }
}

/// One detection rule: keywords to look for and what to suggest on a match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmotionRule {
    pub emotion: Emotion,
    pub keywords: Vec<String>,
    pub tool: WellnessTool,
    pub button_text: String,
    pub description: String,
}

impl EmotionRule {
    fn new(
        emotion: Emotion,
        tool: WellnessTool,
        button_text: &str,
        description: &str,
        keywords: &[&str],
    ) -> Self {
        Self {
            emotion,
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
            tool,
            button_text: button_text.to_string(),
            description: description.to_string(),
        }
    }
}

// Keyword lists stay at ten entries or fewer so a single hit in a short
// message still clears the confidence floor.
static DEFAULT_RULES: Lazy<Vec<EmotionRule>> = Lazy::new(|| {
    vec![
        EmotionRule::new(
            Emotion::Anxiety,
            WellnessTool::Breathing,
            "Try a breathing exercise",
            "Slow, guided breathing can ease anxious moments.",
            &[
                "anxious",
                "anxiety",
                "worried",
                "worry",
                "nervous",
                "panic",
                "scared",
                "afraid",
                "on edge",
                "overthinking",
            ],
        ),
        EmotionRule::new(
            Emotion::Stress,
            WellnessTool::Breathing,
            "Take a breathing break",
            "A few minutes of paced breathing can lower stress.",
            &[
                "stressed",
                "stress",
                "pressure",
                "overloaded",
                "tense",
                "burnout",
                "burned out",
                "deadline",
                "cramming",
            ],
        ),
        EmotionRule::new(
            Emotion::Sadness,
            WellnessTool::Journal,
            "Write it out in your journal",
            "Putting feelings into words can soften heavy days.",
            &[
                "sad",
                "feeling down",
                "depressed",
                "crying",
                "cried",
                "unhappy",
                "miserable",
                "hopeless",
                "heartbroken",
                "tearful",
            ],
        ),
        EmotionRule::new(
            Emotion::Anger,
            WellnessTool::Sounds,
            "Cool off with calming sounds",
            "Ambient sound can help the heat of the moment pass.",
            &[
                "angry",
                "anger",
                "furious",
                "frustrated",
                "frustrating",
                "annoyed",
                "irritated",
                "rage",
                "fed up",
            ],
        ),
        EmotionRule::new(
            Emotion::Overwhelmed,
            WellnessTool::Grounding,
            "Ground yourself with 5-4-3-2-1",
            "Grounding brings you back when everything feels like too much.",
            &[
                "overwhelmed",
                "overwhelming",
                "too much",
                "can't cope",
                "cant cope",
                "drowning",
                "swamped",
                "buried in",
            ],
        ),
        EmotionRule::new(
            Emotion::Lonely,
            WellnessTool::Affirmations,
            "Read a few affirmations",
            "Kind words for yourself count, even on isolated days.",
            &[
                "lonely",
                "loneliness",
                "alone",
                "isolated",
                "left out",
                "no friends",
                "by myself",
                "nobody cares",
            ],
        ),
        EmotionRule::new(
            Emotion::Tired,
            WellnessTool::Sounds,
            "Rest with calming sounds",
            "Soft audio can help your mind wind down.",
            &[
                "tired",
                "exhausted",
                "sleepy",
                "fatigued",
                "drained",
                "no energy",
                "worn out",
                "can't sleep",
                "cant sleep",
            ],
        ),
        EmotionRule::new(
            Emotion::Grateful,
            WellnessTool::Journal,
            "Capture it in your journal",
            "Writing down what went well makes gratitude stick.",
            &[
                "grateful",
                "gratitude",
                "thankful",
                "blessed",
                "appreciate",
                "appreciative",
                "thank you",
            ],
        ),
        EmotionRule::new(
            Emotion::Excited,
            WellnessTool::Journal,
            "Journal the good news",
            "Capture the excitement while it is fresh.",
            &[
                "excited",
                "excitement",
                "thrilled",
                "pumped",
                "can't wait",
                "cant wait",
                "looking forward",
                "stoked",
            ],
        ),
    ]
});

/// Built-in rule table used when no custom rules file is configured.
pub fn default_rules() -> &'static [EmotionRule] {
    &DEFAULT_RULES
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rules_cover_all_emotions() {
        let rules = default_rules();
        assert_eq!(rules.len(), 9);
        for emotion in [
            Emotion::Anxiety,
            Emotion::Stress,
            Emotion::Sadness,
            Emotion::Anger,
            Emotion::Overwhelmed,
            Emotion::Lonely,
            Emotion::Tired,
            Emotion::Grateful,
            Emotion::Excited,
        ] {
            assert!(
                rules.iter().any(|r| r.emotion == emotion),
                "missing rule for {:?}",
                emotion
            );
        }
    }

    #[test]
    fn test_keyword_lists_stay_small() {
        // A single match must score at least the 10-point confidence floor.
        for rule in default_rules() {
            assert!(
                rule.keywords.len() <= 10,
                "{:?} has {} keywords",
                rule.emotion,
                rule.keywords.len()
            );
            assert!(!rule.keywords.is_empty());
        }
    }

    #[test]
    fn test_keywords_are_lowercase() {
        for rule in default_rules() {
            for keyword in &rule.keywords {
                assert_eq!(keyword, &keyword.to_lowercase());
            }
        }
    }

    #[test]
    fn test_emotion_id_matches_serde_form() {
        let json = serde_json::to_string(&Emotion::Overwhelmed).unwrap();
        assert_eq!(json, "\"overwhelmed\"");
        assert_eq!(Emotion::Overwhelmed.id(), "overwhelmed");
    }

    #[test]
    fn test_rule_round_trips_through_json() {
        let rule = &default_rules()[0];
        let json = serde_json::to_string(rule).unwrap();
        let back: EmotionRule = serde_json::from_str(&json).unwrap();
        assert_eq!(back.emotion, rule.emotion);
        assert_eq!(back.keywords, rule.keywords);
        assert_eq!(back.tool, rule.tool);
    }
}
