// Emotion suggestion module
// Public interface for keyword-based emotion detection and tool suggestions

mod engine;
mod rules;

pub use engine::{DetectedEmotion, EmotionEngine};
pub use rules::{default_rules, Emotion, EmotionRule};
