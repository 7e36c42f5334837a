// Emotion suggestion engine
// Scores messages against the rule table and picks wellness tool suggestions

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use super::rules::{default_rules, Emotion, EmotionRule};
use crate::wellness::WellnessTool;

/// Candidates scoring below this are dropped.
const CONFIDENCE_FLOOR: f64 = 10.0;

/// At most this many suggestions are returned per message.
const MAX_SUGGESTIONS: usize = 2;

/// One surfaced suggestion, ready to serialize into a chat response.
#[derive(Debug, Clone, Serialize)]
pub struct DetectedEmotion {
    pub emotion: Emotion,
    pub confidence: f64,
    pub tool: WellnessTool,
    pub button_text: String,
    pub description: String,
}

/// Scores incoming messages against a rule table.
pub struct EmotionEngine {
    rules: Vec<EmotionRule>,
}

impl Default for EmotionEngine {
    fn default() -> Self {
        Self::with_rules(default_rules().to_vec())
    }
}

impl EmotionEngine {
    /// Create an engine with a custom rule table.
    pub fn with_rules(rules: Vec<EmotionRule>) -> Self {
        Self { rules }
    }

    /// Load a rule table from a JSON file.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read emotion rules from {}", path.display()))?;
        let rules: Vec<EmotionRule> = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse emotion rules in {}", path.display()))?;
        Ok(Self::with_rules(rules))
    }

    /// Score a message and return up to two suggestions, highest confidence
    /// first, with at most one suggestion per wellness tool.
    pub fn suggestions(&self, message: &str) -> Vec<DetectedEmotion> {
        let message_lower = message.to_lowercase();
        let word_count = message_lower.split_whitespace().count().max(1);

        let mut candidates: Vec<DetectedEmotion> = Vec::new();
        for rule in &self.rules {
            let matched = rule
                .keywords
                .iter()
                .filter(|keyword| message_lower.contains(keyword.as_str()))
                .count();
            if matched == 0 {
                continue;
            }

            // Confidence is capped both by how much of the keyword list hit
            // and by how much of the message the hits account for.
            let keyword_ratio = matched as f64 * 100.0 / rule.keywords.len() as f64;
            let length_ratio = matched as f64 * 100.0 / word_count as f64;
            let confidence = keyword_ratio.min(length_ratio);

            candidates.push(DetectedEmotion {
                emotion: rule.emotion,
                confidence,
                tool: rule.tool,
                button_text: rule.button_text.clone(),
                description: rule.description.clone(),
            });
        }

        // Stable sort keeps rule-table order for equal scores.
        candidates.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

        let mut seen_tools: HashSet<WellnessTool> = HashSet::new();
        let suggestions: Vec<DetectedEmotion> = candidates
            .into_iter()
            .filter(|c| c.confidence >= CONFIDENCE_FLOOR)
            .filter(|c| seen_tools.insert(c.tool))
            .take(MAX_SUGGESTIONS)
            .collect();

        if !suggestions.is_empty() {
            tracing::debug!(
                count = suggestions.len(),
                top = %suggestions[0].emotion.id(),
                "Emotion suggestions selected"
            );
        }

        suggestions
    }

    /// Rules currently in use.
    pub fn rules(&self) -> &[EmotionRule] {
        &self.rules
    }
}
