// Crisis keyword detector

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Built-in crisis keyword table. Phrases are matched as plain substrings
/// of the lowercased message; keep every entry lowercase.
const DEFAULT_KEYWORDS: &[&str] = &[
    "suicide",
    "suicidal",
    "kill myself",
    "killing myself",
    "end my life",
    "ending my life",
    "take my own life",
    "want to die",
    "wanna die",
    "wish i was dead",
    "better off dead",
    "no reason to live",
    "end it all",
    "self harm",
    "self-harm",
    "hurt myself",
    "hurting myself",
    "harm myself",
    "cut myself",
    "cutting myself",
];

/// Scans messages for crisis language.
///
/// Matching is deliberately simple: a message is flagged when any keyword
/// appears as a case-insensitive substring. This is a heuristic, not a
/// classifier — a phrase embedded in an unrelated sentence can over-trigger,
/// and paraphrases that avoid every listed phrase will under-trigger. Callers
/// treat a hit as "show helpline resources", never as a diagnosis.
#[derive(Debug, Clone)]
pub struct CrisisDetector {
    keywords: Vec<String>,
}

impl Default for CrisisDetector {
    fn default() -> Self {
        Self {
            keywords: DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect(),
        }
    }
}

impl CrisisDetector {
    /// Build a detector from an explicit keyword list.
    ///
    /// Keywords are lowercased once here so `detect` never allocates for them.
    pub fn with_keywords(keywords: Vec<String>) -> Self {
        Self {
            keywords: keywords.into_iter().map(|k| k.to_lowercase()).collect(),
        }
    }

    /// Load the keyword list from a JSON file (an array of strings).
    ///
    /// This is the seam for swapping the built-in table for an external
    /// source without touching the matching logic.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read crisis keywords file: {}", path.display()))?;

        let keywords: Vec<String> = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse crisis keywords: {}", path.display()))?;

        Ok(Self::with_keywords(keywords))
    }

    /// Return true if the message contains any crisis keyword.
    ///
    /// Empty and whitespace-only messages never match.
    pub fn detect(&self, message: &str) -> bool {
        let message_lower = message.to_lowercase();

        for keyword in &self.keywords {
            if message_lower.contains(keyword.as_str()) {
                tracing::warn!(keyword = %keyword, "Crisis language detected");
                return true;
            }
        }

        false
    }

    /// All keywords currently loaded (for display and the check CLI)
    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }
}
