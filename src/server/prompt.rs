// System prompt construction for the companion persona
//
// Builds the system instruction sent with every chat request, folding the
// crisis and emotion screening results in as directives for the model.

use crate::emotion::DetectedEmotion;

const PERSONA: &str = "\
You are Solace, a warm and supportive mental-wellness companion for students \
navigating recruitment season. You listen first, validate feelings without \
judgment, and keep replies short and conversational. You are not a therapist \
and you never diagnose; when a conversation needs professional care, you \
gently say so. Avoid toxic positivity and avoid minimizing what the user is \
going through.";

/// Build the system prompt for one chat turn.
///
/// The base persona is always present; crisis and suggestion directives are
/// appended only when the corresponding screening fired.
pub fn build_system_prompt(crisis: bool, suggestions: &[DetectedEmotion]) -> String {
    let mut prompt = String::from(PERSONA);

    if crisis {
        prompt.push_str("\n\n# Crisis directive\n\n");
        prompt.push_str(
            "The user's message may indicate thoughts of self-harm. Respond with \
             empathy and without alarm: acknowledge their pain, remind them they \
             are not alone, and encourage them to reach out to a counselor or \
             crisis line. Do not lecture, and do not change the subject. Helpline \
             numbers are appended to your reply automatically, so do not list \
             them yourself.",
        );
    }

    if !suggestions.is_empty() {
        prompt.push_str("\n\n# Suggested exercises\n\n");
        prompt.push_str(
            "Based on the user's wording, these guided exercises may help. If it \
             fits naturally, mention at most one of them near the end of your \
             reply:\n",
        );
        for suggestion in suggestions {
            prompt.push_str(&format!(
                "- {} ({}): {}\n",
                suggestion.tool.display_name(),
                suggestion.emotion.id(),
                suggestion.description
            ));
        }
    }

    prompt
}
