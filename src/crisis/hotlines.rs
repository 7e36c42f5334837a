// Crisis helpline resources
// Static text block the chat handler appends when crisis language is detected.

/// Helpline block appended verbatim to responses that triggered crisis
/// detection. Kept as plain text so the UI can render it without markup.
pub const HELPLINE_TEXT: &str = "\
If you are in crisis or thinking about harming yourself, please reach out \
right now — you don't have to carry this alone:

• 988 Suicide & Crisis Lifeline (US): call or text 988
• Crisis Text Line: text HOME to 741741 (US/CA) or 85258 (UK)
• Samaritans (UK & Ireland): 116 123
• International directory: https://findahelpline.com

If you are in immediate danger, call your local emergency number. Campus \
counseling services are also free and confidential for enrolled students.";
