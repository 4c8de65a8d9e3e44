//! Helpers for JSON embedded in model output.

/// Strip a surrounding Markdown code fence (```json ... ```) from model
/// output and return the JSON body.
///
/// Text without a fence is returned trimmed. When the model adds prose around
/// a fenced block, the first fenced block wins.
pub fn extract_json(text: &str) -> &str {
    let trimmed = text.trim();

    if let Some(start) = trimmed.find("```") {
        let after_fence = &trimmed[start + 3..];
        // Skip the language tag line ("json", "JSON", or nothing)
        let body = match after_fence.find('\n') {
            Some(nl) => &after_fence[nl + 1..],
            None => after_fence,
        };
        let body = match body.find("```") {
            Some(end) => &body[..end],
            None => body,
        };
        return body.trim();
    }

    trimmed
}
