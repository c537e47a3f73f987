//! Canned small-talk replies checked before any step-specific handling.

/// One keyword rule. Rules are tried in table order; the first keyword that
/// appears in the normalized input as a whole word or phrase wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CannedRule {
    pub keyword: &'static str,
    pub reply: &'static str,
    /// Forces the conversation back to the top-level menu.
    pub resets: bool,
}

const fn rule(keyword: &'static str, reply: &'static str) -> CannedRule {
    CannedRule {
        keyword,
        reply,
        resets: false,
    }
}

pub const CANNED_RULES: &[CannedRule] = &[
    rule("hi", "Hey there! 😊 How can I assist you today?"),
    rule(
        "hello",
        "Hello! Need help registering a complaint or checking status?",
    ),
    rule("how are you", "I'm just a bot, but I'm here to help you! 🤖"),
    rule("thank you", "You're most welcome! 🙏"),
    rule("thanks", "No problem at all! Happy to help. 👍"),
    rule("ok", "Got it! Let me know if you need anything else."),
    rule("okay", "Alright! 😊"),
    rule("bye", "Bye! Take care and have a great day! 👋"),
    CannedRule {
        keyword: "exit",
        reply: "🔄 Conversation reset. Let me know if you want to register or check status again.",
        resets: true,
    },
    rule("goodbye", "Goodbye! Hope to chat again soon. 💬"),
    rule(
        "who are you",
        "I'm your complaint assistant bot. Here to register complaints and check status for you!",
    ),
];

/// `normalized` must already be trimmed and lower-cased.
pub fn match_canned(normalized: &str) -> Option<&'static CannedRule> {
    CANNED_RULES
        .iter()
        .find(|rule| contains_phrase(normalized, rule.keyword))
}

/// Substring match that only counts occurrences not embedded in a longer word,
/// so "ok" matches "ok." but not "broken".
fn contains_phrase(haystack: &str, phrase: &str) -> bool {
    haystack.match_indices(phrase).any(|(start, _)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + phrase.len()..].chars().next();
        !before.is_some_and(|c| c.is_alphanumeric())
            && !after.is_some_and(|c| c.is_alphanumeric())
    })
}
