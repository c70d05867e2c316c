//! Token estimation.
//!
//! Character-based heuristic: ~4 characters per token, never less than one
//! token per message.

use skycast_core::memory::StoredMessage;

/// Estimate the token count for a string.
///
/// `max(1, chars / 4)`, counting characters rather than bytes.
pub fn estimate_tokens(text: &str) -> usize {
    (text.chars().count() / 4).max(1)
}

/// Estimate tokens for one stored message.
pub fn estimate_message_tokens(message: &StoredMessage) -> usize {
    estimate_tokens(&message.content)
}
