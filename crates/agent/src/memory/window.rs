//! Token-budget trimming of conversation history.

use super::token::estimate_message_tokens;
use skycast_core::memory::StoredMessage;

/// History that fits the prompt budget.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextWindow {
    /// Kept messages, oldest first
    pub messages: Vec<StoredMessage>,
    pub used_tokens: usize,
    /// Empty unless older messages were left out
    pub warning: String,
}

impl ContextWindow {
    pub fn dropped_any(&self) -> bool {
        !self.warning.is_empty()
    }
}

/// Keep the newest contiguous run of `messages` whose estimated tokens fit
/// in `max_tokens`.
///
/// Walks newest to oldest and stops at the first message that does not fit,
/// so the kept messages are always a suffix of the input.
pub fn manage_context_window(messages: &[StoredMessage], max_tokens: usize) -> ContextWindow {
    let mut used_tokens = 0;
    let mut keep_from = messages.len();

    for (i, message) in messages.iter().enumerate().rev() {
        let cost = estimate_message_tokens(message);
        if used_tokens + cost > max_tokens {
            break;
        }
        used_tokens += cost;
        keep_from = i;
    }

    let dropped = keep_from;
    let warning = if dropped > 0 {
        format!("⚠️ Context window limit reached: {dropped} older message(s) left out.")
    } else {
        String::new()
    };

    ContextWindow {
        messages: messages[keep_from..].to_vec(),
        used_tokens,
        warning,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use skycast_core::message::Role;

    fn history(lengths: &[usize]) -> Vec<StoredMessage> {
        let start = Utc::now();
        lengths
            .iter()
            .enumerate()
            .map(|(i, len)| StoredMessage {
                id: i.to_string(),
                session_id: "s".into(),
                role: if i % 2 == 0 { Role::User } else { Role::Assistant },
                content: "x".repeat(*len),
                timestamp: start + Duration::seconds(i as i64),
            })
            .collect()
    }

    #[test]
    fn within_budget_is_unchanged() {
        let msgs = history(&[40, 40, 40]);
        let window = manage_context_window(&msgs, 30);
        assert_eq!(window.messages, msgs);
        assert_eq!(window.used_tokens, 30);
        assert!(window.warning.is_empty());

        // Applying it again changes nothing.
        assert_eq!(manage_context_window(&window.messages, 30), window);
    }

    #[test]
    fn drops_oldest_first() {
        let msgs = history(&[400, 40, 40]);
        let window = manage_context_window(&msgs, 50);
        assert_eq!(window.messages, msgs[1..].to_vec());
        assert_eq!(window.used_tokens, 20);
        assert!(window.dropped_any());
        assert!(window.warning.contains("1 older"));
    }

    #[test]
    fn stops_at_first_message_that_does_not_fit() {
        // The oldest would fit on its own but the one before it does not.
        let msgs = history(&[4, 400, 40]);
        let window = manage_context_window(&msgs, 50);
        assert_eq!(window.messages.len(), 1);
        assert_eq!(window.messages[0].id, "2");
    }

    #[test]
    fn oversized_newest_message_leaves_nothing() {
        let msgs = history(&[40, 4000]);
        let window = manage_context_window(&msgs, 100);
        assert!(window.messages.is_empty());
        assert_eq!(window.used_tokens, 0);
        assert!(window.dropped_any());
    }

    #[test]
    fn empty_history() {
        let window = manage_context_window(&[], 10);
        assert!(window.messages.is_empty());
        assert!(window.warning.is_empty());
    }

    #[test]
    fn monotonic_in_budget() {
        let msgs = history(&[12, 80, 3, 44, 200, 16, 7, 90]);
        let mut previous = 0;
        for budget in 0..200 {
            let kept = manage_context_window(&msgs, budget).messages.len();
            assert!(kept >= previous, "budget {budget}");
            previous = kept;
        }
        assert_eq!(previous, msgs.len());
    }
}
