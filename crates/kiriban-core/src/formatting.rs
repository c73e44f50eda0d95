//! Outbound text utilities (HTML escaping, permalinks, truncation).

use crate::domain::MessageRef;

/// Escape HTML special characters for Telegram HTML parse mode.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Public t.me permalink for a message, when the chat kind supports one.
///
/// Supergroup/channel chat ids are `-100` followed by the internal id; those
/// map to `https://t.me/c/<internal>/<message_id>`. Private and basic-group
/// chats have no stable permalink, so the reply threading itself is the only
/// back-reference there.
pub fn message_link(msg: MessageRef) -> Option<String> {
    let id = msg.chat_id.0;
    let internal = id.checked_neg()?.checked_sub(1_000_000_000_000)?;
    if internal <= 0 {
        return None;
    }
    Some(format!("https://t.me/c/{internal}/{}", msg.message_id.0))
}

pub fn truncate_text(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        return s.to_string();
    }
    let mut out = s.chars().take(max_len).collect::<String>();
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ChatId, MessageId};

    #[test]
    fn escapes_html_specials() {
        assert_eq!(escape_html("<b> & \"q\""), "&lt;b&gt; &amp; &quot;q&quot;");
    }

    #[test]
    fn links_supergroup_messages() {
        let msg = MessageRef {
            chat_id: ChatId(-1001234567890),
            message_id: MessageId(55),
        };
        assert_eq!(
            message_link(msg).as_deref(),
            Some("https://t.me/c/1234567890/55")
        );
    }

    #[test]
    fn no_link_for_private_or_basic_group_chats() {
        let private = MessageRef {
            chat_id: ChatId(12345),
            message_id: MessageId(1),
        };
        assert_eq!(message_link(private), None);

        let basic_group = MessageRef {
            chat_id: ChatId(-12345),
            message_id: MessageId(1),
        };
        assert_eq!(message_link(basic_group), None);
    }

    #[test]
    fn truncate_adds_ellipsis_only_when_needed() {
        assert_eq!(truncate_text("short", 10), "short");
        assert_eq!(truncate_text("abcdef", 3), "abc...");
    }
}
