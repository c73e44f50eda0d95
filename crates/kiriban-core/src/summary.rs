//! Rendering of all user-facing game text (announcements, hit replies,
//! status reports, finalization summaries).

use crate::{
    formatting::{escape_html, message_link, truncate_text},
    session::{CapturedEntry, ChannelSession},
};

fn join_targets(targets: &[u64]) -> String {
    targets
        .iter()
        .map(|n| n.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn render_announcement(topic: &str, targets: &[u64]) -> String {
    format!(
        "🎯 <b>Game on!</b>\n\n\
         📌 Topic: <b>{}</b>\n\
         📍 Target numbers: <b>{}</b>\n\n\
         Only user messages in this chat are counted.",
        escape_html(topic),
        join_targets(targets),
    )
}

pub fn render_hit(target: u64, entry: &CapturedEntry, preview_len: usize) -> String {
    let mut out = format!(
        "📍 <b>Number {target} taken!</b>\n\n\
         By: <b>{}</b>\n\
         Message:\n{}",
        escape_html(&entry.author),
        escape_html(&truncate_text(&entry.content, preview_len)),
    );
    if let Some(link) = message_link(entry.message) {
        out.push_str(&format!("\n\n🔗 <a href=\"{link}\">jump to message</a>"));
    }
    out
}

pub fn render_status(session: &ChannelSession) -> String {
    let next = session
        .next_target()
        .map(|n| n.to_string())
        .unwrap_or_else(|| "none".to_string());
    let remaining = session.remaining_targets();
    let remaining = if remaining.is_empty() {
        "none".to_string()
    } else {
        join_targets(&remaining)
    };

    format!(
        "📄 <b>Session status</b>\n\n\
         Topic: <b>{}</b>\n\
         Count so far: <b>{}</b>\n\
         Next target: <b>{next}</b>\n\
         Remaining: {remaining}\n\
         Started: {}",
        escape_html(&session.topic),
        session.count,
        session.started_at.format("%Y-%m-%d %H:%M UTC"),
    )
}

/// Finalization summary, one line per target in ascending target order.
///
/// Targets without a captured entry are skipped rather than treated as an
/// error; at completion time there are none by invariant.
pub fn render_summary(
    topic: &str,
    targets: &[u64],
    fixed: &[(u64, CapturedEntry)],
    preview_len: usize,
) -> String {
    let mut out = format!("🏁 <b>All numbers taken — {}</b>\n", escape_html(topic));
    for target in targets {
        let Some((_, entry)) = fixed.iter().find(|(n, _)| n == target) else {
            continue;
        };
        out.push_str(&format!(
            "\n<b>{target}</b> — {}: {}",
            escape_html(&entry.author),
            escape_html(&truncate_text(&entry.content, preview_len)),
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ChatId, MessageId, MessageRef, UserId};

    fn entry(author: &str, content: &str, id: i32) -> CapturedEntry {
        CapturedEntry {
            author: author.to_string(),
            content: content.to_string(),
            message: MessageRef {
                chat_id: ChatId(-1001234567890),
                message_id: MessageId(id),
            },
        }
    }

    #[test]
    fn announcement_lists_topic_and_targets() {
        let text = render_announcement("best <pizza>", &[10, 15]);
        assert!(text.contains("best &lt;pizza&gt;"));
        assert!(text.contains("10, 15"));
    }

    #[test]
    fn hit_reply_names_target_author_content_and_link() {
        let text = render_hit(10, &entry("alice", "here!", 55), 500);
        assert!(text.contains("Number 10"));
        assert!(text.contains("alice"));
        assert!(text.contains("here!"));
        assert!(text.contains("https://t.me/c/1234567890/55"));
    }

    #[test]
    fn hit_reply_omits_link_when_unavailable() {
        let mut e = entry("alice", "here!", 55);
        e.message.chat_id = ChatId(12345);
        let text = render_hit(10, &e, 500);
        assert!(!text.contains("t.me"));
    }

    #[test]
    fn summary_orders_by_target_ascending_and_skips_missing() {
        // Hit order is insertion order; the summary must re-order by target
        // and silently skip targets that were never captured.
        let fixed = vec![(15, entry("bob", "late", 2)), (10, entry("alice", "first", 1))];
        let text = render_summary("t", &[10, 15, 99], &fixed, 500);

        let pos_10 = text.find("<b>10</b>").unwrap();
        let pos_15 = text.find("<b>15</b>").unwrap();
        assert!(pos_10 < pos_15);
        assert!(!text.contains("<b>99</b>"));
    }

    #[test]
    fn status_reports_next_and_remaining() {
        let mut s = ChannelSession::new(
            ChatId(1),
            "topic".to_string(),
            vec![2, 5],
            UserId(7),
        );
        s.count = 1;
        let text = render_status(&s);
        assert!(text.contains("Next target: <b>2</b>"));
        assert!(text.contains("Remaining: 2, 5"));
        assert!(text.contains("Count so far: <b>1</b>"));
    }
}
