//! Data-plane entry point: one inbound text message against the store.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::{
    config::Config,
    domain::MessageRef,
    journal::{GameEvent, Journal},
    messaging::{port::MessagingPort, types::InboundMessage},
    session::{CapturedEntry, MessageEffect, SessionStore},
    summary,
};

pub struct MessageRouter {
    cfg: Arc<Config>,
    store: Arc<SessionStore>,
    messenger: Arc<dyn MessagingPort>,
    journal: Arc<Journal>,
}

impl MessageRouter {
    pub fn new(
        cfg: Arc<Config>,
        store: Arc<SessionStore>,
        messenger: Arc<dyn MessagingPort>,
        journal: Arc<Journal>,
    ) -> Self {
        Self {
            cfg,
            store,
            messenger,
            journal,
        }
    }

    /// Process one inbound message in gateway delivery order. All outbound
    /// sends are best-effort: a delivery failure never corrupts session
    /// state or blocks later matching.
    pub async fn handle_message(&self, msg: InboundMessage) {
        match self.store.apply(self.cfg.discipline, &msg).await {
            MessageEffect::None => {}
            MessageEffect::Advanced { count } => {
                debug!(chat_id = msg.chat_id.0, count, "count advanced");
            }
            MessageEffect::Hit {
                target,
                entry,
                anchor,
            } => {
                self.journal_write(GameEvent::target_hit(
                    msg.chat_id.0,
                    target,
                    &entry.author,
                    &entry.content,
                ));
                self.announce_hit(target, &entry, anchor).await;
            }
            MessageEffect::Completed {
                target,
                entry,
                session,
            } => {
                self.journal_write(GameEvent::target_hit(
                    msg.chat_id.0,
                    target,
                    &entry.author,
                    &entry.content,
                ));
                self.announce_hit(target, &entry, session.anchor).await;

                let text = summary::render_summary(
                    &session.topic,
                    &session.targets,
                    &session.fixed,
                    self.cfg.capture_preview_len,
                );
                if let Err(e) = self.messenger.send_html(msg.chat_id, &text).await {
                    warn!("summary delivery failed: {e}");
                }
                self.journal_write(GameEvent::session_completed(
                    msg.chat_id.0,
                    &session.topic,
                    &session.targets,
                ));
            }
        }
    }

    async fn announce_hit(
        &self,
        target: u64,
        entry: &CapturedEntry,
        anchor: Option<MessageRef>,
    ) {
        let reply_to = if self.cfg.reply_to_anchor {
            anchor.unwrap_or(entry.message)
        } else {
            entry.message
        };
        let text = summary::render_hit(target, entry, self.cfg.capture_preview_len);
        if let Err(e) = self.messenger.reply_html(reply_to, &text).await {
            warn!("hit reply delivery failed: {e}");
        }
    }

    fn journal_write(&self, event: GameEvent) {
        if let Err(e) = self.journal.write(event) {
            warn!("journal write failed: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ChatId, MessageId, UserId};
    use crate::testing::{test_config, tmp_path, FakeMessenger};

    struct Fixture {
        router: MessageRouter,
        store: Arc<SessionStore>,
        messenger: Arc<FakeMessenger>,
    }

    fn fixture(cfg: Config) -> Fixture {
        let store = Arc::new(SessionStore::new());
        let messenger = Arc::new(FakeMessenger::default());
        let journal = Arc::new(Journal::new(tmp_path("kiriban-router-test"), true));
        let router = MessageRouter::new(Arc::new(cfg), store.clone(), messenger.clone(), journal);
        Fixture {
            router,
            store,
            messenger,
        }
    }

    fn message(chat: i64, id: i32, text: &str) -> InboundMessage {
        InboundMessage {
            chat_id: ChatId(chat),
            message_id: MessageId(id),
            author_id: UserId(42),
            author: "alice".to_string(),
            is_bot: false,
            text: text.to_string(),
        }
    }

    #[tokio::test]
    async fn third_message_completes_a_single_target_session() {
        let f = fixture(test_config());
        f.store
            .start(ChatId(1), "t", vec![3], UserId(7))
            .await
            .unwrap();

        f.router.handle_message(message(1, 10, "a")).await;
        f.router.handle_message(message(1, 11, "b")).await;
        assert!(f.messenger.reply_texts().is_empty());

        f.router.handle_message(message(1, 12, "c")).await;

        let replies = f.messenger.reply_texts();
        assert_eq!(replies.len(), 1, "exactly one hit reply");
        assert!(replies[0].contains("Number 3"));
        assert!(replies[0].contains("alice"));

        let sends = f.messenger.sent_texts();
        assert_eq!(sends.len(), 1, "exactly one finalization summary");
        assert!(sends[0].contains("All numbers taken"));

        assert!(f.store.snapshot(ChatId(1)).await.is_none());
    }

    #[tokio::test]
    async fn messages_in_other_chats_do_not_affect_the_session() {
        let f = fixture(test_config());
        f.store
            .start(ChatId(1), "t", vec![2], UserId(7))
            .await
            .unwrap();

        f.router.handle_message(message(2, 10, "a")).await;
        f.router.handle_message(message(2, 11, "b")).await;

        assert_eq!(f.store.snapshot(ChatId(1)).await.unwrap().count, 0);
        assert!(f.messenger.reply_texts().is_empty());
    }

    #[tokio::test]
    async fn bot_messages_do_not_produce_hits() {
        let f = fixture(test_config());
        f.store
            .start(ChatId(1), "t", vec![1], UserId(7))
            .await
            .unwrap();

        let mut msg = message(1, 10, "a");
        msg.is_bot = true;
        f.router.handle_message(msg).await;

        assert_eq!(f.store.snapshot(ChatId(1)).await.unwrap().count, 0);
        assert!(f.messenger.reply_texts().is_empty());
    }

    #[tokio::test]
    async fn stopped_session_ignores_later_messages() {
        let f = fixture(test_config());
        f.store
            .start(ChatId(1), "t", vec![2, 5], UserId(7))
            .await
            .unwrap();

        f.router.handle_message(message(1, 10, "a")).await;
        f.store.stop(ChatId(1)).await;
        f.router.handle_message(message(1, 11, "b")).await;

        assert!(f.store.snapshot(ChatId(1)).await.is_none());
        assert!(f.messenger.reply_texts().is_empty());
    }

    #[tokio::test]
    async fn hit_replies_thread_to_the_anchor_when_configured() {
        let f = fixture(test_config());
        f.store
            .start(ChatId(1), "t", vec![1], UserId(7))
            .await
            .unwrap();
        let anchor = MessageRef {
            chat_id: ChatId(1),
            message_id: MessageId(99),
        };
        f.store.set_anchor(ChatId(1), anchor).await;

        f.router.handle_message(message(1, 10, "a")).await;
        assert_eq!(f.messenger.reply_targets(), vec![anchor]);
    }

    #[tokio::test]
    async fn hit_replies_thread_to_the_matching_message_otherwise() {
        let mut cfg = test_config();
        cfg.reply_to_anchor = false;
        let f = fixture(cfg);
        f.store
            .start(ChatId(1), "t", vec![1], UserId(7))
            .await
            .unwrap();
        let anchor = MessageRef {
            chat_id: ChatId(1),
            message_id: MessageId(99),
        };
        f.store.set_anchor(ChatId(1), anchor).await;

        f.router.handle_message(message(1, 10, "a")).await;
        let targets = f.messenger.reply_targets();
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].message_id, MessageId(10));
    }

    #[tokio::test]
    async fn delivery_failures_never_corrupt_session_state() {
        let f = fixture(test_config());
        f.store
            .start(ChatId(1), "t", vec![1, 2], UserId(7))
            .await
            .unwrap();
        f.messenger.set_failing(true);

        f.router.handle_message(message(1, 10, "a")).await;
        let session = f.store.snapshot(ChatId(1)).await.unwrap();
        assert_eq!(session.fixed.len(), 1, "hit recorded despite failed reply");

        // Matching keeps working, including completion and teardown.
        f.router.handle_message(message(1, 11, "b")).await;
        assert!(f.store.snapshot(ChatId(1)).await.is_none());
    }

    #[tokio::test]
    async fn numeric_discipline_only_reacts_to_matching_numbers() {
        let mut cfg = test_config();
        cfg.discipline = crate::matcher::Discipline::NumericParse;
        let f = fixture(cfg);
        f.store
            .start(ChatId(1), "t", vec![20], UserId(7))
            .await
            .unwrap();

        f.router.handle_message(message(1, 10, "hello")).await;
        f.router.handle_message(message(1, 11, "19")).await;
        assert!(f.messenger.reply_texts().is_empty());

        f.router.handle_message(message(1, 12, "20")).await;
        assert_eq!(f.messenger.reply_texts().len(), 1);
        assert!(f.store.snapshot(ChatId(1)).await.is_none());
    }
}
