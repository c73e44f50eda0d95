//! Test doubles shared across module tests.

use std::{
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, Ordering},
        Mutex,
    },
};

use async_trait::async_trait;

use crate::{
    config::Config,
    domain::{ChatId, MessageId, MessageRef},
    matcher::Discipline,
    messaging::{
        port::MessagingPort,
        types::{InlineKeyboard, MessagingCapabilities},
    },
    Error, Result,
};

pub(crate) fn test_config() -> Config {
    Config {
        telegram_bot_token: "x".to_string(),
        discipline: Discipline::Counting,
        reply_to_anchor: true,
        initiator_only: true,
        capture_preview_len: 500,
        event_log_path: tmp_path("kiriban-test-events"),
        event_log_json: true,
    }
}

pub(crate) fn tmp_path(prefix: &str) -> PathBuf {
    let ts = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let pid = std::process::id();
    PathBuf::from(format!("/tmp/{prefix}-{pid}-{ts}.log"))
}

/// Records every outbound call; can be switched into a failing mode to test
/// the best-effort delivery policy.
#[derive(Default)]
pub(crate) struct FakeMessenger {
    next_id: Mutex<i32>,
    pub sends: Mutex<Vec<(ChatId, String)>>,
    pub replies: Mutex<Vec<(MessageRef, String)>>,
    pub keyboards: Mutex<Vec<(ChatId, String, InlineKeyboard)>>,
    fail: AtomicBool,
}

impl FakeMessenger {
    fn alloc(&self, chat_id: ChatId) -> MessageRef {
        let mut guard = self.next_id.lock().unwrap();
        *guard += 1;
        MessageRef {
            chat_id,
            message_id: MessageId(*guard),
        }
    }

    fn deliver(&self) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::Delivery("fake outage".to_string()));
        }
        Ok(())
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn sent_texts(&self) -> Vec<String> {
        self.sends.lock().unwrap().iter().map(|(_, t)| t.clone()).collect()
    }

    pub fn reply_texts(&self) -> Vec<String> {
        self.replies.lock().unwrap().iter().map(|(_, t)| t.clone()).collect()
    }

    pub fn reply_targets(&self) -> Vec<MessageRef> {
        self.replies.lock().unwrap().iter().map(|(r, _)| *r).collect()
    }

    pub fn keyboard_sends(&self) -> Vec<(ChatId, String, InlineKeyboard)> {
        self.keyboards.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessagingPort for FakeMessenger {
    fn capabilities(&self) -> MessagingCapabilities {
        MessagingCapabilities {
            supports_html: true,
            supports_edit: true,
            supports_inline_keyboards: true,
            max_message_len: 4096,
        }
    }

    async fn send_html(&self, chat_id: ChatId, html: &str) -> Result<MessageRef> {
        self.deliver()?;
        self.sends.lock().unwrap().push((chat_id, html.to_string()));
        Ok(self.alloc(chat_id))
    }

    async fn reply_html(&self, reply_to: MessageRef, html: &str) -> Result<MessageRef> {
        self.deliver()?;
        self.replies
            .lock()
            .unwrap()
            .push((reply_to, html.to_string()));
        Ok(self.alloc(reply_to.chat_id))
    }

    async fn edit_html(&self, _msg: MessageRef, _html: &str) -> Result<()> {
        self.deliver()
    }

    async fn send_inline_keyboard(
        &self,
        chat_id: ChatId,
        text: &str,
        keyboard: InlineKeyboard,
    ) -> Result<MessageRef> {
        self.deliver()?;
        self.keyboards
            .lock()
            .unwrap()
            .push((chat_id, text.to_string(), keyboard));
        Ok(self.alloc(chat_id))
    }

    async fn answer_callback_query(&self, _callback_id: &str, _text: Option<&str>) -> Result<()> {
        self.deliver()
    }
}
