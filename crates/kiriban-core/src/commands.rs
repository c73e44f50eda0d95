//! Control-plane command handling: start / stop / status / menu / help.

use std::sync::Arc;

use tracing::warn;

use crate::{
    config::Config,
    domain::{ChatId, UserId},
    journal::{GameEvent, Journal},
    messaging::{
        port::MessagingPort,
        types::{InlineButton, InlineKeyboard},
    },
    session::{parse_targets, SessionStore},
    summary, Error, Result,
};

/// Callback payloads for the menu buttons.
pub const CALLBACK_STOP: &str = "game:stop";
pub const CALLBACK_STATUS: &str = "game:status";

const USAGE: &str = "🎲 <b>kiriban</b>\n\n\
    /game &lt;targets&gt; &lt;topic&gt; — start a session, e.g. <code>/game 10,15 best pizza topping</code>\n\
    /stop — end the current session\n\
    /status — show progress\n\
    /menu — button menu";

pub struct CommandController {
    cfg: Arc<Config>,
    store: Arc<SessionStore>,
    messenger: Arc<dyn MessagingPort>,
    journal: Arc<Journal>,
}

impl CommandController {
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

    /// `/game <targets> <topic...>`: create a session, replacing any running
    /// one, and announce it. The announcement becomes the session anchor.
    pub async fn start_game(&self, chat_id: ChatId, invoker: UserId, args: &str) {
        if let Err(err) = self.try_start(chat_id, invoker, args).await {
            self.send_feedback(chat_id, &user_feedback(&err)).await;
        }
    }

    async fn try_start(&self, chat_id: ChatId, invoker: UserId, args: &str) -> Result<()> {
        let (targets_raw, topic) = split_start_args(args);
        let topic = if topic.is_empty() { "(no topic)" } else { topic };
        let targets = parse_targets(targets_raw)?;
        self.store
            .start(chat_id, topic, targets.clone(), invoker)
            .await?;

        self.journal_write(GameEvent::session_started(
            chat_id.0, invoker.0, topic, &targets,
        ));

        let announcement = summary::render_announcement(topic, &targets);
        match self.messenger.send_html(chat_id, &announcement).await {
            Ok(anchor) => self.store.set_anchor(chat_id, anchor).await,
            // The session stays valid without an anchor; hit replies then
            // thread to the matching message instead.
            Err(e) => warn!("announcement delivery failed: {e}"),
        }
        Ok(())
    }

    /// `/stop`: remove the session. Idempotent when none is running.
    pub async fn stop_game(&self, chat_id: ChatId, invoker: UserId) {
        match self.try_stop(chat_id, invoker).await {
            Ok(true) => self.send_feedback(chat_id, "⏹ Session stopped.").await,
            Ok(false) => self.send_feedback(chat_id, "No session running.").await,
            Err(err) => self.send_feedback(chat_id, &user_feedback(&err)).await,
        }
    }

    async fn try_stop(&self, chat_id: ChatId, invoker: UserId) -> Result<bool> {
        self.authorize(chat_id, invoker).await?;
        let removed = self.store.stop(chat_id).await;
        if removed {
            self.journal_write(GameEvent::session_stopped(chat_id.0, invoker.0));
        }
        Ok(removed)
    }

    /// `/status`: read-only progress report. Never mutates the session.
    pub async fn status(&self, chat_id: ChatId, invoker: UserId) {
        match self.try_status(chat_id, invoker).await {
            Ok(text) => self.send_feedback(chat_id, &text).await,
            Err(err) => self.send_feedback(chat_id, &user_feedback(&err)).await,
        }
    }

    async fn try_status(&self, chat_id: ChatId, invoker: UserId) -> Result<String> {
        self.authorize(chat_id, invoker).await?;
        Ok(match self.store.snapshot(chat_id).await {
            Some(session) => summary::render_status(&session),
            None => "No session running.".to_string(),
        })
    }

    /// `/menu`: inline keyboard with Stop and Status buttons.
    pub async fn menu(&self, chat_id: ChatId, invoker: UserId) {
        if let Err(err) = self.try_menu(chat_id, invoker).await {
            self.send_feedback(chat_id, &user_feedback(&err)).await;
        }
    }

    async fn try_menu(&self, chat_id: ChatId, invoker: UserId) -> Result<()> {
        self.authorize(chat_id, invoker).await?;
        let keyboard = InlineKeyboard::new(vec![
            InlineButton {
                label: "⏹ Stop".to_string(),
                callback_data: CALLBACK_STOP.to_string(),
            },
            InlineButton {
                label: "📄 Status".to_string(),
                callback_data: CALLBACK_STATUS.to_string(),
            },
        ]);
        if let Err(e) = self
            .messenger
            .send_inline_keyboard(chat_id, "⚙ <b>Menu</b>", keyboard)
            .await
        {
            warn!("menu delivery failed: {e}");
        }
        Ok(())
    }

    pub async fn help(&self, chat_id: ChatId) {
        self.send_feedback(chat_id, USAGE).await;
    }

    /// Stop/menu/status are initiator-only when the config says so. Start is
    /// always allowed: a new session replaces the old one outright.
    async fn authorize(&self, chat_id: ChatId, invoker: UserId) -> Result<()> {
        if !self.cfg.initiator_only {
            return Ok(());
        }
        match self.store.initiator(chat_id).await {
            Some(initiator) if initiator != invoker => Err(Error::Unauthorized),
            _ => Ok(()),
        }
    }

    async fn send_feedback(&self, chat_id: ChatId, text: &str) {
        if let Err(e) = self.messenger.send_html(chat_id, text).await {
            warn!("reply delivery failed: {e}");
        }
    }

    fn journal_write(&self, event: GameEvent) {
        if let Err(e) = self.journal.write(event) {
            warn!("journal write failed: {e}");
        }
    }
}

/// First whitespace-separated token is the target list, the rest is the
/// topic.
fn split_start_args(args: &str) -> (&str, &str) {
    let args = args.trim();
    match args.split_once(char::is_whitespace) {
        Some((targets, topic)) => (targets, topic.trim()),
        None => (args, ""),
    }
}

fn user_feedback(err: &Error) -> String {
    match err {
        Error::InvalidTargets(_) => "⚠ Could not read any target numbers. \
             Example: <code>/game 10,15 best pizza topping</code>"
            .to_string(),
        Error::Unauthorized => "Only the player who started this session can do that.".to_string(),
        other => format!("Something went wrong: {other}"),
    }
}
