use std::{collections::HashMap, sync::Arc};

use teloxide::{dispatching::Dispatcher, dptree, prelude::*, types::BotCommand};

use tokio::sync::{Mutex, OwnedMutexGuard};

use tracing::{info, warn};

use kiriban_core::{
    commands::CommandController, config::Config, journal::Journal,
    messaging::port::MessagingPort, router::MessageRouter, session::SessionStore,
};

use crate::handlers;
use crate::TelegramMessenger;

pub struct AppState {
    pub controller: Arc<CommandController>,
    pub router: Arc<MessageRouter>,
    pub chat_locks: Arc<ChatLocks>,
}

/// Per-chat serialization: one inbound event (command or message) is fully
/// processed, including its outbound sends, before the next one for the same
/// chat begins.
#[derive(Default)]
pub struct ChatLocks {
    inner: Mutex<HashMap<i64, Arc<Mutex<()>>>>,
}

impl ChatLocks {
    pub async fn lock_chat(&self, chat_id: i64) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().await;
            map.entry(chat_id)
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }
}

pub async fn run_polling(cfg: Arc<Config>) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.telegram_bot_token.clone());

    if let Ok(me) = bot.get_me().await {
        info!("kiriban started: @{}", me.username());
    }
    info!(
        discipline = ?cfg.discipline,
        reply_to_anchor = cfg.reply_to_anchor,
        "session matching configured"
    );

    register_commands(&bot).await;

    let messenger: Arc<dyn MessagingPort> = Arc::new(TelegramMessenger::new(bot.clone()));
    let store = Arc::new(SessionStore::new());
    let journal = Arc::new(Journal::new(
        cfg.event_log_path.clone(),
        cfg.event_log_json,
    ));

    let controller = Arc::new(CommandController::new(
        cfg.clone(),
        store.clone(),
        messenger.clone(),
        journal.clone(),
    ));
    let router = Arc::new(MessageRouter::new(cfg, store, messenger, journal));

    let state = Arc::new(AppState {
        controller,
        router,
        chat_locks: Arc::new(ChatLocks::default()),
    });

    let handler = dptree::entry()
        .branch(Update::filter_callback_query().endpoint(handlers::handle_callback))
        .branch(Update::filter_message().endpoint(handlers::handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .build()
        .dispatch()
        .await;

    Ok(())
}

/// Register the command list with Telegram so clients can offer completion.
/// Best-effort; the bot works without it.
async fn register_commands(bot: &Bot) {
    let commands = vec![
        BotCommand::new("game", "start a session: /game <targets> <topic>"),
        BotCommand::new("stop", "end the current session"),
        BotCommand::new("status", "show session progress"),
        BotCommand::new("menu", "button menu"),
        BotCommand::new("help", "how to play"),
    ];
    if let Err(e) = bot.set_my_commands(commands).await {
        warn!("command registration failed: {e}");
    }
}
