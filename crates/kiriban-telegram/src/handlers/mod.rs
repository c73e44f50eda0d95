//! Telegram update handlers.
//!
//! Each handler is a small adapter: map teloxide types into core types,
//! then call into the controller or router.

use std::sync::Arc;

use teloxide::{
    prelude::*,
    types::{CallbackQuery, Message, User},
};

use crate::router::AppState;

mod callback;
mod commands;
mod text;

pub async fn handle_callback(
    bot: Bot,
    q: CallbackQuery,
    state: Arc<AppState>,
) -> ResponseResult<()> {
    callback::handle_callback(bot, q, state).await
}

pub async fn handle_message(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let chat_id = msg.chat.id.0;
    let Some(text) = msg.text() else {
        // Non-text updates (photos, stickers, joins) are not match input.
        return Ok(());
    };

    if text.starts_with('/') {
        let _guard = state.chat_locks.lock_chat(chat_id).await;
        return commands::handle_command(msg, state).await;
    }

    let _guard = state.chat_locks.lock_chat(chat_id).await;
    text::handle_text(msg, state).await
}

/// Display-name precedence, evaluated once per captured entry: prefer the
/// chat-facing full name, fall back to the global @username.
pub(crate) fn display_name(user: &User) -> String {
    let full = user.full_name();
    if !full.trim().is_empty() {
        return full;
    }
    match &user.username {
        Some(u) => format!("@{u}"),
        None => "unknown".to_string(),
    }
}
