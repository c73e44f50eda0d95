use std::sync::Arc;

use teloxide::prelude::*;

use kiriban_core::{
    commands::{CALLBACK_STATUS, CALLBACK_STOP},
    domain::{ChatId, UserId},
};

use crate::router::AppState;

/// Menu button presses. The callback data routes straight back into the
/// controller, so the buttons and the slash commands share one code path.
pub async fn handle_callback(
    bot: Bot,
    q: CallbackQuery,
    state: Arc<AppState>,
) -> ResponseResult<()> {
    let cb_id = q.id.clone();

    let (Some(data), Some(menu_msg)) = (q.data.as_deref(), q.message.as_ref()) else {
        let _ = bot.answer_callback_query(cb_id).await;
        return Ok(());
    };

    let chat_id = ChatId(menu_msg.chat.id.0);
    let invoker = UserId(q.from.id.0 as i64);

    let _guard = state.chat_locks.lock_chat(chat_id.0).await;

    match data {
        CALLBACK_STOP => {
            state.controller.stop_game(chat_id, invoker).await;
            // Mark the menu message consumed so the buttons read as spent.
            let _ = bot
                .edit_message_text(menu_msg.chat.id, menu_msg.id, "✓ Stop")
                .await;
        }
        CALLBACK_STATUS => {
            state.controller.status(chat_id, invoker).await;
        }
        _ => {}
    }

    let _ = bot.answer_callback_query(cb_id).await;
    Ok(())
}
