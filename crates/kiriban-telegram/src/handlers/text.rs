use std::sync::Arc;

use teloxide::prelude::*;

use kiriban_core::{
    domain::{ChatId, MessageId, UserId},
    messaging::types::InboundMessage,
};

use crate::handlers::display_name;
use crate::router::AppState;

pub async fn handle_text(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(user) = msg.from() else {
        return Ok(());
    };
    let Some(text) = msg.text() else {
        return Ok(());
    };

    let inbound = InboundMessage {
        chat_id: ChatId(msg.chat.id.0),
        message_id: MessageId(msg.id.0),
        author_id: UserId(user.id.0 as i64),
        author: display_name(user),
        is_bot: user.is_bot,
        text: text.to_string(),
    };

    state.router.handle_message(inbound).await;
    Ok(())
}
