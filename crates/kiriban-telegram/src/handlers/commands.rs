use std::sync::Arc;

use teloxide::prelude::*;

use kiriban_core::domain::{ChatId, UserId};

use crate::router::AppState;

fn parse_command(text: &str) -> (String, String) {
    // Telegram may send `/cmd@botname arg1 ...`
    let mut parts = text.trim().splitn(2, char::is_whitespace);
    let first = parts.next().unwrap_or("").trim();
    let rest = parts.next().unwrap_or("").trim().to_string();

    let cmd = first
        .trim_start_matches('/')
        .split('@')
        .next()
        .unwrap_or("")
        .to_lowercase();

    (cmd, rest)
}

pub async fn handle_command(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(user) = msg.from() else {
        return Ok(());
    };
    if user.is_bot {
        return Ok(());
    }
    let Some(text) = msg.text() else {
        return Ok(());
    };
    let (cmd, args) = parse_command(text);

    let chat_id = ChatId(msg.chat.id.0);
    let invoker = UserId(user.id.0 as i64);

    match cmd.as_str() {
        "game" => state.controller.start_game(chat_id, invoker, &args).await,
        "stop" => state.controller.stop_game(chat_id, invoker).await,
        "status" => state.controller.status(chat_id, invoker).await,
        "menu" => state.controller.menu(chat_id, invoker).await,
        "help" | "start" => state.controller.help(chat_id).await,
        _ => {}
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_slash_and_bot_suffix() {
        assert_eq!(
            parse_command("/game@kiriban_bot 10,15 pizza"),
            ("game".to_string(), "10,15 pizza".to_string())
        );
        assert_eq!(parse_command("/STOP"), ("stop".to_string(), String::new()));
        assert_eq!(
            parse_command("  /status  "),
            ("status".to_string(), String::new())
        );
    }
}
