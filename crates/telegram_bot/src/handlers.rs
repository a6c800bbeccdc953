use interpreter::Reply;
use teloxide::{
    prelude::*,
    types::{CallbackQuery, ChatId, ParseMode, User},
};

use crate::{ConfigParameters, PLATFORM, ui};

pub(crate) async fn handle_message(
    bot: Bot,
    msg: Message,
    cfg: ConfigParameters,
) -> ResponseResult<()> {
    if !is_allowed(&cfg, msg.from.as_ref()) {
        return Ok(());
    }
    let Some(from) = msg.from.as_ref() else {
        return Ok(());
    };
    let Some(text) = msg.text() else {
        return Ok(());
    };
    let text = ui::command_text(text).unwrap_or(text);

    let reply = cfg
        .interpreter
        .process_message(PLATFORM, &from.id.0.to_string(), text)
        .await;
    send_reply(&bot, msg.chat.id, reply).await
}

pub(crate) async fn handle_callback(
    bot: Bot,
    q: CallbackQuery,
    cfg: ConfigParameters,
) -> ResponseResult<()> {
    if !is_allowed(&cfg, Some(&q.from)) {
        return Ok(());
    }
    let Some(message) = q.message.as_ref() else {
        return Ok(());
    };
    let chat_id = message.chat().id;

    let _ = bot.answer_callback_query(q.id.clone()).await;
    // Pressed keyboards are spent; a second press would only be stale.
    let _ = bot.edit_message_reply_markup(chat_id, message.id()).await;

    let Some(data) = q.data.as_deref() else {
        return Ok(());
    };
    let reply = cfg
        .interpreter
        .process_callback(PLATFORM, &q.from.id.0.to_string(), data)
        .await;
    send_reply(&bot, chat_id, reply).await
}

/// Send with Markdown, falling back to plain text when Telegram rejects the
/// markup (user-typed names can carry stray `*` or `_`).
async fn send_reply(bot: &Bot, chat_id: ChatId, reply: Reply) -> ResponseResult<()> {
    if !reply.success {
        tracing::debug!(state = ?reply.new_state, "turn ended without success");
    }
    let keyboard = ui::keyboard(&reply.buttons);

    let mut request = bot
        .send_message(chat_id, reply.response_text.clone())
        .parse_mode(ParseMode::Markdown);
    if let Some(kb) = keyboard.clone() {
        request = request.reply_markup(kb);
    }
    if let Err(err) = request.await {
        tracing::warn!(error = %err, "markdown reply rejected, sending plain text");
        let mut request = bot.send_message(chat_id, reply.response_text);
        if let Some(kb) = keyboard {
            request = request.reply_markup(kb);
        }
        request.await?;
    }
    Ok(())
}

fn is_allowed(cfg: &ConfigParameters, from: Option<&User>) -> bool {
    let Some(from) = from else {
        return false;
    };
    match &cfg.allowed_users {
        None => true,
        Some(ids) => ids.contains(&from.id),
    }
}
