use log::{info, warn};
use std::sync::Arc;
use teloxide::{
    dispatching::{Dispatcher, UpdateFilterExt},
    dptree,
    error_handlers::LoggingErrorHandler,
    prelude::*,
    types::Update,
    utils::command::{BotCommands, ParseError},
};

use crate::error::BotError;
use crate::relay::{Relay, OPERATION_CANCELLED};

#[derive(BotCommands, Clone, Debug, PartialEq)]
#[command(rename_rule = "lowercase", description = "These commands are supported:")]
pub enum Command {
    #[command(description = "start over and show the mode keyboard")]
    Start,
    #[command(description = "ask GPT regardless of the current mode", parse_with = whole_text)]
    Gpt(String),
    #[command(
        description = "draw a picture regardless of the current mode",
        parse_with = whole_text
    )]
    Image(String),
    #[command(description = "forget the conversation history")]
    Clear,
    #[command(description = "list the available models")]
    Models,
}

/// Hands everything after the command to the variant, even when empty.
fn whole_text(input: String) -> Result<(String,), ParseError> {
    Ok((input,))
}

/// Long-polls Telegram until Ctrl-C.
pub async fn run(bot: Bot, relay: Arc<Relay>) {
    let handler = dptree::entry()
        .branch(
            Update::filter_message()
                .branch(
                    dptree::entry()
                        .filter_command::<Command>()
                        .endpoint(command_handler),
                )
                .branch(
                    dptree::filter(|msg: Message| {
                        msg.text().is_some_and(|text| !text.starts_with('/'))
                    })
                    .endpoint(text_handler),
                ),
        )
        .branch(Update::filter_callback_query().endpoint(cancel_handler));

    info!("Starting dispatcher with long polling");
    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![relay])
        .default_handler(|upd| async move {
            log::debug!("Unhandled update: {:?}", upd.kind);
        })
        .error_handler(LoggingErrorHandler::with_custom_text(
            "Error in update handler",
        ))
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
    warn!("Dispatcher stopped");
}

fn sender(msg: &Message) -> (u64, String) {
    msg.from
        .as_ref()
        .map(|user| (user.id.0, user.first_name.clone()))
        .unwrap_or_else(|| (msg.chat.id.0.unsigned_abs(), String::new()))
}

async fn command_handler(msg: Message, cmd: Command, relay: Arc<Relay>) -> Result<(), BotError> {
    let chat = msg.chat.id.0;
    let (user, first_name) = sender(&msg);
    info!("Command from user {user}: {cmd:?}");

    match cmd {
        Command::Start => relay.start(chat, user, &first_name).await,
        Command::Gpt(args) => relay.gpt_command(chat, user, &args).await,
        Command::Image(args) => relay.image_command(chat, &args).await,
        Command::Clear => relay.clear(chat, user).await,
        Command::Models => relay.list_models(chat).await,
    }
}

async fn text_handler(msg: Message, relay: Arc<Relay>) -> Result<(), BotError> {
    let Some(text) = msg.text() else {
        return Ok(());
    };
    let (user, _) = sender(&msg);
    relay.handle_text(msg.chat.id.0, user, text).await
}

async fn cancel_handler(bot: Bot, query: CallbackQuery) -> Result<(), BotError> {
    bot.answer_callback_query(query.id.clone()).await?;
    if let Some(message) = &query.message {
        bot.edit_message_text(message.chat().id, message.id(), OPERATION_CANCELLED)
            .await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_parsing() {
        assert_eq!(
            Command::parse("/gpt tell me a joke", "freegpt_bot").unwrap(),
            Command::Gpt("tell me a joke".to_string())
        );
        assert_eq!(
            Command::parse("/image", "freegpt_bot").unwrap(),
            Command::Image(String::new())
        );
        assert_eq!(Command::parse("/models", "freegpt_bot").unwrap(), Command::Models);
        assert!(Command::parse("/unknown", "freegpt_bot").is_err());
    }
}
