//! Telegram bot.
//!
//! The bot is a thin adapter: every text message and button press goes
//! straight to the [`Interpreter`], and its reply is sent back as-is.

use std::sync::Arc;

use interpreter::Interpreter;
use teloxide::prelude::*;
pub use teloxide::types::UserId;

mod handlers;
mod ui;

/// Platform name under which Telegram chats are linked to users.
pub const PLATFORM: &str = "telegram";

#[derive(Clone)]
pub struct ConfigParameters {
    allowed_users: Option<Vec<UserId>>,
    interpreter: Arc<Interpreter>,
}

pub struct Bot {
    token: String,
    allowed_users: Option<Vec<UserId>>,
    interpreter: Arc<Interpreter>,
}

impl Bot {
    pub fn builder() -> BotBuilder {
        BotBuilder::default()
    }

    pub async fn run(&self) {
        tracing::info!("Starting telegram bot...");

        let bot = teloxide::Bot::new(&self.token);
        let parameters = ConfigParameters {
            allowed_users: self.allowed_users.clone(),
            interpreter: self.interpreter.clone(),
        };

        let handler = dptree::entry()
            .branch(Update::filter_message().endpoint(handlers::handle_message))
            .branch(Update::filter_callback_query().endpoint(handlers::handle_callback));

        Dispatcher::builder(bot, handler)
            .dependencies(dptree::deps![parameters])
            .default_handler(|upd| async move {
                tracing::warn!("Unhandled update: {:?}", upd);
            })
            .error_handler(LoggingErrorHandler::with_custom_text(
                "An error has occurred in the dispatcher",
            ))
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;
    }
}

#[derive(Default)]
pub struct BotBuilder {
    token: String,
    allowed_users: Option<Vec<UserId>>,
    interpreter: Option<Arc<Interpreter>>,
}

impl BotBuilder {
    pub fn token(mut self, token: &str) -> BotBuilder {
        self.token = token.to_string();
        self
    }

    pub fn allowed_users(mut self, allowed_users: Vec<UserId>) -> BotBuilder {
        if !allowed_users.is_empty() {
            self.allowed_users = Some(allowed_users);
        }
        self
    }

    pub fn interpreter(mut self, interpreter: Arc<Interpreter>) -> BotBuilder {
        self.interpreter = Some(interpreter);
        self
    }

    pub fn build(self) -> Result<Bot, String> {
        tracing::info!("Initializing telegram bot...");
        if self.token.trim().is_empty() {
            return Err("telegram token is empty".to_string());
        }
        let interpreter = self
            .interpreter
            .ok_or_else(|| "interpreter not configured".to_string())?;
        Ok(Bot {
            token: self.token,
            allowed_users: self.allowed_users,
            interpreter,
        })
    }
}
