//! Natural-language bookkeeping for chat platforms.
//!
//! Messages in Argentine Spanish ("gasté 500 en comida con mercadopago")
//! become ledger writes after a short confirmation dialogue, or read-only
//! answers. [`Interpreter`] is the only entry point adapters need.

pub mod config;
pub mod entities;
pub mod error;
pub mod executor;
pub mod extract;
pub mod flow;
pub mod fuzzy;
pub mod intent;
pub mod llm;
pub mod locale;
pub mod orchestrator;
pub mod ports;
pub mod state;
pub mod text;

pub use config::{InstallmentRounding, InterpreterConfig, LlmConfig};
pub use error::{InterpreterError, ResultInterpreter};
pub use flow::reply::{Button, Reply};
pub use intent::{Intent, IntentClassification};
pub use llm::HttpLlmClient;
pub use orchestrator::{Interpreter, InterpreterBuilder};
pub use ports::{
    ConversationStore, IdentityRepository, LedgerRepository, LlmContext, LlmFallback, LlmParse,
};
pub use state::ConversationState;
