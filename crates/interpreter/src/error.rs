//! Errors surfaced by the interpreter.
//!
//! None of these ever reach the chat adapter: the orchestrator turns each of
//! them into a user-facing reply. [`Validation`] carries text that is already
//! meant for the user.
//!
//!  [`Validation`]: InterpreterError::Validation
use ledger::LedgerError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum InterpreterError {
    #[error("message not understood (confidence {0:.2})")]
    ClassificationAmbiguous(f64),
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Persistence(#[from] LedgerError),
    #[error("conversation state was modified concurrently")]
    StateConflict,
    #[error("external service error: {0}")]
    External(String),
}

impl InterpreterError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

impl From<reqwest::Error> for InterpreterError {
    fn from(err: reqwest::Error) -> Self {
        Self::External(err.to_string())
    }
}

pub type ResultInterpreter<T> = Result<T, InterpreterError>;
