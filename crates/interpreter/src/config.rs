//! Runtime knobs of the interpreter.
//!
//! Both structs deserialize from the `[interpreter]` and `[llm]` sections of
//! the application settings; every field has a default so partial files work.

use std::time::Duration;

use serde::Deserialize;

/// How an installment purchase total is split across its rows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallmentRounding {
    /// Every row is `round(total / n)`; the sum may drift from the total.
    #[default]
    Even,
    /// Like `Even`, but the last row absorbs the remainder.
    ReconcileLast,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct InterpreterConfig {
    /// Lifetime of a pending conversation, refreshed on every write.
    pub state_ttl_secs: u64,
    /// Below this regex confidence the LLM fallback is consulted.
    pub llm_threshold: f64,
    pub installment_rounding: InstallmentRounding,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            state_ttl_secs: 600,
            llm_threshold: 0.6,
            installment_rounding: InstallmentRounding::Even,
        }
    }
}

impl InterpreterConfig {
    #[must_use]
    pub fn state_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(i64::try_from(self.state_ttl_secs).unwrap_or(i64::MAX / 1000))
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Base URL of an OpenAI-compatible API (`…/v1`).
    pub base_url: String,
    /// The fallback is disabled when no key is configured.
    pub api_key: Option<String>,
    pub model: String,
    pub timeout_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: None,
            model: "gpt-4o-mini".to_string(),
            timeout_ms: 4_000,
        }
    }
}

impl LlmConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.api_key
            .as_deref()
            .is_some_and(|key| !key.trim().is_empty())
    }
}
