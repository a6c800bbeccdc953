//! Argentine-Spanish vocabulary: alias tables, keyword sets, the intent rule
//! table and the response templates. Everything here is plain data.

use chrono_tz::Tz;
use regex::Regex;

pub mod aliases;
pub mod keywords;
pub mod patterns;
pub mod templates;

/// Calendar used to decide what "hoy" means.
pub const TIMEZONE: Tz = chrono_tz::America::Argentina::Buenos_Aires;

/// Compile a pattern from the static tables below.
#[allow(clippy::expect_used)]
pub(crate) fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("static pattern must compile")
}
