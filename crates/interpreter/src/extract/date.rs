//! Date parsing relative to "today" in the user's calendar.
//!
//! Supported forms: relative keywords (hoy/ayer/anteayer), `dd/mm[/yy[yy]]`,
//! "el 15", "15 de marzo" and a bare month name. Dates never roll forward:
//! a day-of-month that is still ahead this month means last month, a month
//! still ahead this year means last year.

use std::{ops::Range, sync::LazyLock};

use chrono::{Datelike, Days, NaiveDate};
use regex::Regex;

use crate::{
    entities::{QueryPeriod, YearMonth},
    error::{InterpreterError, ResultInterpreter},
    locale::{
        compile,
        keywords::{MONTHS, RELATIVE_DAYS},
    },
    text,
};

const MONTH_ALTERNATION: &str =
    "enero|febrero|marzo|abril|mayo|junio|julio|agosto|septiembre|setiembre|octubre|noviembre|diciembre";

static RELATIVE: LazyLock<Regex> =
    LazyLock::new(|| compile(r"\b(antes de ayer|anteayer|antier|ayer|hoy)\b"));
static NUMERIC: LazyLock<Regex> =
    LazyLock::new(|| compile(r"\b(\d{1,2})/(\d{1,2})(?:/(\d{4}|\d{2}))?\b"));
static DAY_OF_MONTH: LazyLock<Regex> = LazyLock::new(|| {
    compile(&format!(
        r"\b(?:el\s+)?(?:dia\s+)?(\d{{1,2}})\s+de\s+({MONTH_ALTERNATION})(?:\s+(?:de\s+)?(\d{{4}}))?\b"
    ))
});
static LONE_DAY: LazyLock<Regex> =
    LazyLock::new(|| compile(r"\bel\s+(?:dia\s+)?(\d{1,2})\b"));
static MONTH_NAME: LazyLock<Regex> = LazyLock::new(|| {
    compile(&format!(
        r"\b(?:en\s+|de\s+|del\s+mes\s+de\s+)?({MONTH_ALTERNATION})(?:\s+(?:de\s+)?(\d{{4}}))?\b"
    ))
});
static THIS_MONTH: LazyLock<Regex> = LazyLock::new(|| compile(r"\b(este|esta)\s+mes\b"));
static LAST_MONTH: LazyLock<Regex> =
    LazyLock::new(|| compile(r"\b(el\s+)?mes\s+pasado\b|\bel\s+mes\s+anterior\b"));
static THIS_WEEK: LazyLock<Regex> = LazyLock::new(|| compile(r"\besta\s+semana\b"));
static THIS_YEAR: LazyLock<Regex> = LazyLock::new(|| compile(r"\beste\s+ano\b"));

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DateMatch {
    pub date: NaiveDate,
    pub span: Range<usize>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PeriodMatch {
    pub period: QueryPeriod,
    pub span: Range<usize>,
}

pub(crate) fn month_number(name: &str) -> Option<u32> {
    MONTHS
        .iter()
        .find(|(month, _)| *month == name)
        .map(|(_, number)| *number)
}

/// Two-digit years: `< 50` → 2000s, otherwise 1900s.
fn expand_year(raw: &str) -> Option<i32> {
    let year: i32 = raw.parse().ok()?;
    Some(match raw.len() {
        2 if year < 50 => 2000 + year,
        2 => 1900 + year,
        _ => year,
    })
}

/// Month of the current year, or of last year when it is still ahead.
#[must_use]
pub fn past_month(month: u32, today: NaiveDate) -> YearMonth {
    let year = if month > today.month() {
        today.year() - 1
    } else {
        today.year()
    };
    YearMonth { year, month }
}

/// Day of this month, or of last month when it is still ahead.
#[must_use]
pub fn past_day_of_month(day: u32, today: NaiveDate) -> Option<NaiveDate> {
    let this_month = YearMonth::of(today);
    let month = if day > today.day() {
        this_month.add_months(-1)
    } else {
        this_month
    };
    month.day_clamped(day)
}

/// First date in `text` (normalized).
#[must_use]
pub fn extract_date(text: &str, today: NaiveDate) -> Option<DateMatch> {
    if let Some(caps) = NUMERIC.captures(text) {
        let whole = caps.get(0)?;
        let day: u32 = caps.get(1)?.as_str().parse().ok()?;
        let month: u32 = caps.get(2)?.as_str().parse().ok()?;
        let year = match caps.get(3) {
            Some(raw) => expand_year(raw.as_str())?,
            None => today.year(),
        };
        let date = NaiveDate::from_ymd_opt(year, month, day)?;
        return Some(DateMatch {
            date,
            span: whole.range(),
        });
    }

    if let Some(caps) = DAY_OF_MONTH.captures(text) {
        let whole = caps.get(0)?;
        let day: u32 = caps.get(1)?.as_str().parse().ok()?;
        let month = month_number(caps.get(2)?.as_str())?;
        let year_month = match caps.get(3) {
            Some(raw) => YearMonth {
                year: expand_year(raw.as_str())?,
                month,
            },
            None => past_month(month, today),
        };
        return Some(DateMatch {
            date: NaiveDate::from_ymd_opt(year_month.year, year_month.month, day)?,
            span: whole.range(),
        });
    }

    if let Some(found) = RELATIVE.find(text) {
        let offset = RELATIVE_DAYS
            .iter()
            .find(|(word, _)| *word == found.as_str())
            .map(|(_, offset)| *offset)?;
        let date = today.checked_sub_days(Days::new(offset.unsigned_abs()))?;
        return Some(DateMatch {
            date,
            span: found.range(),
        });
    }

    if let Some(caps) = LONE_DAY.captures(text) {
        let whole = caps.get(0)?;
        let day: u32 = caps.get(1)?.as_str().parse().ok()?;
        if (1..=31).contains(&day) {
            return Some(DateMatch {
                date: past_day_of_month(day, today)?,
                span: whole.range(),
            });
        }
    }

    if let Some(caps) = MONTH_NAME.captures(text) {
        let whole = caps.get(0)?;
        let month = month_number(caps.get(1)?.as_str())?;
        let year_month = match caps.get(2) {
            Some(raw) => YearMonth {
                year: expand_year(raw.as_str())?,
                month,
            },
            None => past_month(month, today),
        };
        return Some(DateMatch {
            date: year_month.first_day()?,
            span: whole.range(),
        });
    }

    None
}

/// Query period named in `text` (normalized), for read intents.
#[must_use]
pub fn extract_period(text: &str, today: NaiveDate) -> Option<PeriodMatch> {
    if let Some(found) = THIS_MONTH.find(text) {
        return Some(PeriodMatch {
            period: QueryPeriod::current_month(today)?,
            span: found.range(),
        });
    }
    if let Some(found) = LAST_MONTH.find(text) {
        let mut period = QueryPeriod::month(YearMonth::of(today).add_months(-1))?;
        period.label = format!("el mes pasado ({})", period.label);
        return Some(PeriodMatch {
            period,
            span: found.range(),
        });
    }
    if let Some(found) = THIS_WEEK.find(text) {
        let monday = today.checked_sub_days(Days::new(
            u64::from(today.weekday().num_days_from_monday()),
        ))?;
        return Some(PeriodMatch {
            period: QueryPeriod {
                from: monday,
                to: today.succ_opt()?,
                label: "esta semana".to_string(),
            },
            span: found.range(),
        });
    }
    if let Some(found) = THIS_YEAR.find(text) {
        return Some(PeriodMatch {
            period: QueryPeriod {
                from: NaiveDate::from_ymd_opt(today.year(), 1, 1)?,
                to: NaiveDate::from_ymd_opt(today.year() + 1, 1, 1)?,
                label: format!("{}", today.year()),
            },
            span: found.range(),
        });
    }
    if let Some(caps) = MONTH_NAME.captures(text) {
        let whole = caps.get(0)?;
        let month = month_number(caps.get(1)?.as_str())?;
        let year_month = match caps.get(2) {
            Some(raw) => YearMonth {
                year: expand_year(raw.as_str())?,
                month,
            },
            None => past_month(month, today),
        };
        return Some(PeriodMatch {
            period: QueryPeriod::month(year_month)?,
            span: whole.range(),
        });
    }
    // A single day ("hoy", "ayer", "el 3/10").
    let day = extract_date(text, today)?;
    Some(PeriodMatch {
        period: QueryPeriod {
            from: day.date,
            to: day.date.succ_opt()?,
            label: day.date.format("%d/%m/%Y").to_string(),
        },
        span: day.span,
    })
}

/// Parse a reply that should contain just a date (edit flow).
pub fn parse_date_input(input: &str, today: NaiveDate) -> ResultInterpreter<NaiveDate> {
    let normalized = text::normalize(input);
    let bare = text::bare(&normalized);
    // "15" on its own means a day of month.
    if let Ok(day) = bare.parse::<u32>()
        && (1..=31).contains(&day)
    {
        return past_day_of_month(day, today).ok_or_else(invalid_date);
    }
    extract_date(&normalized, today)
        .map(|found| found.date)
        .ok_or_else(invalid_date)
}

fn invalid_date() -> InterpreterError {
    InterpreterError::validation(
        "No entendí la fecha. Probá con hoy, ayer o una fecha como 15/10.",
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn today() -> NaiveDate {
        day(2026, 10, 18)
    }

    fn date(text: &str) -> Option<NaiveDate> {
        extract_date(text, today()).map(|found| found.date)
    }

    #[test]
    fn relative_keywords() {
        assert_eq!(date("gaste 500 hoy"), Some(today()));
        assert_eq!(date("ayer pague la luz"), Some(day(2026, 10, 17)));
        assert_eq!(date("anteayer"), Some(day(2026, 10, 16)));
        assert_eq!(date("antes de ayer"), Some(day(2026, 10, 16)));
    }

    #[test]
    fn numeric_dates_and_year_pivot() {
        assert_eq!(date("el 3/10"), Some(day(2026, 10, 3)));
        assert_eq!(date("3/10/25"), Some(day(2025, 10, 3)));
        assert_eq!(date("3/10/99"), Some(day(1999, 10, 3)));
        assert_eq!(date("3/10/2024"), Some(day(2024, 10, 3)));
        assert_eq!(date("31/02"), None);
    }

    #[test]
    fn lone_day_rolls_back_when_still_ahead() {
        assert_eq!(date("el 15"), Some(day(2026, 10, 15)));
        assert_eq!(date("el dia 25"), Some(day(2026, 9, 25)));
        assert_eq!(
            extract_date("el 31", day(2026, 10, 5)).map(|f| f.date),
            Some(day(2026, 9, 30))
        );
    }

    #[test]
    fn month_names_roll_the_year_back() {
        assert_eq!(date("en marzo"), Some(day(2026, 3, 1)));
        assert_eq!(date("en diciembre"), Some(day(2025, 12, 1)));
        assert_eq!(date("15 de marzo"), Some(day(2026, 3, 15)));
        assert_eq!(date("el 2 de noviembre"), Some(day(2025, 11, 2)));
        assert_eq!(date("1 de enero de 2024"), Some(day(2024, 1, 1)));
    }

    #[test]
    fn periods() {
        let this_month = extract_period("cuanto gaste este mes", today()).unwrap();
        assert_eq!(this_month.period.from, day(2026, 10, 1));
        assert_eq!(this_month.period.to, day(2026, 11, 1));

        let last = extract_period("el mes pasado", today()).unwrap();
        assert_eq!(last.period.from, day(2026, 9, 1));

        let named = extract_period("gastos de diciembre", today()).unwrap();
        assert_eq!(named.period.from, day(2025, 12, 1));
        assert_eq!(named.period.to, day(2026, 1, 1));

        let yesterday = extract_period("ayer", today()).unwrap();
        assert_eq!(yesterday.period.from, day(2026, 10, 17));
        assert_eq!(yesterday.period.to, day(2026, 10, 18));
    }

    #[test]
    fn date_input() {
        assert_eq!(parse_date_input("ayer", today()).unwrap(), day(2026, 10, 17));
        assert_eq!(parse_date_input("12", today()).unwrap(), day(2026, 10, 12));
        assert!(parse_date_input("cuando sea", today()).is_err());
    }
}
