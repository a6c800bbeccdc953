//! Language-model fallback.
//!
//! Only consulted when the rule classifier is unsure. The model's JSON is
//! untrusted: [`validate`] checks every field and drops whatever does not
//! fit, and [`merge`] lets it fill gaps without overriding what the rules
//! already found.

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use ledger::{Currency, Money};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    config::LlmConfig,
    entities::{EntityRef, ParsedEntities, YearMonth},
    error::{InterpreterError, ResultInterpreter},
    extract::{
        self,
        amount::{MAX_AMOUNT_MAJOR, parse_argentine_number},
        installments::{MAX_INSTALLMENTS, MAX_LIMIT},
    },
    intent::{Intent, IntentClassification},
    ports::{LlmContext, LlmFallback, LlmParse},
};

const MAX_REF_CHARS: usize = 60;
const MAX_NOTE_CHARS: usize = 120;
const MAX_YEARS_BACK: i32 = 5;

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    content: Option<String>,
}

/// OpenAI-compatible chat-completions client in JSON mode.
pub struct HttpLlmClient {
    config: LlmConfig,
    client: Client,
}

impl HttpLlmClient {
    pub fn new(config: LlmConfig) -> ResultInterpreter<Self> {
        let client = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self { config, client })
    }

    fn chat_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }
}

fn system_prompt(context: &LlmContext) -> String {
    let intents: Vec<&str> = Intent::ALL.iter().map(|intent| intent.as_str()).collect();
    format!(
        "Sos el intérprete de un asistente de finanzas personales en español rioplatense. \
         Hoy es {today}. Respondé SOLO un objeto JSON con las claves \
         \"intent\" (una de: {intents}), \"confidence\" (0 a 1) y \"entities\" con \
         amount (número), currency (ARS o USD), category, account, from_account, to_account, \
         target_card (textos tal como los nombra el usuario), date (AAAA-MM-DD), note, \
         installments (entero), limit (entero), statement_month (AAAA-MM) y \
         stamp_tax_amount (número). Omití lo que no aparezca. \
         Cuentas del usuario: {accounts}. Categorías: {categories}.",
        today = context.today,
        intents = intents.join(", "),
        accounts = context.account_names.join(", "),
        categories = context.category_names.join(", "),
    )
}

#[async_trait]
impl LlmFallback for HttpLlmClient {
    async fn parse(&self, text: &str, context: &LlmContext) -> ResultInterpreter<Option<LlmParse>> {
        let Some(api_key) = self.config.api_key.as_deref() else {
            return Ok(None);
        };
        let prompt = system_prompt(context);
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &prompt,
                },
                ChatMessage {
                    role: "user",
                    content: text,
                },
            ],
            temperature: 0.0,
            response_format: ResponseFormat {
                kind: "json_object",
            },
        };

        let response = self
            .client
            .post(self.chat_url())
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(InterpreterError::External(format!("llm answered HTTP {status}")));
        }
        let body: ChatResponse = response.json().await?;
        let Some(content) = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
        else {
            return Ok(None);
        };
        let value: Value = serde_json::from_str(&content)
            .map_err(|err| InterpreterError::External(format!("llm returned bad JSON: {err}")))?;
        Ok(validate(&value, context.today))
    }
}

fn text_field(value: Option<&Value>, max_chars: usize) -> Option<String> {
    let text = value?.as_str()?.trim();
    (!text.is_empty() && text.chars().count() <= max_chars).then(|| text.to_string())
}

fn ref_field(value: Option<&Value>) -> Option<EntityRef> {
    text_field(value, MAX_REF_CHARS).map(EntityRef::text)
}

fn money_field(value: Option<&Value>) -> Option<Money> {
    let money = match value? {
        Value::Number(number) => {
            let major = number.as_f64()?;
            if !major.is_finite() {
                return None;
            }
            Money::new((major * 100.0).round() as i64)
        }
        Value::String(text) => parse_argentine_number(text)?,
        _ => return None,
    };
    (money.is_positive() && money < Money::from_major(MAX_AMOUNT_MAJOR)).then_some(money)
}

fn count_field(value: Option<&Value>, max: u32) -> Option<u32> {
    let count = u32::try_from(value?.as_u64()?).ok()?;
    (1..=max).contains(&count).then_some(count)
}

fn date_field(value: Option<&Value>, today: NaiveDate) -> Option<NaiveDate> {
    let date = NaiveDate::parse_from_str(value?.as_str()?, "%Y-%m-%d").ok()?;
    let oldest = today.year() - MAX_YEARS_BACK;
    (date.year() >= oldest && date <= today.succ_opt()?).then_some(date)
}

fn month_field(value: Option<&Value>) -> Option<YearMonth> {
    let (year, month) = value?.as_str()?.split_once('-')?;
    let year: i32 = year.parse().ok()?;
    let month: u32 = month.parse().ok()?;
    ((1..=12).contains(&month) && (2000..=2100).contains(&year)).then_some(YearMonth { year, month })
}

fn currency_field(value: Option<&Value>) -> Option<Currency> {
    match value?.as_str()?.trim().to_ascii_uppercase().as_str() {
        "ARS" => Some(Currency::Ars),
        "USD" => Some(Currency::Usd),
        _ => None,
    }
}

/// Total validation of the model's answer: every field is type- and
/// range-checked, invalid fields are dropped, an invalid intent or
/// confidence drops the whole answer.
#[must_use]
pub fn validate(value: &Value, today: NaiveDate) -> Option<LlmParse> {
    let object = value.as_object()?;
    let intent = Intent::try_from(object.get("intent")?.as_str()?).ok()?;
    let confidence = object.get("confidence")?.as_f64()?;
    if !(0.0..=1.0).contains(&confidence) {
        return None;
    }

    let empty = serde_json::Map::new();
    let raw = object
        .get("entities")
        .and_then(Value::as_object)
        .unwrap_or(&empty);
    let entities = ParsedEntities {
        amount: money_field(raw.get("amount")),
        currency: currency_field(raw.get("currency")),
        category: ref_field(raw.get("category")),
        account: ref_field(raw.get("account")),
        from_account: ref_field(raw.get("from_account")),
        to_account: ref_field(raw.get("to_account")),
        date: date_field(raw.get("date"), today),
        note: text_field(raw.get("note"), MAX_NOTE_CHARS),
        installments: count_field(raw.get("installments"), MAX_INSTALLMENTS),
        first_installment_date: None,
        limit: count_field(raw.get("limit"), MAX_LIMIT),
        target_card: ref_field(raw.get("target_card")),
        statement_month: month_field(raw.get("statement_month")),
        stamp_tax_amount: money_field(raw.get("stamp_tax_amount")),
        period: None,
    };
    Some(LlmParse {
        intent,
        confidence,
        entities,
    })
}

/// Combine rule and model results.
///
/// The model's intent wins only with a strictly higher confidence; in that
/// case the rule extraction is redone for the new intent. Rule-extracted
/// fields always win over the model's, which only fills gaps.
#[must_use]
pub fn merge(
    message: &str,
    today: NaiveDate,
    classification: IntentClassification,
    entities: ParsedEntities,
    parse: LlmParse,
) -> (IntentClassification, ParsedEntities) {
    let (classification, mut entities) = if parse.intent != Intent::Desconocido
        && parse.confidence > classification.confidence
    {
        let switched = parse.intent != classification.intent;
        let classification = IntentClassification {
            intent: parse.intent,
            confidence: parse.confidence,
            matched_pattern_id: Some("llm".to_string()),
        };
        let entities = if switched {
            extract::extract(message, parse.intent, today)
        } else {
            entities
        };
        (classification, entities)
    } else {
        (classification, entities)
    };
    entities.fill_gaps(parse.entities);
    (classification, entities)
}
