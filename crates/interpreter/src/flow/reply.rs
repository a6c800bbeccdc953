//! What a turn hands back to the chat adapter.

use serde::Serialize;

use crate::{
    entities::Field,
    locale::{
        keywords::{AFFIRMATIVE, EDIT, NEGATIVE},
        templates,
    },
    state::{ConversationState, DisambiguationOption},
    text,
};

/// An opaque button: adapters render `label` and send `token` back through
/// `process_callback`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Button {
    pub label: String,
    pub token: String,
}

impl Button {
    fn new(label: impl Into<String>, token: CallbackToken) -> Self {
        Self {
            label: label.into(),
            token: token.to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Reply {
    pub success: bool,
    pub response_text: String,
    pub buttons: Vec<Button>,
    /// State the conversation is left in; `None` when nothing is pending.
    pub new_state: Option<ConversationState>,
}

impl Reply {
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            success: true,
            response_text: text.into(),
            buttons: Vec::new(),
            new_state: None,
        }
    }

    #[must_use]
    pub fn failure(text: impl Into<String>) -> Self {
        Self {
            success: false,
            ..Self::text(text)
        }
    }

    #[must_use]
    pub fn with_buttons(mut self, buttons: Vec<Button>) -> Self {
        self.buttons = buttons;
        self
    }

    #[must_use]
    pub fn in_state(mut self, state: ConversationState) -> Self {
        self.new_state = Some(state);
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Confirmation {
    Yes,
    No,
    Edit,
}

impl Confirmation {
    /// Read a typed answer to the confirmation question.
    #[must_use]
    pub fn parse(message: &str) -> Option<Self> {
        let normalized = text::normalize(message);
        let bare = text::bare(&normalized);
        if AFFIRMATIVE.contains(&bare) {
            Some(Confirmation::Yes)
        } else if NEGATIVE.contains(&bare) {
            Some(Confirmation::No)
        } else if EDIT.contains(&bare) {
            Some(Confirmation::Edit)
        } else {
            None
        }
    }

    const fn as_str(self) -> &'static str {
        match self {
            Confirmation::Yes => "yes",
            Confirmation::No => "no",
            Confirmation::Edit => "edit",
        }
    }
}

/// Button payloads: `confirm:yes|no|edit`, `field:<name>`, `pick:<n>`
/// (1-based).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CallbackToken {
    Confirm(Confirmation),
    Field(Field),
    Pick(usize),
}

impl CallbackToken {
    #[must_use]
    pub fn parse(token: &str) -> Option<Self> {
        let (kind, value) = token.trim().split_once(':')?;
        match kind {
            "confirm" => match value {
                "yes" => Some(CallbackToken::Confirm(Confirmation::Yes)),
                "no" => Some(CallbackToken::Confirm(Confirmation::No)),
                "edit" => Some(CallbackToken::Confirm(Confirmation::Edit)),
                _ => None,
            },
            "field" => Field::try_from(value).ok().map(CallbackToken::Field),
            "pick" => value
                .parse::<usize>()
                .ok()
                .filter(|index| *index > 0)
                .map(CallbackToken::Pick),
            _ => None,
        }
    }
}

impl std::fmt::Display for CallbackToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CallbackToken::Confirm(choice) => write!(f, "confirm:{}", choice.as_str()),
            CallbackToken::Field(field) => write!(f, "field:{}", field.as_str()),
            CallbackToken::Pick(index) => write!(f, "pick:{index}"),
        }
    }
}

/// A turn's input once the adapter is out of the way.
#[derive(Clone, Copy, Debug)]
pub enum Input<'a> {
    Text(&'a str),
    Callback(CallbackToken),
}

#[must_use]
pub fn confirm_buttons() -> Vec<Button> {
    vec![
        Button::new(templates::BUTTON_YES, CallbackToken::Confirm(Confirmation::Yes)),
        Button::new(templates::BUTTON_NO, CallbackToken::Confirm(Confirmation::No)),
        Button::new(templates::BUTTON_EDIT, CallbackToken::Confirm(Confirmation::Edit)),
    ]
}

#[must_use]
pub fn field_buttons(fields: &[Field]) -> Vec<Button> {
    fields
        .iter()
        .map(|field| Button::new(field.label(), CallbackToken::Field(*field)))
        .collect()
}

#[must_use]
pub fn pick_buttons(options: &[DisambiguationOption]) -> Vec<Button> {
    options
        .iter()
        .enumerate()
        .map(|(index, option)| {
            let label = match &option.icon {
                Some(icon) => format!("{icon} {}", option.display_name),
                None => option.display_name.clone(),
            };
            Button::new(label, CallbackToken::Pick(index + 1))
        })
        .collect()
}
