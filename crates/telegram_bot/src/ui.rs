use interpreter::Button;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

/// Buttons this short share a single row.
const SHORT_LABEL: usize = 12;
const MAX_ROW: usize = 3;

/// Slash commands mapped to the phrase the interpreter understands.
pub(crate) fn command_text(text: &str) -> Option<&'static str> {
    let command = text.trim().split_whitespace().next()?;
    let command = command.strip_prefix('/')?;
    let command = command.split('@').next().unwrap_or(command);
    match command.to_lowercase().as_str() {
        "start" => Some("hola"),
        "help" | "ayuda" => Some("ayuda"),
        "menu" => Some("menu"),
        "cancel" | "cancelar" => Some("cancelar"),
        "saldo" => Some("saldo"),
        "resumen" => Some("resumen del mes"),
        _ => None,
    }
}

pub(crate) fn keyboard(buttons: &[Button]) -> Option<InlineKeyboardMarkup> {
    if buttons.is_empty() {
        return None;
    }
    let button = |b: &Button| InlineKeyboardButton::callback(b.label.clone(), b.token.clone());
    let compact = buttons.len() <= MAX_ROW
        && buttons
            .iter()
            .all(|b| b.label.chars().count() <= SHORT_LABEL);

    let rows: Vec<Vec<InlineKeyboardButton>> = if compact {
        vec![buttons.iter().map(button).collect()]
    } else {
        buttons.iter().map(|b| vec![button(b)]).collect()
    };
    Some(InlineKeyboardMarkup::new(rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn button(label: &str, token: &str) -> Button {
        Button {
            label: label.to_string(),
            token: token.to_string(),
        }
    }

    #[test]
    fn commands_map_to_phrases() {
        assert_eq!(command_text("/start"), Some("hola"));
        assert_eq!(command_text("/cancelar@chanchito_bot"), Some("cancelar"));
        assert_eq!(command_text("/unknown"), None);
        assert_eq!(command_text("gasté 500"), None);
    }

    #[test]
    fn short_buttons_share_a_row() {
        let kb = keyboard(&[
            button("Sí", "confirm:yes"),
            button("No", "confirm:no"),
            button("Editar", "confirm:edit"),
        ])
        .unwrap();
        assert_eq!(kb.inline_keyboard.len(), 1);
        assert_eq!(kb.inline_keyboard[0].len(), 3);
    }

    #[test]
    fn long_lists_get_a_row_each() {
        let kb = keyboard(&[
            button("Banco Galicia Sueldo", "pick:1"),
            button("Banco Galicia Ahorro", "pick:2"),
        ])
        .unwrap();
        assert_eq!(kb.inline_keyboard.len(), 2);
        assert!(keyboard(&[]).is_none());
    }
}
