//! Keyword sets. All entries are in normalized form (lowercase, no accents).

use crate::intent::Intent;

/// Whole-message replies that drop any pending conversation.
pub const RESET: &[&str] = &[
    "cancelar", "cancela", "salir", "reset", "reiniciar", "volver", "stop", "basta", "no", "chau",
];

pub const AFFIRMATIVE: &[&str] = &[
    "si", "sip", "dale", "ok", "okay", "oka", "listo", "confirmar", "confirmo", "confirma",
    "correcto", "perfecto", "de una", "va", "yes", "bueno", "1",
];

pub const NEGATIVE: &[&str] = &["nop", "nah", "cancelo", "no gracias", "2"];

pub const EDIT: &[&str] = &[
    "editar", "edita", "edito", "cambiar", "cambia", "modificar", "modifica", "corregir", "3",
];

/// Messages answered with the help text at low confidence.
pub const GREETINGS: &[&str] = &[
    "hola",
    "holis",
    "holaa",
    "hey",
    "buenas",
    "buen dia",
    "buenos dias",
    "buenas tardes",
    "buenas noches",
    "que tal",
    "gracias",
    "muchas gracias",
    "mil gracias",
    "genial",
    "joya",
    "chau",
];

/// Single-word messages that map straight to an intent with full confidence.
pub const EXACT_TRIGGERS: &[(&str, Intent)] = &[
    ("menu", Intent::Menu),
    ("inicio", Intent::Menu),
    ("opciones", Intent::Menu),
    ("cancelar", Intent::Cancelar),
    ("ayuda", Intent::Ayuda),
    ("help", Intent::Ayuda),
    ("saldo", Intent::ConsultarSaldo),
    ("saldos", Intent::ConsultarSaldo),
    ("movimientos", Intent::UltimosMovimientos),
    ("resumen", Intent::ResumenMes),
];

pub const MONTHS: &[(&str, u32)] = &[
    ("enero", 1),
    ("febrero", 2),
    ("marzo", 3),
    ("abril", 4),
    ("mayo", 5),
    ("junio", 6),
    ("julio", 7),
    ("agosto", 8),
    ("septiembre", 9),
    ("setiembre", 9),
    ("octubre", 10),
    ("noviembre", 11),
    ("diciembre", 12),
];

/// Display names, indexed by month number - 1.
pub const MONTH_NAMES: [&str; 12] = [
    "enero",
    "febrero",
    "marzo",
    "abril",
    "mayo",
    "junio",
    "julio",
    "agosto",
    "septiembre",
    "octubre",
    "noviembre",
    "diciembre",
];

/// Relative day keywords and their offset from today. Longer forms first.
pub const RELATIVE_DAYS: &[(&str, i64)] = &[
    ("antes de ayer", -2),
    ("anteayer", -2),
    ("antier", -2),
    ("ayer", -1),
    ("hoy", 0),
];

/// Amount suffixes and their multiplier over whole pesos. Longer forms first.
pub const AMOUNT_MULTIPLIERS: &[(&str, i64)] = &[
    ("millones", 1_000_000),
    ("millon", 1_000_000),
    ("palos", 1_000_000),
    ("palo", 1_000_000),
    ("lucas", 1_000),
    ("luca", 1_000),
    ("mil", 1_000),
    ("k", 1_000),
];

pub const USD_WORDS: &[&str] = &["usd", "u$s", "us$", "uss", "dolares", "dolar", "verdes"];
pub const ARS_WORDS: &[&str] = &["pesos", "peso", "ars", "mangos"];

/// Vocabulary dropped when a note is synthesized from the leftover words.
pub const NOTE_STOP_WORDS: &[&str] = &[
    // verbs
    "gaste", "gastamos", "gasto", "gastar", "pague", "pagamos", "pago", "pagar", "compre",
    "compramos", "abone", "cobre", "cobramos", "cobro", "recibi", "recibimos", "ingrese",
    "ingreso", "ingresaron", "deposite", "depositaron", "transferi", "transferir",
    "transferencia", "pase", "pasar", "movi", "mande", "envie", "pagaron", "costo", "salio",
    "salieron", "me", "nos", "fue", "fueron", "registra", "registrar", "anota", "anotar",
    // prepositions, articles and fillers
    "a", "al", "de", "del", "desde", "en", "con", "para", "por", "hacia", "el", "la", "los",
    "las", "un", "una", "unos", "unas", "y", "o", "mi", "mis", "su", "que", "lo", "le", "es",
    "este", "esta", "ese", "esa", "dia",
    // dates
    "hoy", "ayer", "anteayer", "antier", "antes", "mes", "pasado", "semana", "ano",
    // money
    "pesos", "peso", "dolares", "dolar", "usd", "ars", "lucas", "luca", "palos", "palo", "mil",
    "millones", "millon", "k", "mangos", "plata",
    // accounts and installments
    "tarjeta", "cuenta", "credito", "debito", "banco", "cuotas", "cuota", "sin", "interes",
    "resumen", "sellos", "impuesto",
];

/// Words that end a free-text reference slice.
pub const REF_BOUNDARIES: &[&str] = &[
    "a", "al", "hacia", "de", "del", "desde", "con", "en", "por", "para", "y", "hoy", "ayer",
    "anteayer", "nota", "que",
];

/// Leading filler dropped from a reference slice.
pub const REF_FILLERS: &[&str] = &[
    "la", "el", "los", "las", "mi", "mis", "cuenta", "caja", "ahorro", "tarjeta", "credito",
    "banco",
];

/// Answers to the balance prompt that ask for every account.
pub const EVERY_ACCOUNT: &[&str] = &[
    "todas", "todos", "todo", "total", "todas las cuentas", "todas mis cuentas",
];

/// Whether the normalized message is exactly `word` once surrounding
/// punctuation is dropped.
#[must_use]
pub fn is_one_of(bare: &str, set: &[&str]) -> bool {
    set.contains(&bare)
}
