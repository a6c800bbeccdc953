//! Alias tables used by the fuzzy matcher and the reference extractor.
//!
//! Each entry maps a word (or short phrase) as users type it to a canonical
//! key expected to appear in the name of the matching account/category.

/// Banks, wallets and card networks.
pub const ACCOUNT_ALIASES: &[(&str, &str)] = &[
    ("mp", "mercadopago"),
    ("mercado pago", "mercadopago"),
    ("mercadopago", "mercadopago"),
    ("meli", "mercadopago"),
    ("bbva", "bbva"),
    ("frances", "bbva"),
    ("galicia", "galicia"),
    ("santander", "santander"),
    ("rio", "santander"),
    ("nacion", "nacion"),
    ("bna", "nacion"),
    ("provincia", "provincia"),
    ("bapro", "provincia"),
    ("macro", "macro"),
    ("ciudad", "ciudad"),
    ("icbc", "icbc"),
    ("hsbc", "hsbc"),
    ("supervielle", "supervielle"),
    ("brubank", "brubank"),
    ("uala", "uala"),
    ("naranja x", "naranja"),
    ("naranja", "naranja"),
    ("lemon", "lemon"),
    ("personal pay", "personal pay"),
    ("modo", "modo"),
    ("efectivo", "efectivo"),
    ("cash", "efectivo"),
    ("billetera", "efectivo"),
    ("visa", "visa"),
    ("master", "mastercard"),
    ("mastercard", "mastercard"),
    ("amex", "american express"),
    ("american", "american express"),
    ("cabal", "cabal"),
];

/// Words that name a credit card on their own ("pagué la visa").
pub const CARD_WORDS: &[&str] = &[
    "visa",
    "master",
    "mastercard",
    "amex",
    "american",
    "cabal",
    "naranja",
];

/// Category synonyms.
pub const CATEGORY_SYNONYMS: &[(&str, &str)] = &[
    ("super", "supermercado"),
    ("chino", "supermercado"),
    ("almacen", "supermercado"),
    ("mercado", "supermercado"),
    ("verduleria", "supermercado"),
    ("nafta", "combustible"),
    ("gasolina", "combustible"),
    ("ypf", "combustible"),
    ("shell", "combustible"),
    ("uber", "transporte"),
    ("cabify", "transporte"),
    ("taxi", "transporte"),
    ("remis", "transporte"),
    ("colectivo", "transporte"),
    ("bondi", "transporte"),
    ("subte", "transporte"),
    ("sube", "transporte"),
    ("tren", "transporte"),
    ("morfi", "comida"),
    ("delivery", "comida"),
    ("rappi", "comida"),
    ("pedidosya", "comida"),
    ("almuerzo", "comida"),
    ("cena", "comida"),
    ("resto", "restaurante"),
    ("restaurant", "restaurante"),
    ("birra", "salidas"),
    ("bar", "salidas"),
    ("boliche", "salidas"),
    ("cine", "salidas"),
    ("luz", "servicios"),
    ("gas", "servicios"),
    ("agua", "servicios"),
    ("internet", "servicios"),
    ("wifi", "servicios"),
    ("celular", "servicios"),
    ("expensas", "vivienda"),
    ("alquiler", "vivienda"),
    ("farmacia", "salud"),
    ("remedios", "salud"),
    ("medico", "salud"),
    ("prepaga", "salud"),
    ("netflix", "suscripciones"),
    ("spotify", "suscripciones"),
    ("gym", "deporte"),
    ("gimnasio", "deporte"),
    ("ropa", "indumentaria"),
    ("zapatillas", "indumentaria"),
    ("salario", "sueldo"),
    ("aguinaldo", "sueldo"),
    ("freelance", "trabajo"),
    ("changa", "trabajo"),
    ("sellos", "impuestos"),
    ("impuesto", "impuestos"),
    ("afip", "impuestos"),
    ("monotributo", "impuestos"),
];

/// Key looked up among expense categories to book stamp tax.
pub const STAMP_TAX_CATEGORY: &str = "impuestos";

/// Whether `word` (normalized) is any alias or canonical key.
#[must_use]
pub fn is_known_vocabulary(word: &str) -> bool {
    ACCOUNT_ALIASES
        .iter()
        .chain(CATEGORY_SYNONYMS)
        .any(|(alias, canonical)| *alias == word || *canonical == word)
}
