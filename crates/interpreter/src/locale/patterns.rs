//! Intent rule table.
//!
//! Rules run against normalized text. A rule hit contributes
//! `0.7 × weight` plus a length bonus (see `intent::rule_score`); the
//! adjustment pass in `intent` runs afterwards.

use std::sync::LazyLock;

use regex::Regex;

use super::compile;
use crate::intent::Intent;

#[derive(Debug)]
pub struct IntentRule {
    pub id: &'static str,
    pub intent: Intent,
    pub weight: f64,
    pub pattern: Regex,
}

const RULES: &[(&str, Intent, f64, &str)] = &[
    // writes
    (
        "gasto.verbo",
        Intent::RegistrarGasto,
        1.0,
        r"\b(gaste|gastamos|pague|pagamos|compre|compramos|abone|garpe)\b.*",
    ),
    (
        "gasto.costo",
        Intent::RegistrarGasto,
        0.9,
        r"\b(me costo|nos costo|salio|salieron)\b.*",
    ),
    (
        "gasto.cuotas",
        Intent::RegistrarGasto,
        0.8,
        r"\b\d+\s*(cuotas?)\b.*",
    ),
    (
        "ingreso.verbo",
        Intent::RegistrarIngreso,
        1.0,
        r"\b(cobre|cobramos|recibi|recibimos|me pagaron|nos pagaron|me depositaron|me transfirieron|me entraron|me entro|gane|vendi)\b.*",
    ),
    (
        "ingreso.sueldo",
        Intent::RegistrarIngreso,
        0.8,
        r"\b(sueldo|aguinaldo|honorarios)\b.*",
    ),
    (
        "transferencia.verbo",
        Intent::Transferencia,
        1.0,
        r"\b(transferi|transferir|transferime|transferencia|pase|pasar|pasa|movi|mover|mande|envie)\b.*",
    ),
    (
        "tarjeta.pago",
        Intent::PagarTarjeta,
        1.2,
        r"\bpag(ue|ar|o|amos)\s+(el\s+)?(resumen\s+(de\s+|del\s+)?)?(la\s+|el\s+|mi\s+)?(tarjeta|visa|master|mastercard|amex|american|cabal|naranja)\b.*",
    ),
    (
        "tarjeta.pago_monto",
        Intent::PagarTarjeta,
        1.2,
        r"\bpag(ue|ar|o|amos)\s+\$?\s*[\d.,]+\s*(k|lucas|mil)?\s+(de\s+|a\s+)?(la\s+|el\s+|mi\s+)?(tarjeta|visa|master|mastercard|amex|american|cabal|naranja)\b.*",
    ),
    (
        "tarjeta.resumen",
        Intent::PagarTarjeta,
        1.2,
        r"\bpag(ue|ar|o|amos)\s+(el\s+)?resumen\b.*",
    ),
    // reads
    (
        "saldo.palabra",
        Intent::ConsultarSaldo,
        1.0,
        r"\b(saldo|saldos|balance)\b.*",
    ),
    (
        "saldo.cuanto",
        Intent::ConsultarSaldo,
        1.0,
        r"\bcuanto\s+(tengo|hay|me queda|queda|tenemos)\b.*",
    ),
    (
        "saldo.plata",
        Intent::ConsultarSaldo,
        0.9,
        r"\bcuanta\s+plata\b.*",
    ),
    (
        "gastos.cuanto",
        Intent::ConsultarGastos,
        1.0,
        r"\bcuanto\s+(gaste|gastamos|gasto|llevo gastado|gastado)\b.*",
    ),
    (
        "gastos.listado",
        Intent::ConsultarGastos,
        0.9,
        r"\b(mis\s+)?gastos\s+(de|del|en|este|esta)\b.*",
    ),
    (
        "ingresos.cuanto",
        Intent::ConsultarIngresos,
        1.0,
        r"\bcuanto\s+(cobre|gane|ingreso|ingresos|entro|me entro|cobramos)\b.*",
    ),
    (
        "ingresos.listado",
        Intent::ConsultarIngresos,
        0.9,
        r"\b(mis\s+)?ingresos\s+(de|del|este|esta)\b.*",
    ),
    (
        "movimientos.ultimos",
        Intent::UltimosMovimientos,
        1.1,
        r"\b(ultimos|ultimas)\s+(\d+\s+)?(movimientos|gastos|operaciones|transacciones)\b.*",
    ),
    (
        "movimientos.palabra",
        Intent::UltimosMovimientos,
        0.9,
        r"\b(movimientos|historial)\b.*",
    ),
    (
        "resumen.mes",
        Intent::ResumenMes,
        1.1,
        r"\bresumen\s+(del\s+|de\s+)?(mes|mensual|este mes|mes pasado)\b.*",
    ),
    (
        "resumen.como_vengo",
        Intent::ResumenMes,
        0.9,
        r"\bcomo\s+(vengo|voy|estoy|venimos)\b.*",
    ),
    (
        "resumen.balance_mes",
        Intent::ResumenMes,
        1.2,
        r"\bbalance\s+(del|de este)\s+mes\b.*",
    ),
    // meta
    (
        "ayuda.palabra",
        Intent::Ayuda,
        1.0,
        r"\b(ayuda|help|que podes hacer|que sabes hacer|como funciona|comandos)\b",
    ),
    ("menu.palabra", Intent::Menu, 1.0, r"\b(menu|opciones)\b"),
    (
        "cancelar.palabra",
        Intent::Cancelar,
        1.0,
        r"\b(cancelar|cancela|anular|olvidalo|dejalo)\b",
    ),
];

pub static INTENT_RULES: LazyLock<Vec<IntentRule>> = LazyLock::new(|| {
    RULES
        .iter()
        .map(|(id, intent, weight, pattern)| IntentRule {
            id,
            intent: *intent,
            weight: *weight,
            pattern: compile(pattern),
        })
        .collect()
});

/// "de/desde X ... a/hacia Y" anywhere in the message.
pub static TRANSFER_DIRECTION: LazyLock<Regex> =
    LazyLock::new(|| compile(r"\b(de|desde)\b.+\b(a|hacia)\b"));

/// "cuánto gast-" / "cuánto cobr-".
pub static HOW_MUCH_SPENT: LazyLock<Regex> = LazyLock::new(|| compile(r"\bcuanto\s+gast"));
pub static HOW_MUCH_EARNED: LazyLock<Regex> = LazyLock::new(|| compile(r"\bcuanto\s+(cobr|gan)"));

/// Messages with no letter or digit at all (emoji, punctuation).
#[must_use]
pub fn is_symbols_only(normalized: &str) -> bool {
    !normalized.chars().any(char::is_alphanumeric)
}
