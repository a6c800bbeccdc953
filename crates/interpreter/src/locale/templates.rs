//! Response texts.
//!
//! Fixed messages are constants; everything that interpolates values takes
//! already formatted strings so this module never needs the ledger types.

pub const HELP: &str = "Soy tu asistente de gastos 🐷. Podés escribirme cosas como:\n\
• gasté 500 en comida\n\
• cobré el sueldo 800 lucas en galicia\n\
• transferí 10000 de galicia a mp\n\
• compré una tele 300k en 12 cuotas con la visa\n\
• pagué la visa 150000 con galicia\n\
• saldo / saldo de mp\n\
• ¿cuánto gasté en comida este mes?\n\
• últimos 10 movimientos\n\
• resumen del mes\n\
Escribí *cancelar* en cualquier momento para empezar de nuevo.";

pub const MENU: &str = "¿Qué querés hacer?\n\
1. Registrar un gasto\n\
2. Registrar un ingreso\n\
3. Transferir entre cuentas\n\
4. Pagar una tarjeta\n\
5. Ver saldos\n\
6. Ver gastos del mes\n\
7. Últimos movimientos\n\
8. Resumen del mes";

pub const NOT_UNDERSTOOD: &str =
    "No entendí tu mensaje 🤔. Probá con algo como \"gasté 500 en comida\" o escribí *ayuda*.";
pub const CANCELLED: &str = "Listo, cancelé la operación. ¿Algo más?";
pub const NOTHING_TO_CANCEL: &str = "No había nada pendiente. ¿En qué te ayudo?";
pub const UNLINKED: &str = "Todavía no vinculaste este chat con tu cuenta. Entrá a la web y generá un código de vinculación.";
pub const UNVERIFIED: &str =
    "Tu vinculación está pendiente de verificación. Confirmala desde la web para empezar.";
pub const GENERIC_ERROR: &str = "Uy, algo salió mal 😕. Probá de nuevo en un rato.";
pub const STATE_CONFLICT: &str =
    "Me llegaron dos mensajes a la vez y perdí el hilo. Mandame de nuevo tu última respuesta.";
pub const CONFIRM_QUESTION: &str = "¿Lo registro? Respondé *sí*, *no* o *editar*.";
pub const CONFIRM_NOT_UNDERSTOOD: &str = "No te entendí. Respondé *sí* para confirmar, *no* para cancelar o *editar* para cambiar algo.";
pub const EDIT_FIELD_QUESTION: &str = "¿Qué querés cambiar?";
pub const EDIT_FIELD_NOT_UNDERSTOOD: &str =
    "No reconocí el campo. Elegí un número de la lista o escribí su nombre.";
pub const PICK_NOT_UNDERSTOOD: &str = "Elegí un número de la lista.";
pub const BALANCE_WHICH: &str =
    "¿De qué cuenta querés ver el saldo? Elegí una opción o escribí *todas*:";
pub const STALE_BUTTON: &str =
    "Esa opción ya no está disponible. Contame de nuevo qué querés hacer.";
pub const NO_ACCOUNTS: &str =
    "Todavía no tenés cuentas cargadas. Creá una desde la web para empezar.";
pub const NO_CATEGORIES: &str =
    "Todavía no tenés categorías de ese tipo. Creá una desde la web para seguir.";
pub const NO_CARDS: &str = "No tenés tarjetas de crédito cargadas.";
pub const NO_MOVEMENTS: &str = "No encontré movimientos.";
pub const SAME_ACCOUNT: &str =
    "La cuenta de origen y la de destino tienen que ser distintas. Elegí otra cuenta.";
pub const CURRENCY_MISMATCH: &str =
    "Solo puedo transferir entre cuentas de la misma moneda. Elegí otra cuenta.";
pub const BUTTON_YES: &str = "Sí";
pub const BUTTON_NO: &str = "No";
pub const BUTTON_EDIT: &str = "Editar";

#[must_use]
pub fn greeting(name: &str) -> String {
    format!("¡Hola, {name}! 👋 {HELP}")
}

#[must_use]
pub fn ask_amount(action: &str) -> String {
    format!("¿De cuánto fue {action}?")
}

#[must_use]
pub fn ask_pick(what: &str) -> String {
    format!("¿{what}? Elegí una opción:")
}

#[must_use]
pub fn ask_value(label: &str) -> String {
    format!("Escribí el nuevo valor para *{label}*:")
}

#[must_use]
pub fn disambiguation(what: &str, query: &str) -> String {
    format!("Encontré varias opciones para \"{query}\" ({what}). ¿Cuál es?")
}

#[must_use]
pub fn no_match(what: &str, query: &str) -> String {
    format!("No encontré {what} parecida a \"{query}\". Elegí una de la lista:")
}

#[must_use]
pub fn option_line(index: usize, name: &str, detail: Option<&str>) -> String {
    match detail {
        Some(detail) => format!("{index}. {name} ({detail})"),
        None => format!("{index}. {name}"),
    }
}

#[must_use]
pub fn field_line(index: usize, label: &str, value: &str) -> String {
    format!("{index}. {label}: {value}")
}

// ─── Previews ────────────────────────────────────────────────────────────────

#[must_use]
pub fn preview_expense(amount: &str, category: &str, account: &str, date: &str) -> String {
    format!(
        "📝 *Nuevo gasto*\n💵 Monto: {amount}\n🏷️ Categoría: {category}\n🏦 Cuenta: {account}\n📅 Fecha: {date}"
    )
}

#[must_use]
pub fn preview_card_expense(
    amount: &str,
    category: &str,
    card: &str,
    date: &str,
    statement: &str,
) -> String {
    format!(
        "💳 *Nuevo gasto con tarjeta*\n💵 Monto: {amount}\n🏷️ Categoría: {category}\n💳 Tarjeta: {card}\n📅 Fecha: {date}\n🧾 Entra en el resumen de {statement}"
    )
}

#[must_use]
pub fn preview_installments(
    total: &str,
    count: u32,
    each: &str,
    category: &str,
    account: &str,
    date: &str,
    first: &str,
) -> String {
    format!(
        "💳 *Compra en cuotas*\n💵 Total: {total}\n🔢 {count} cuotas de {each}\n🏷️ Categoría: {category}\n💳 Cuenta: {account}\n📅 Fecha de compra: {date}\n🧾 Primera cuota: {first}"
    )
}

#[must_use]
pub fn preview_income(amount: &str, category: &str, account: &str, date: &str) -> String {
    format!(
        "📝 *Nuevo ingreso*\n💵 Monto: {amount}\n🏷️ Categoría: {category}\n🏦 Cuenta: {account}\n📅 Fecha: {date}"
    )
}

#[must_use]
pub fn preview_transfer(amount: &str, from: &str, to: &str, date: &str) -> String {
    format!(
        "🔁 *Transferencia*\n💵 Monto: {amount}\n📤 Desde: {from}\n📥 Hacia: {to}\n📅 Fecha: {date}"
    )
}

#[must_use]
pub fn preview_card_payment(amount: &str, card: &str, from: &str, date: &str) -> String {
    format!(
        "💳 *Pago de tarjeta*\n💵 Monto: {amount}\n💳 Tarjeta: {card}\n🏦 Pagás desde: {from}\n📅 Fecha: {date}"
    )
}

#[must_use]
pub fn statement_line(month: &str) -> String {
    format!("🧾 Resumen: {month}")
}

#[must_use]
pub fn stamp_tax_line(amount: &str, category: &str) -> String {
    format!("🏛️ Impuesto de sellos: {amount} (en {category})")
}

#[must_use]
pub fn stamp_tax_skipped(amount: &str) -> String {
    format!(
        "⚠️ No encontré una categoría de impuestos: los sellos de {amount} no se van a registrar."
    )
}

#[must_use]
pub fn note_line(note: &str) -> String {
    format!("🗒️ Nota: {note}")
}

// ─── Results ─────────────────────────────────────────────────────────────────

#[must_use]
pub fn expense_saved(amount: &str, category: &str, balance: Option<&str>) -> String {
    match balance {
        Some(balance) => {
            format!("✅ Registré el gasto de {amount} en {category}.\nSaldo de la cuenta: {balance}")
        }
        None => format!("✅ Registré el gasto de {amount} en {category}."),
    }
}

#[must_use]
pub fn installments_saved(count: u32, each: &str, first: &str) -> String {
    format!("✅ Registré la compra en {count} cuotas de {each}. La primera cae el {first}.")
}

#[must_use]
pub fn income_saved(amount: &str, category: &str, balance: Option<&str>) -> String {
    match balance {
        Some(balance) => {
            format!("✅ Registré el ingreso de {amount} en {category}.\nSaldo de la cuenta: {balance}")
        }
        None => format!("✅ Registré el ingreso de {amount} en {category}."),
    }
}

#[must_use]
pub fn transfer_saved(amount: &str, from: &str, to: &str) -> String {
    format!("✅ Transferí {amount} de {from} a {to}.")
}

#[must_use]
pub fn card_payment_saved(amount: &str, card: &str, from: &str) -> String {
    format!("✅ Registré el pago de {amount} de {card} desde {from}.")
}

#[must_use]
pub fn stamp_tax_saved(amount: &str) -> String {
    format!("🏛️ También registré {amount} de impuesto de sellos.")
}

#[must_use]
pub fn stamp_tax_failed(amount: &str) -> String {
    format!(
        "⚠️ El pago quedó registrado, pero no pude anotar los sellos de {amount}. Cargalos aparte como un gasto, sin repetir el pago."
    )
}

// ─── Queries ─────────────────────────────────────────────────────────────────

pub const BALANCES_HEADER: &str = "💰 *Tus saldos*";

#[must_use]
pub fn balance_line(name: &str, amount: &str) -> String {
    format!("• {name}: {amount}")
}

#[must_use]
pub fn balance_total(amount: &str) -> String {
    format!("*Total:* {amount}")
}

#[must_use]
pub fn single_balance(name: &str, amount: &str) -> String {
    format!("💰 Saldo de {name}: {amount}")
}

#[must_use]
pub fn spending_header(kind: &str, scope: &str, period: &str) -> String {
    format!("📊 *{kind}{scope} • {period}*")
}

#[must_use]
pub fn spending_totals(total: &str, count: usize) -> String {
    let noun = if count == 1 { "movimiento" } else { "movimientos" };
    format!("Total: {total} ({count} {noun})")
}

#[must_use]
pub fn spending_empty(kind: &str, period: &str) -> String {
    format!("No hay {kind} registrados en {period}.")
}

#[must_use]
pub fn movement_line(date: &str, sign: &str, amount: &str, label: &str) -> String {
    format!("• {date} {sign}{amount} {label}")
}

#[must_use]
pub fn recent_header(count: usize) -> String {
    format!("🧾 *Últimos {count} movimientos*")
}

#[must_use]
pub fn summary_header(period: &str) -> String {
    format!("📅 *Resumen de {period}*")
}

#[must_use]
pub fn summary_totals(income: &str, expenses: &str, net: &str) -> String {
    format!("➕ Ingresos: {income}\n➖ Gastos: {expenses}\n🟰 Balance: {net}")
}

pub const SUMMARY_TOP_HEADER: &str = "Top categorías de gasto:";

#[must_use]
pub fn summary_category_line(rank: usize, name: &str, amount: &str, share: f64) -> String {
    format!("{rank}. {name}: {amount} ({share:.1}%)")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn previews_interpolate_every_value() {
        let text = preview_expense("$500.00 ARS", "Comida", "Efectivo", "18/10/2026");
        for needle in ["$500.00 ARS", "Comida", "Efectivo", "18/10/2026"] {
            assert!(text.contains(needle), "{needle} missing in {text}");
        }

        let text = preview_transfer("$10,000.00 ARS", "Banco Galicia", "MercadoPago", "hoy");
        let from = text.find("Banco Galicia").unwrap();
        let to = text.find("MercadoPago").unwrap();
        assert!(from < to);
    }

    #[test]
    fn counts_agree_in_number() {
        assert_eq!(spending_totals("$1.00 ARS", 1), "Total: $1.00 ARS (1 movimiento)");
        assert!(spending_totals("$2.00 ARS", 2).ends_with("2 movimientos)"));
    }

    #[test]
    fn category_share_has_one_decimal() {
        assert_eq!(
            summary_category_line(1, "Comida", "$100.00 ARS", 33.3333),
            "1. Comida: $100.00 ARS (33.3%)"
        );
    }
}
