//! HTML and plain-text bodies of outbound RFP emails.

use crate::db::rfp_repo::RfpRow;

const RFP_EMAIL_TEMPLATE: &str = include_str!("templates/rfp_email.html");

/// Formats an amount with thousands separators and two decimals.
pub fn format_money(amount: f64, currency: Option<&str>) -> String {
    let code = currency
        .map(|c| c.trim().to_ascii_uppercase())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| "USD".to_string());

    let negative = amount < 0.0;
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = group_thousands(cents / 100);
    let number = format!("{}.{:02}", whole, cents % 100);
    let sign = if negative { "-" } else { "" };

    match code.as_str() {
        "USD" => format!("{}${}", sign, number),
        "EUR" => format!("{}€{}", sign, number),
        "GBP" => format!("{}£{}", sign, number),
        "INR" => format!("{}₹{}", sign, number),
        "JPY" => format!("{}¥{}", sign, number),
        other => format!("{}{} {}", sign, other, number),
    }
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn format_quantity(quantity: f64) -> String {
    if quantity.fract() == 0.0 {
        format!("{}", quantity as i64)
    } else {
        quantity.to_string()
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

fn section(title: &str, body: &str) -> String {
    format!(
        "<div class=\"section\">\n      <h3>{}</h3>\n      {}\n    </div>",
        title, body
    )
}

fn text_section(title: &str, value: Option<&str>) -> String {
    value
        .filter(|v| !v.trim().is_empty())
        .map(|v| section(title, &format!("<p>{}</p>", escape_html(v))))
        .unwrap_or_default()
}

/// Renders the HTML body addressed to `vendor_name`. `special_requests` is
/// the text shown in the special requests section, usually a rephrased form
/// of the RFP's own field.
pub fn render_html(rfp: &RfpRow, vendor_name: &str, special_requests: Option<&str>) -> String {
    let data = &rfp.structured_data;
    let currency = data.budget_currency.as_deref();

    let budget = match data.budget {
        Some(budget) => {
            let mut body = format!("<p>{}</p>", format_money(budget, currency));
            if let Some(per_unit) = data.budget_per_unit {
                body.push_str(&format!(
                    "<p><strong>Budget per unit:</strong> {}</p>",
                    format_money(per_unit, currency)
                ));
            }
            section("Budget", &body)
        }
        None => String::new(),
    };

    let items = if data.items.is_empty() {
        String::new()
    } else {
        let body: String = data
            .items
            .iter()
            .map(|item| {
                format!(
                    "<div class=\"item\"><strong>Item:</strong> {}<br><strong>Requirement:</strong> {}<br><strong>Quantity:</strong> {}</div>",
                    escape_html(&item.name),
                    escape_html(item.specifications.as_deref().unwrap_or("N/A")),
                    format_quantity(item.quantity)
                )
            })
            .collect();
        section("Items Required", &body)
    };

    RFP_EMAIL_TEMPLATE
        .replace("{{VENDOR_NAME}}", &escape_html(vendor_name))
        .replace("{{RFP_ID}}", &rfp.id)
        .replace("{{BUDGET_SECTION}}", &budget)
        .replace("{{ITEMS_SECTION}}", &items)
        .replace(
            "{{DELIVERY_TIMELINE_SECTION}}",
            &text_section("Delivery Timeline", data.delivery_timeline.as_deref()),
        )
        .replace(
            "{{PAYMENT_TERMS_SECTION}}",
            &text_section("Payment Expectations", data.payment_terms.as_deref()),
        )
        .replace(
            "{{WARRANTY_SECTION}}",
            &text_section("Warranty Requirements", data.warranty.as_deref()),
        )
        .replace(
            "{{SPECIAL_REQUESTS_SECTION}}",
            &text_section("Special Requests", special_requests),
        )
}

/// Renders the plain-text alternative. Always ends with the `RFP ID:` line
/// that the correlator's labeled matcher looks for in quoted replies.
pub fn render_text(rfp: &RfpRow) -> String {
    let data = &rfp.structured_data;
    let currency = data.budget_currency.as_deref();
    let mut text = String::from("Request for Proposal (RFP)\n\n");

    if let Some(budget) = data.budget.filter(|b| *b != 0.0) {
        text.push_str(&format!("Budget: {}\n", format_money(budget, currency)));
        if let Some(per_unit) = data.budget_per_unit {
            text.push_str(&format!(
                "Budget per unit: {}\n",
                format_money(per_unit, currency)
            ));
        }
        text.push('\n');
    }

    if !data.items.is_empty() {
        text.push_str("Items Required:\n");
        for item in &data.items {
            text.push_str(&format!(
                "- {} (Quantity: {})\n",
                item.name,
                format_quantity(item.quantity)
            ));
            if let Some(spec) = &item.specifications {
                text.push_str(&format!("  Specifications: {}\n", spec));
            }
        }
        text.push('\n');
    }

    let fields = [
        ("Delivery Timeline", &data.delivery_timeline),
        ("Payment Terms", &data.payment_terms),
        ("Warranty Requirements", &data.warranty),
    ];
    for (label, value) in fields {
        if let Some(value) = value.as_deref().filter(|v| !v.trim().is_empty()) {
            text.push_str(&format!("{}: {}\n\n", label, value));
        }
    }

    text.push_str("\nPlease reply to this email with your proposal.\n");
    text.push_str(&format!("RFP ID: {}\n", rfp.id));
    text
}
