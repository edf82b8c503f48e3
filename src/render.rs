use tabled::{builder::Builder, Table};

use crate::mortgage::{ItemKind, MortgageSummary, PaymentChart, PrincipalChart};

/// Presentation boundary: anything that can display a summary and its charts.
pub trait Renderer {
    fn render_summary(&self, summary: &MortgageSummary) -> String;
    fn render_principal_chart(&self, chart: &PrincipalChart) -> String;
    fn render_payment_chart(&self, chart: &PaymentChart) -> String;
}

// charts are sampled once per year
#[derive(Clone, Copy, Debug, Default)]
pub struct TextRenderer;

impl Renderer for TextRenderer {
    fn render_summary(&self, summary: &MortgageSummary) -> String {
        let mut builder = Builder::default();
        builder.push_record(["Field", "Value"]);
        for item in summary.items() {
            builder.push_record([item.label, &format_value(item.value, item.kind)]);
        }
        Table::from(builder).to_string()
    }

    fn render_principal_chart(&self, chart: &PrincipalChart) -> String {
        let mut builder = Builder::default();
        builder.push_record(["Year", "Outstanding principal"]);
        for (year, balance) in chart
            .years
            .iter()
            .zip(&chart.outstanding_principal)
            .step_by(12)
        {
            builder.push_record([year.to_string(), format_currency(*balance)]);
        }
        format!(
            "Outstanding principal as a function of time\n80% of sale price: {}\n{}\n",
            format_currency(chart.sale_price_reference),
            Table::from(builder)
        )
    }

    fn render_payment_chart(&self, chart: &PaymentChart) -> String {
        let mut builder = Builder::default();
        builder.push_record(["Year", "Interest", "Principal payment"]);
        for ((year, interest), principal) in chart
            .years
            .iter()
            .zip(&chart.interest)
            .zip(&chart.principal)
            .step_by(12)
        {
            builder.push_record([
                year.to_string(),
                format_currency(*interest),
                format_currency(*principal),
            ]);
        }
        format!(
            "Principal and interest payments as a function of time\n{}\n",
            Table::from(builder)
        )
    }
}

pub fn format_value(value: f64, kind: ItemKind) -> String {
    match kind {
        ItemKind::Fraction => format!("{}", value),
        ItemKind::Percent => format!("{:.1}%", value * 100.),
        ItemKind::Currency => format_currency(value),
        ItemKind::Ratio => format!("{:.2}", value),
    }
}

/// Whole dollars with thousands separators, e.g. `$1,234,567`.
pub fn format_currency(amt: f64) -> String {
    let rounded = amt.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if rounded < 0. {
        format!("-${}", grouped)
    } else {
        format!("${}", grouped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mortgage::Mortgage;
    use test_log::test;

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(0.), "$0");
        assert_eq!(format_currency(999.4), "$999");
        assert_eq!(format_currency(1145.8), "$1,146");
        assert_eq!(format_currency(240000.), "$240,000");
        assert_eq!(format_currency(1234567.), "$1,234,567");
        assert_eq!(format_currency(-2500.), "-$2,500");
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(0.01, ItemKind::Percent), "1.0%");
        assert_eq!(format_value(0.72, ItemKind::Ratio), "0.72");
        assert_eq!(format_value(0.1, ItemKind::Fraction), "0.1");
    }

    fn row<'a>(text: &'a str, label: &str) -> &'a str {
        text.lines()
            .find(|line| line.contains(label))
            .unwrap_or_else(|| panic!("no row for {}", label))
    }

    #[test]
    fn test_render_summary() {
        let mortgage = Mortgage::from_terms(300000., 30, 0.04, 0.1).unwrap();
        let text = TextRenderer.render_summary(mortgage.summary());

        // header plus one row per item
        assert_eq!(text.lines().filter(|line| line.starts_with('|')).count(), 18);
        assert!(row(&text, "Field").contains("Value"));
        assert!(row(&text, "PMI rate").contains("1.0%"));
        assert!(row(&text, "Total price").contains("$300,000"));
        assert!(row(&text, "monthly PMI Insurance").contains("$225 "));
        assert!(row(&text, "Total PMI paid").contains("$25,875"));
        assert!(row(&text, "Interest to principal ratio").contains("0.72"));
        assert!(text.find("Down payment fraction") < text.find("Grand total"));
    }

    #[test]
    fn test_render_charts() {
        let mortgage = Mortgage::from_terms(300000., 30, 0.04, 0.2).unwrap();
        let principal = TextRenderer.render_principal_chart(&mortgage.principal_chart());
        assert!(principal.starts_with("Outstanding principal as a function of time\n"));
        assert_eq!(principal.lines().nth(1), Some("80% of sale price: $240,000"));
        // header plus one row per year
        assert_eq!(principal.lines().filter(|line| line.starts_with('|')).count(), 31);
        assert!(row(&principal, "| 0 ").contains("$240,000"));

        let split = TextRenderer.render_payment_chart(&mortgage.payment_chart());
        assert_eq!(split.lines().filter(|line| line.starts_with('|')).count(), 31);
        let first_year = row(&split, "| 0 ");
        assert!(first_year.contains("$800"));
        assert!(first_year.contains("$346"));
    }
}
