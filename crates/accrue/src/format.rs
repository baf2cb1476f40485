//! Locale-aware number formatting for reports and exports.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Presentation locale: separators and currency symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    /// `$1,234.56`
    #[default]
    En,
    /// `R$ 1.234,56`
    Br,
}

impl Locale {
    pub fn thousands_separator(self) -> char {
        match self {
            Locale::En => ',',
            Locale::Br => '.',
        }
    }

    pub fn decimal_separator(self) -> char {
        match self {
            Locale::En => '.',
            Locale::Br => ',',
        }
    }

    pub fn currency_symbol(self) -> &'static str {
        match self {
            Locale::En => "$",
            Locale::Br => "R$ ",
        }
    }

    /// Field delimiter for CSV files; never the decimal separator.
    pub fn csv_delimiter(self) -> char {
        match self {
            Locale::En => ',',
            Locale::Br => ';',
        }
    }

    /// `strftime` pattern for calendar dates.
    pub fn date_format(self) -> &'static str {
        match self {
            Locale::En => "%Y-%m-%d",
            Locale::Br => "%d/%m/%Y",
        }
    }
}

fn group_thousands(whole: u64, separator: char) -> String {
    let digits = whole.to_string();
    let mut result = String::new();
    for (i, c) in digits.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(separator);
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

/// Plain decimal with `places` digits and the locale's decimal separator, no grouping.
pub fn format_decimal(value: f64, places: usize, locale: Locale) -> String {
    let text = format!("{value:.places$}");
    match locale.decimal_separator() {
        '.' => text,
        sep => text.replace('.', &sep.to_string()),
    }
}

/// Format a currency value
pub fn format_currency(value: f64, locale: Locale) -> String {
    let cents_total = (value.abs() * 100.0).round() as u64;
    let whole = cents_total / 100;
    let cents = cents_total % 100;

    let sign = if value < 0.0 && cents_total > 0 { "-" } else { "" };
    format!(
        "{sign}{}{}{}{cents:02}",
        locale.currency_symbol(),
        group_thousands(whole, locale.thousands_separator()),
        locale.decimal_separator()
    )
}

/// Format a currency value without cents (shorter format for tight columns)
pub fn format_currency_short(value: f64, locale: Locale) -> String {
    let whole = value.abs().round() as u64;
    let sign = if value < 0.0 && whole > 0 { "-" } else { "" };
    format!(
        "{sign}{}{}",
        locale.currency_symbol(),
        group_thousands(whole, locale.thousands_separator())
    )
}

/// Format a fraction as a percentage
pub fn format_percentage(value: f64, locale: Locale) -> String {
    format!("{}%", format_decimal(value * 100.0, 2, locale))
}
