//! Cash events as CSV, for editing a plan's events in a spreadsheet.
//!
//! Columns are `month`, `date`, `description`, `deposit`, `withdrawal`. Each
//! row fills exactly one of `month` and `date`. Numbers and dates follow the
//! locale; on import the header decides the column order.

use std::fs;
use std::path::Path;

use accrue_core::model::MAX_DESCRIPTION_LEN;
use color_eyre::eyre::{Context, bail, eyre};
use jiff::civil::Date;

use crate::config::EventEntry;
use crate::format::{Locale, format_decimal};
use crate::io::atomic_write;

const HEADER: [&str; 5] = ["month", "date", "description", "deposit", "withdrawal"];

fn quote(field: &str, delimiter: char) -> String {
    if field.contains(delimiter) || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Split one CSV record, honoring double-quoted fields.
fn split_record(line: &str, delimiter: char) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut quoted = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if quoted && chars.peek() == Some(&'"') => {
                field.push('"');
                chars.next();
            }
            '"' => quoted = !quoted,
            c if c == delimiter && !quoted => fields.push(std::mem::take(&mut field)),
            c => field.push(c),
        }
    }
    fields.push(field);
    fields
}

fn format_amount(value: f64, locale: Locale) -> String {
    if value > 0.0 {
        format_decimal(value, 2, locale)
    } else {
        String::new()
    }
}

/// Parse an amount written with the locale's separators, with or without a
/// currency symbol. Blank means zero.
fn parse_amount(text: &str, locale: Locale) -> color_eyre::Result<f64> {
    let cleaned: String = text
        .trim()
        .trim_start_matches("R$")
        .trim_start_matches('$')
        .chars()
        .filter(|c| !c.is_whitespace() && *c != locale.thousands_separator())
        .map(|c| if c == locale.decimal_separator() { '.' } else { c })
        .collect();
    if cleaned.is_empty() {
        return Ok(0.0);
    }
    cleaned
        .parse()
        .map_err(|_| eyre!("'{}' is not an amount", text.trim()))
}

/// Dates in the locale's format, falling back to ISO `YYYY-MM-DD`.
fn parse_date(text: &str, locale: Locale) -> color_eyre::Result<Date> {
    let text = text.trim();
    Date::strptime(locale.date_format(), text)
        .or_else(|_| text.parse::<Date>())
        .map_err(|_| eyre!("'{text}' is not a date"))
}

pub fn events_to_csv(events: &[EventEntry], locale: Locale) -> String {
    let delimiter = locale.csv_delimiter();
    let mut out = HEADER.join(&delimiter.to_string());
    out.push('\n');

    for event in events {
        let fields = [
            event.month.map(|m| m.to_string()).unwrap_or_default(),
            event
                .date
                .map(|d| d.strftime(locale.date_format()).to_string())
                .unwrap_or_default(),
            quote(&event.description, delimiter),
            format_amount(event.deposit, locale),
            format_amount(event.withdrawal, locale),
        ];
        out.push_str(&fields.join(&delimiter.to_string()));
        out.push('\n');
    }
    out
}

struct Columns {
    month: Option<usize>,
    date: Option<usize>,
    description: Option<usize>,
    deposit: Option<usize>,
    withdrawal: Option<usize>,
}

impl Columns {
    fn from_header(header: &[String]) -> color_eyre::Result<Self> {
        let find = |name: &str| {
            header
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
        };
        let columns = Self {
            month: find("month"),
            date: find("date"),
            description: find("description"),
            deposit: find("deposit"),
            withdrawal: find("withdrawal"),
        };
        if columns.month.is_none() && columns.date.is_none() {
            bail!("CSV header needs a 'month' or 'date' column");
        }
        if columns.deposit.is_none() && columns.withdrawal.is_none() {
            bail!("CSV header needs a 'deposit' or 'withdrawal' column");
        }
        Ok(columns)
    }

    fn parse_row(&self, fields: &[String], locale: Locale) -> color_eyre::Result<EventEntry> {
        let get = |column: Option<usize>| {
            column
                .and_then(|i| fields.get(i))
                .map(|f| f.trim())
                .filter(|f| !f.is_empty())
        };

        let month = get(self.month)
            .map(|m| m.parse::<u32>().map_err(|_| eyre!("'{m}' is not a month")))
            .transpose()?;
        let date = get(self.date).map(|d| parse_date(d, locale)).transpose()?;
        let description: String = get(self.description)
            .unwrap_or_default()
            .chars()
            .take(MAX_DESCRIPTION_LEN)
            .collect();

        let entry = EventEntry {
            month,
            date,
            description,
            deposit: get(self.deposit)
                .map(|a| parse_amount(a, locale))
                .transpose()?
                .unwrap_or(0.0),
            withdrawal: get(self.withdrawal)
                .map(|a| parse_amount(a, locale))
                .transpose()?
                .unwrap_or(0.0),
        };
        entry.to_event()?;
        Ok(entry)
    }
}

/// Parse events from CSV text.
///
/// Rows that do not parse are skipped with a warning; a file with no usable
/// row at all is an error.
pub fn events_from_csv(text: &str, locale: Locale) -> color_eyre::Result<Vec<EventEntry>> {
    let delimiter = locale.csv_delimiter();
    let mut lines = text
        .trim_start_matches('\u{feff}')
        .lines()
        .enumerate()
        .filter(|(_, l)| !l.trim().is_empty());

    let Some((_, header)) = lines.next() else {
        bail!("CSV is empty");
    };
    let columns = Columns::from_header(&split_record(header, delimiter))?;

    let mut events = Vec::new();
    for (index, line) in lines {
        match columns.parse_row(&split_record(line, delimiter), locale) {
            Ok(entry) => events.push(entry),
            Err(e) => tracing::warn!(line = index + 1, error = %e, "skipping event row"),
        }
    }

    if events.is_empty() {
        bail!("no valid events found");
    }
    Ok(events)
}

pub fn write_events_csv(
    path: &Path,
    events: &[EventEntry],
    locale: Locale,
) -> color_eyre::Result<()> {
    atomic_write(path, &events_to_csv(events, locale))
        .wrap_err_with(|| format!("writing events to {}", path.display()))?;
    tracing::info!(path = %path.display(), events = events.len(), "exported events");
    Ok(())
}

pub fn read_events_csv(path: &Path, locale: Locale) -> color_eyre::Result<Vec<EventEntry>> {
    let text = fs::read_to_string(path)
        .wrap_err_with(|| format!("reading events from {}", path.display()))?;
    let events = events_from_csv(&text, locale)
        .wrap_err_with(|| format!("parsing events in {}", path.display()))?;
    tracing::debug!(path = %path.display(), events = events.len(), "imported events");
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample_events() -> Vec<EventEntry> {
        vec![
            EventEntry {
                month: Some(24),
                description: "Bonus".to_string(),
                deposit: 5_000.0,
                ..Default::default()
            },
            EventEntry {
                date: Some(jiff::civil::date(2030, 6, 1)),
                description: "Car; used".to_string(),
                withdrawal: 20_000.5,
                ..Default::default()
            },
        ]
    }

    #[test]
    fn test_export_br() {
        let csv = events_to_csv(&sample_events(), Locale::Br);
        assert_eq!(
            csv,
            "month;date;description;deposit;withdrawal\n\
             24;;Bonus;5000,00;\n\
             ;01/06/2030;\"Car; used\";;20000,50\n"
        );
    }

    #[test]
    fn test_export_then_import() {
        for locale in [Locale::En, Locale::Br] {
            let csv = events_to_csv(&sample_events(), locale);
            assert_eq!(events_from_csv(&csv, locale).unwrap(), sample_events());
        }
    }

    #[test]
    fn test_import_reordered_columns_and_currency() {
        let csv = "withdrawal;description;date\nR$ 1.250,75;Trip;15/03/2027\n";
        let events = events_from_csv(csv, Locale::Br).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].withdrawal, 1_250.75);
        assert_eq!(events[0].date, Some(jiff::civil::date(2027, 3, 15)));
        assert_eq!(events[0].month, None);
    }

    #[test]
    fn test_bad_rows_are_skipped() {
        let csv = "month,deposit\n3,100\nsoon,200\n,300\n7,abc\n";
        let events = events_from_csv(csv, Locale::En).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].month, Some(3));
        assert_eq!(events[0].deposit, 100.0);
    }

    #[test]
    fn test_nothing_usable_is_an_error() {
        assert!(events_from_csv("", Locale::En).is_err());
        assert!(events_from_csv("month,deposit\nx,1\n", Locale::En).is_err());
        assert!(events_from_csv("description\nBonus\n", Locale::En).is_err());
    }

    #[test]
    fn test_long_descriptions_truncated() {
        let csv = format!("month,description,deposit\n1,{},10\n", "x".repeat(50));
        let events = events_from_csv(&csv, Locale::En).unwrap();
        assert_eq!(events[0].description.len(), MAX_DESCRIPTION_LEN);
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("events.csv");
        write_events_csv(&path, &sample_events(), Locale::En).unwrap();
        assert_eq!(read_events_csv(&path, Locale::En).unwrap(), sample_events());
    }
}
