//! Field normalization: raw payload records into canonical [`BondRecord`]s.
//!
//! A missing source key yields an empty canonical value; a record is never
//! dropped over one absent field. The source marks empty values with "-",
//! which is treated the same as missing.

use std::collections::HashMap;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde_json::Value;

use spbe_extract::RawRecord;

use crate::config::RunConfig;
use crate::schema::{BondRecord, Transform, FIELD_SPECS, FIRST_PAYMENT_DATE};

/// Payment-period phrases, checked in order: the specific ones first so
/// "раз в полугодие" is not shadowed by the bare "год".
const COUPON_FREQUENCY: &[(&str, &str)] = &[
    ("один раз в полугодие в конце полугодия", "2"),
    ("раз в полугодие", "2"),
    ("полугодие", "2"),
    ("один раз в год", "1"),
    ("раз в год", "1"),
    ("ежегодно", "1"),
    ("ежеквартально", "4"),
    ("раз в квартал", "4"),
    ("квартал", "4"),
    ("ежемесячно", "12"),
    ("раз в месяц", "12"),
    ("месяц", "12"),
    ("год", "1"),
];

const MONTHS_GENITIVE: &[(&str, &str)] = &[
    ("января", "01"),
    ("февраля", "02"),
    ("марта", "03"),
    ("апреля", "04"),
    ("мая", "05"),
    ("июня", "06"),
    ("июля", "07"),
    ("августа", "08"),
    ("сентября", "09"),
    ("октября", "10"),
    ("ноября", "11"),
    ("декабря", "12"),
];

static DAY_MONTH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{1,2})\s+(января|февраля|марта|апреля|мая|июня|июля|августа|сентября|октября|ноября|декабря)").unwrap()
});

static FIRST_PAYMENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"начиная с\s+(\d{1,2})\s+([а-яё]+)\s+(\d{4})").unwrap()
});

static INTEGER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)").unwrap());

/// Applies the declarative mapping table to raw records.
pub struct FieldMapper {
    yes_markers: Vec<String>,
    no_markers: Vec<String>,
    source_overrides: HashMap<String, String>,
}

impl FieldMapper {
    pub fn new(cfg: &RunConfig) -> Self {
        let source_overrides = cfg
            .field_overrides
            .iter()
            .map(|o| (o.canonical.clone(), o.source.clone()))
            .collect();
        Self {
            yes_markers: cfg.boolean_yes_markers.clone(),
            no_markers: cfg.boolean_no_markers.clone(),
            source_overrides,
        }
    }

    /// Pure record conversion; every canonical field ends up present.
    pub fn map_record(&self, raw: &RawRecord) -> BondRecord {
        let mut record = BondRecord::empty();
        for spec in FIELD_SPECS {
            let source = self
                .source_overrides
                .get(spec.canonical)
                .map(String::as_str)
                .unwrap_or(spec.source);
            let value = raw
                .get(source)
                .map(raw_value_text)
                .unwrap_or_default();
            let value = clean_text(&value);
            // an absent or placeholder source field stays an empty column;
            // transforms only see real values
            if value.is_empty() {
                record.set(spec.canonical, String::new());
                if spec.transform == Transform::InterestDates {
                    record.set(FIRST_PAYMENT_DATE, String::new());
                }
                continue;
            }
            match spec.transform {
                Transform::Trim => record.set(spec.canonical, value),
                Transform::Boolean => {
                    record.set(spec.canonical, self.translate_boolean(&value));
                }
                Transform::CouponFrequency => {
                    record.set(spec.canonical, coupon_frequency(&value));
                }
                Transform::Date => record.set(spec.canonical, normalize_date(&value)),
                Transform::InterestDates => {
                    let (dates, first) = interest_payment_dates(&value);
                    record.set(spec.canonical, dates);
                    record.set(FIRST_PAYMENT_DATE, first);
                }
            }
        }
        record
    }

    /// Negative markers are checked first: «не предусмотрена» must not be
    /// caught by its own substring «предусмотрена».
    fn translate_boolean(&self, value: &str) -> String {
        let lower = value.to_lowercase();
        if lower == "false" || self.no_markers.iter().any(|m| lower.contains(m.as_str())) {
            return "No".to_string();
        }
        if lower == "true" || self.yes_markers.iter().any(|m| lower.contains(m.as_str())) {
            return "Yes".to_string();
        }
        value.to_string()
    }
}

fn raw_value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

/// Collapses internal whitespace and drops the source's "-" placeholder.
fn clean_text(value: &str) -> String {
    let collapsed = value.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed == "-" {
        String::new()
    } else {
        collapsed
    }
}

fn coupon_frequency(value: &str) -> String {
    if value.is_empty() {
        return String::new();
    }
    let lower = value.to_lowercase();
    for (phrase, per_year) in COUPON_FREQUENCY {
        if lower.contains(phrase) {
            return (*per_year).to_string();
        }
    }
    if let Some(cap) = INTEGER_RE.captures(value) {
        return cap[1].to_string();
    }
    value.to_string()
}

/// Timestamps (`2022-06-20T00:00:00Z`), ISO dates, and dotted Russian dates
/// (`20.06.2022`) all come out as `YYYY-MM-DD`; anything else passes through.
fn normalize_date(value: &str) -> String {
    if value.is_empty() {
        return String::new();
    }
    if value.len() >= 10 && value.as_bytes().get(10) == Some(&b'T') {
        let date = &value[..10];
        if NaiveDate::parse_from_str(date, "%Y-%m-%d").is_ok() {
            return date.to_string();
        }
    }
    if NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok() {
        return value.to_string();
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%d.%m.%Y") {
        return date.format("%Y-%m-%d").to_string();
    }
    value.to_string()
}

/// Parses a free-text payment schedule into the bracketed `MM/DD` list plus
/// the first payment date when the text announces one.
fn interest_payment_dates(value: &str) -> (String, String) {
    if value.is_empty() {
        return (String::new(), String::new());
    }
    let lower = value.to_lowercase();

    let mut dates: Vec<String> = Vec::new();
    for cap in DAY_MONTH_RE.captures_iter(&lower) {
        let day = format!("{:0>2}", &cap[1]);
        if let Some(month) = month_number(&cap[2]) {
            let formatted = format!("{}/{}", month, day);
            // the "starting from <date>" clause repeats a schedule date
            if !dates.contains(&formatted) {
                dates.push(formatted);
            }
        }
    }
    let dates_str = if dates.is_empty() {
        String::new()
    } else {
        format!("[{}]", dates.join(" ; "))
    };

    let first = FIRST_PAYMENT_RE
        .captures(&lower)
        .and_then(|cap| {
            let day = format!("{:0>2}", &cap[1]);
            month_number(&cap[2]).map(|month| format!("{}/{}/{}", month, day, &cap[3]))
        })
        .unwrap_or_default();

    (dates_str, first)
}

fn month_number(genitive: &str) -> Option<&'static str> {
    MONTHS_GENITIVE
        .iter()
        .find(|(name, _)| *name == genitive)
        .map(|(_, num)| *num)
}
