//! Parsing of PostgreSQL unique-violation reports

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

static UNIQUE_DETAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^Key \((.*?)\)=\((.*?)\) already exists\.$").expect("valid unique detail pattern")
});

/// A unique constraint violation as reported by the database
#[derive(Debug, Clone, PartialEq)]
pub struct UniqueViolation {
    /// Constraint or index name
    pub constraint: Option<String>,
    /// Conflicting columns and values, in the order the database listed them
    pub fields: Vec<(String, Value)>,
}

impl UniqueViolation {
    /// Build from the constraint name and the `DETAIL` line of the error
    ///
    /// `Key (email, is_active)=(a@b.c, t) already exists.` yields
    /// `email = "a@b.c"` and `is_active = true`. A detail that does not
    /// match the expected shape yields no fields.
    pub fn parse(constraint: Option<&str>, detail: Option<&str>) -> Self {
        let fields = detail
            .and_then(|d| UNIQUE_DETAIL.captures(d.trim()))
            .map(|caps| {
                let columns: Vec<&str> = caps[1].split(", ").collect();
                let raw = &caps[2];
                let values: Vec<&str> = raw.split(", ").collect();

                if columns.len() == values.len() {
                    columns
                        .iter()
                        .zip(values)
                        .map(|(c, v)| ((*c).to_string(), parse_value(v)))
                        .collect()
                } else if columns.len() == 1 {
                    // The value itself contained ", "
                    vec![(columns[0].to_string(), parse_value(raw))]
                } else {
                    Vec::new()
                }
            })
            .unwrap_or_default();

        Self {
            constraint: constraint.map(str::to_string),
            fields,
        }
    }

    /// Human readable message naming the conflicting columns
    pub fn message(&self) -> String {
        if !self.fields.is_empty() {
            let keys: Vec<&str> = self.fields.iter().map(|(k, _)| k.as_str()).collect();
            return format!("An entry with this {} already exists.", keys.join(" and "));
        }
        match &self.constraint {
            Some(constraint) => format!("Data already exists: {}", constraint),
            None => "An entry with this data already exists.".to_string(),
        }
    }

    /// Conflicting columns as a JSON object
    pub fn details(&self) -> Map<String, Value> {
        self.fields.iter().cloned().collect()
    }
}

fn parse_value(raw: &str) -> Value {
    match raw {
        "t" => Value::Bool(true),
        "f" => Value::Bool(false),
        other => Value::String(other.to_string()),
    }
}
