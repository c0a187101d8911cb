//! Field rules shared by create and update.

use std::collections::BTreeMap;

use bookshelf_http::error::FieldErrors;

use super::models::NewBook;
use crate::utils::sanitize_special_chars;

/// Raw request fields keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMap(BTreeMap<String, String>);

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Strip surrounding whitespace from every value.
    pub fn trimmed(self) -> Self {
        Self(
            self.0
                .into_iter()
                .map(|(key, value)| (key, value.trim().to_string()))
                .collect(),
        )
    }

    /// HTML-encode special characters in every value.
    pub fn sanitized(self) -> Self {
        Self(
            self.0
                .into_iter()
                .map(|(key, value)| (key, sanitize_special_chars(&value)))
                .collect(),
        )
    }
}

impl From<BTreeMap<String, String>> for FieldMap {
    fn from(map: BTreeMap<String, String>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FieldMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    Required,
    Numeric,
    MinLength(usize),
    MaxLength(usize),
}

impl Rule {
    /// Check one value. `None` means the field passed this rule.
    fn check(&self, field: &str, value: Option<&str>) -> Option<String> {
        let present = value.filter(|v| !v.trim().is_empty());

        match (self, present) {
            (Rule::Required, None) => Some(format!("The {field} field is required.")),
            (Rule::Required, Some(_)) => None,
            // Optional fields skip the remaining rules when empty
            (_, None) => None,
            (Rule::Numeric, Some(v)) => {
                (!is_numeric(v)).then(|| format!("The {field} field must contain only numbers."))
            }
            (Rule::MinLength(min), Some(v)) => (v.chars().count() < *min).then(|| {
                format!("The {field} field must be at least {min} characters in length.")
            }),
            (Rule::MaxLength(max), Some(v)) => (v.chars().count() > *max).then(|| {
                format!("The {field} field cannot exceed {max} characters in length.")
            }),
        }
    }
}

/// Optional sign, digits, optional fractional part.
fn is_numeric(value: &str) -> bool {
    let unsigned = value.strip_prefix(['-', '+']).unwrap_or(value);
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (unsigned, None),
    };
    let digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());

    match frac_part {
        Some(frac) => !frac.is_empty() && digits(frac) && digits(int_part),
        None => !int_part.is_empty() && digits(int_part),
    }
}

pub struct FieldRules {
    pub field: &'static str,
    pub rules: &'static [Rule],
}

pub const BOOK_RULES: &[FieldRules] = &[
    FieldRules {
        field: "status_id",
        rules: &[Rule::Required, Rule::Numeric],
    },
    FieldRules {
        field: "title",
        rules: &[Rule::Required, Rule::MinLength(10), Rule::MaxLength(60)],
    },
    FieldRules {
        field: "author",
        rules: &[Rule::Required, Rule::MinLength(10), Rule::MaxLength(200)],
    },
    FieldRules {
        field: "description",
        rules: &[Rule::Required, Rule::MinLength(10), Rule::MaxLength(200)],
    },
];

/// Run a rule table over the fields, reporting the first failure per field.
pub fn validate(fields: &FieldMap, table: &[FieldRules]) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();

    for entry in table {
        let value = fields.get(entry.field);
        if let Some(message) = entry
            .rules
            .iter()
            .find_map(|rule| rule.check(entry.field, value))
        {
            errors.insert(entry.field.to_string(), message);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

impl NewBook {
    /// Validate against [`BOOK_RULES`] and convert into a writable book.
    ///
    /// Values are trimmed first, so the rules see exactly what gets stored.
    pub fn from_fields(fields: &FieldMap) -> Result<Self, FieldErrors> {
        let fields = fields.clone().trimmed();
        validate(&fields, BOOK_RULES)?;

        let text = |key: &str| fields.get(key).unwrap_or_default().to_string();
        let status_id = text("status_id")
            .trim_start_matches('+')
            .parse::<i64>()
            .map_err(|_| {
                FieldErrors::from([(
                    "status_id".to_string(),
                    "The status_id field must contain only numbers.".to_string(),
                )])
            })?;

        Ok(Self {
            status_id,
            title: text("title"),
            author: text("author"),
            description: text("description"),
        })
    }
}
