//! Normalization and validation routines called by generated code.
//!
//! Every routine mutates one field slot in place and returns a [`Verdict`]:
//! `changed` records whether normalization alters the slot, `error` is the
//! only failure signal.
//!
//! Scalar strings are trimmed, then checked for internal whitespace and for
//! length bounds in that order. A value that fails is left exactly as it was;
//! `changed` still reports whether trimming would have altered it.
//!
//! Maps are trimmed entry by entry and blank entries are dropped. Map
//! normalization never fails and always reports `changed = false`, even when
//! entries were rewritten or removed. Callers must not use the flag to detect
//! map normalization.

use crate::constraint::{MapRules, StringRules};
use thiserror::Error;
use tracing::trace;

/// Why a field value was rejected
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The trimmed value is shorter than the minimum length
    #[error("field '{field}' is too short: {len} < {min}")]
    TooShort {
        /// Field name as declared in the schema
        field: &'static str,
        /// Length of the trimmed value
        len: usize,
        /// Configured minimum
        min: usize,
    },

    /// The trimmed value is longer than the maximum length
    #[error("field '{field}' is too long: {len} > {max}")]
    TooLong {
        /// Field name as declared in the schema
        field: &'static str,
        /// Length of the trimmed value
        len: usize,
        /// Configured maximum
        max: usize,
    },

    /// The trimmed value still contains whitespace
    #[error("field '{field}' must not contain whitespace")]
    InvalidContent {
        /// Field name as declared in the schema
        field: &'static str,
    },
}

impl ValidationError {
    /// Returns the name of the rejected field
    pub fn field(&self) -> &'static str {
        match self {
            Self::TooShort { field, .. }
            | Self::TooLong { field, .. }
            | Self::InvalidContent { field } => *field,
        }
    }
}

/// Outcome of normalizing a field or a whole message
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[must_use]
pub struct Verdict {
    /// Whether normalization altered (or would have altered) the value
    pub changed: bool,
    /// The first error encountered, if any
    pub error: Option<ValidationError>,
}

impl Verdict {
    /// A successful verdict
    pub fn ok(changed: bool) -> Self {
        Self {
            changed,
            error: None,
        }
    }

    /// A failed verdict
    pub fn failed(changed: bool, error: ValidationError) -> Self {
        Self {
            changed,
            error: Some(error),
        }
    }

    /// Returns true if no error was recorded
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// Returns true if an error was recorded
    pub fn is_err(&self) -> bool {
        self.error.is_some()
    }

    /// Folds a field verdict into this one.
    ///
    /// `changed` flags are OR-ed; the first error wins.
    pub fn absorb(&mut self, other: Verdict) {
        self.changed |= other.changed;
        if self.error.is_none() {
            self.error = other.error;
        }
    }

    /// Converts into a `Result` carrying the changed flag on success
    pub fn into_result(self) -> Result<bool, ValidationError> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.changed),
        }
    }
}

/// Implemented by generated code for every message with validated fields
pub trait Validate {
    /// Normalizes the message in place and reports the outcome.
    ///
    /// Fields are processed in declaration order; processing stops at the
    /// first field that fails.
    fn validate(&mut self) -> Verdict;
}

impl StringRules {
    /// Checks an already-trimmed value against the rules
    pub fn check(&self, field: &'static str, trimmed: &str) -> Result<(), ValidationError> {
        if self.reject_whitespace && trimmed.chars().any(char::is_whitespace) {
            return Err(ValidationError::InvalidContent { field });
        }

        let len = trimmed.chars().count();
        if let Some(min) = self.min_len {
            if len < min {
                return Err(ValidationError::TooShort { field, len, min });
            }
        }
        if let Some(max) = self.max_len {
            if len > max {
                return Err(ValidationError::TooLong { field, len, max });
            }
        }

        Ok(())
    }
}

impl MapRules {
    /// Normalizes one entry, returning `None` if it should be dropped
    pub fn normalize_entry(&self, key: String, value: String) -> Option<(String, String)> {
        let (key, value) = if self.trim {
            (trim_owned(key), trim_owned(value))
        } else {
            (key, value)
        };

        if self.drop_blank && (key.is_empty() || value.is_empty()) {
            return None;
        }
        Some((key, value))
    }

    fn is_normalized(&self, key: &str, value: &str) -> bool {
        let trimmed = !self.trim || (key.trim() == key && value.trim() == value);
        let filled = !self.drop_blank || (!key.is_empty() && !value.is_empty());
        trimmed && filled
    }
}

/// Normalizes a scalar string field.
///
/// On success the field holds the trimmed value. On failure the field is
/// left untouched.
pub fn normalize_string(field: &'static str, value: &mut String, rules: &StringRules) -> Verdict {
    let trimmed = if rules.trim {
        value.trim()
    } else {
        value.as_str()
    };
    let changed = trimmed.len() != value.len();

    if let Err(error) = rules.check(field, trimmed) {
        trace!(field, %error, "rejected string value");
        return Verdict::failed(changed, error);
    }

    if changed {
        *value = trimmed.to_owned();
    }
    Verdict::ok(changed)
}

/// Normalizes a string field with explicit presence; `None` is left alone
pub fn normalize_optional_string(
    field: &'static str,
    value: &mut Option<String>,
    rules: &StringRules,
) -> Verdict {
    match value.as_mut() {
        Some(value) => normalize_string(field, value, rules),
        None => Verdict::default(),
    }
}

/// Normalizes a string-to-string map field.
///
/// Works with any map type prost can generate (`HashMap` with any hasher,
/// `BTreeMap`). When trimming makes two keys collide, an entry whose key was
/// already trimmed wins over rewritten ones.
pub fn normalize_map<M>(map: &mut M, rules: &MapRules) -> Verdict
where
    M: Default + IntoIterator<Item = (String, String)> + FromIterator<(String, String)>,
    for<'a> &'a M: IntoIterator<Item = (&'a String, &'a String)>,
{
    if (&*map)
        .into_iter()
        .all(|(key, value)| rules.is_normalized(key, value))
    {
        return Verdict::default();
    }

    let mut canonical = Vec::new();
    let mut rewritten = Vec::new();
    for (key, value) in std::mem::take(map) {
        if rules.is_normalized(&key, &value) {
            canonical.push((key, value));
        } else if let Some(entry) = rules.normalize_entry(key, value) {
            rewritten.push(entry);
        }
    }
    trace!(
        kept = canonical.len(),
        rewritten = rewritten.len(),
        "normalized map entries"
    );

    // Later inserts overwrite earlier ones, so canonical entries go last.
    *map = rewritten.into_iter().chain(canonical).collect();
    Verdict::default()
}

fn trim_owned(s: String) -> String {
    let trimmed = s.trim();
    if trimmed.len() == s.len() {
        s
    } else {
        trimmed.to_owned()
    }
}
