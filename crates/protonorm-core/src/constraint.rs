//! Constraint model.
//!
//! A [`Constraint`] is the decoded form of the rules attached to one field.
//! It only exists while generating code: the generator bakes its values into
//! the emitted source as literals of [`StringRules`] and [`MapRules`].

use std::fmt;

/// Field shapes that can carry a constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// A singular `string` field
    ScalarString,
    /// A `map<string, string>` field
    StringMap,
}

impl FieldKind {
    /// Returns the schema spelling of the kind
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::ScalarString => "string",
            FieldKind::StringMap => "map<string, string>",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rules for a scalar string field.
///
/// Bounds are inclusive and measured in `char`s of the trimmed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StringRules {
    /// Strip leading and trailing whitespace before checking
    pub trim: bool,
    /// Minimum length of the trimmed value
    pub min_len: Option<usize>,
    /// Maximum length of the trimmed value
    pub max_len: Option<usize>,
    /// Reject values that contain whitespace once trimmed
    pub reject_whitespace: bool,
}

impl Default for StringRules {
    fn default() -> Self {
        Self {
            trim: true,
            min_len: None,
            max_len: None,
            reject_whitespace: false,
        }
    }
}

impl StringRules {
    /// Creates rules that only trim
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the inclusive minimum length
    pub fn min_len(mut self, min: usize) -> Self {
        self.min_len = Some(min);
        self
    }

    /// Sets the inclusive maximum length
    pub fn max_len(mut self, max: usize) -> Self {
        self.max_len = Some(max);
        self
    }

    /// Sets whether internal whitespace is rejected
    pub fn reject_whitespace(mut self, reject: bool) -> Self {
        self.reject_whitespace = reject;
        self
    }

    /// Returns true if no value could ever satisfy the bounds
    pub fn is_unsatisfiable(&self) -> bool {
        matches!((self.min_len, self.max_len), (Some(min), Some(max)) if min > max)
    }
}

/// Rules for a `map<string, string>` field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MapRules {
    /// Strip leading and trailing whitespace from keys and values
    pub trim: bool,
    /// Remove entries whose key or value is empty after trimming
    pub drop_blank: bool,
}

impl Default for MapRules {
    fn default() -> Self {
        Self {
            trim: true,
            drop_blank: true,
        }
    }
}

impl MapRules {
    /// Creates the default map rules (trim, drop blank entries)
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether blank entries are removed
    pub fn drop_blank(mut self, drop: bool) -> Self {
        self.drop_blank = drop;
        self
    }
}

/// The rules attached to one field, one variant per supported [`FieldKind`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Constraint {
    /// Rules for a scalar string field
    ScalarString(StringRules),
    /// Rules for a string map field
    StringMap(MapRules),
}

impl Constraint {
    /// Returns the field kind these rules apply to
    pub fn kind(&self) -> FieldKind {
        match self {
            Constraint::ScalarString(_) => FieldKind::ScalarString,
            Constraint::StringMap(_) => FieldKind::StringMap,
        }
    }
}

impl From<StringRules> for Constraint {
    fn from(rules: StringRules) -> Self {
        Constraint::ScalarString(rules)
    }
}

impl From<MapRules> for Constraint {
    fn from(rules: MapRules) -> Self {
        Constraint::StringMap(rules)
    }
}
