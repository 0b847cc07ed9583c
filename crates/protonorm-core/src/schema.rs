//! Decoded schema representation consumed by the synthesizer.
//!
//! This is the hand-off point between descriptor decoding and code
//! generation: names are already resolved to the Rust paths prost generates,
//! and every field carries its shape plus an optional [`Constraint`].

use crate::constraint::Constraint;

/// One `.proto` file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSchema {
    /// File name as known to protoc (e.g. `shop/item.proto`)
    pub name: String,
    /// Proto package, empty if none
    pub package: String,
    /// Messages in declaration order, parents before nested messages
    pub messages: Vec<MessageSchema>,
}

impl FileSchema {
    /// Returns true if at least one field carries a constraint
    pub fn has_constraints(&self) -> bool {
        self.messages.iter().any(MessageSchema::has_constraints)
    }
}

/// One message type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageSchema {
    /// Fully-qualified proto name (e.g. `shop.Item.Variant`)
    pub full_name: String,
    /// Path of the prost struct relative to the package module (e.g. `item::Variant`)
    pub rust_path: String,
    /// Fields in declaration order
    pub fields: Vec<FieldSchema>,
}

impl MessageSchema {
    /// Returns true if at least one field carries a constraint
    pub fn has_constraints(&self) -> bool {
        self.fields.iter().any(|f| f.constraint.is_some())
    }
}

/// One field of a message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSchema {
    /// Field name as declared in the schema
    pub name: String,
    /// Identifier of the prost struct field (possibly a raw identifier)
    pub rust_ident: String,
    /// How the field is represented
    pub shape: FieldShape,
    /// Rules attached to the field, if any
    pub constraint: Option<Constraint>,
}

/// Representation of a field in the generated prost struct
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldShape {
    /// A singular string. With explicit presence prost emits `Option<String>`.
    ScalarString {
        /// Whether the field tracks presence
        explicit_presence: bool,
    },
    /// A `map<string, string>`
    StringMap,
    /// Anything else, described for error messages
    Unsupported(String),
}

impl FieldShape {
    /// Describes the shape for diagnostics
    pub fn describe(&self) -> &str {
        match self {
            FieldShape::ScalarString {
                explicit_presence: false,
            } => "string",
            FieldShape::ScalarString {
                explicit_presence: true,
            } => "optional string",
            FieldShape::StringMap => "map<string, string>",
            FieldShape::Unsupported(description) => description,
        }
    }
}
