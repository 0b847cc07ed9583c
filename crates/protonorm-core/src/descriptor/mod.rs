//! Descriptor decoding.
//!
//! Turns serialized descriptors into the [`schema`](crate::schema)
//! representation the synthesizer works on.
//!
//! ## Architecture
//!
//! 1. Raw `FileDescriptorProto` payloads are framed into a
//!    `FileDescriptorSet` and decoded into a prost-reflect [`DescriptorPool`].
//!    prost-reflect keeps option bytes, so custom extensions survive.
//! 2. [`SchemaExtractor`] resolves the `protonorm.rules` extension in that pool
//!    and walks the messages of a file, classifying each field's shape and
//!    decoding any rules attached to it.

pub mod wire;

use crate::codegen::naming;
use crate::constraint::{Constraint, MapRules, StringRules};
use crate::error::{Error, Result};
use crate::schema::{FieldSchema, FieldShape, FileSchema, MessageSchema};
use bytes::{Bytes, BytesMut};
use prost::encoding::{encode_key, encode_varint, WireType as ProstWireType};
use prost_reflect::{
    Cardinality, DescriptorPool, DynamicMessage, ExtensionDescriptor, FieldDescriptor, Kind,
    MessageDescriptor,
};
use std::collections::BTreeSet;
use tracing::{debug, trace};
use wire::WireType;

/// Full name of the field option extension carrying the rules
pub const RULES_EXTENSION: &str = "protonorm.rules";

/// Field number of `FileDescriptorSet.file`
pub const DESCRIPTOR_SET_FILE_FIELD: u32 = 1;

/// Field number of `FileDescriptorProto.name`
const FILE_NAME_FIELD: u32 = 1;

/// Frame raw `FileDescriptorProto` payloads as a `FileDescriptorSet`
pub fn frame_descriptor_set<'a>(files: impl IntoIterator<Item = &'a [u8]>) -> Bytes {
    let mut set = BytesMut::new();
    for file in files {
        encode_key(DESCRIPTOR_SET_FILE_FIELD, ProstWireType::LengthDelimited, &mut set);
        encode_varint(file.len() as u64, &mut set);
        set.extend_from_slice(file);
    }
    set.freeze()
}

/// Decode a serialized `FileDescriptorSet` into a pool
pub fn decode_pool(descriptor_set: impl bytes::Buf) -> Result<DescriptorPool> {
    let pool = DescriptorPool::decode(descriptor_set)
        .map_err(|e| Error::descriptor_build(e.to_string()))?;
    debug!("Decoded descriptor pool with {} file(s)", pool.files().count());
    Ok(pool)
}

/// Build a pool from the `FileDescriptorProto`s stored under `field_number`
/// in each of `messages`.
///
/// The payloads are kept as raw bytes so option extensions survive. A file
/// that appears more than once is taken from its first occurrence.
pub fn pool_from_messages<'a>(
    messages: impl IntoIterator<Item = &'a [u8]>,
    field_number: u32,
) -> Result<DescriptorPool> {
    let mut seen = BTreeSet::new();
    let mut files = Vec::new();

    for message in messages {
        for field in wire::fields(message) {
            let field = field?;
            if field.number != field_number || field.wire_type != WireType::Len {
                continue;
            }
            let name = file_name(field.value)?;
            if seen.insert(name.to_string()) {
                files.push(field.value);
            } else {
                trace!("Skipping duplicate descriptor for {}", name);
            }
        }
    }

    decode_pool(frame_descriptor_set(files))
}

/// Read `FileDescriptorProto.name` without decoding the rest of the file
fn file_name(file: &[u8]) -> Result<&str> {
    for field in wire::fields(file) {
        let field = field?;
        if field.number == FILE_NAME_FIELD && field.wire_type == WireType::Len {
            return std::str::from_utf8(field.value)
                .map_err(|_| Error::invalid_wire_format(0, "file name is not valid UTF-8"));
        }
    }
    Err(Error::descriptor_build("file descriptor without a name"))
}

/// Extracts [`FileSchema`]s from a descriptor pool
#[derive(Debug, Clone)]
pub struct SchemaExtractor<'a> {
    pool: &'a DescriptorPool,
    rules: Option<ExtensionDescriptor>,
}

impl<'a> SchemaExtractor<'a> {
    /// Creates an extractor for the given pool.
    ///
    /// If the pool does not contain `protonorm/validate.proto`, no field can
    /// carry rules and every extracted field is unconstrained.
    pub fn new(pool: &'a DescriptorPool) -> Self {
        let rules = pool.get_extension_by_name(RULES_EXTENSION);
        if rules.is_none() {
            debug!("{} is not defined in the descriptor pool", RULES_EXTENSION);
        }
        Self { pool, rules }
    }

    /// Returns the pool this extractor reads from
    pub fn pool(&self) -> &'a DescriptorPool {
        self.pool
    }

    /// Extract the schema of one file by name
    pub fn extract_file(&self, name: &str) -> Result<FileSchema> {
        let file = self
            .pool
            .get_file_by_name(name)
            .ok_or_else(|| Error::file_not_found(name))?;

        let package = file.package_name().to_string();
        let mut messages = Vec::new();
        for message in file.messages() {
            self.collect_message(&message, &package, &mut messages)?;
        }

        trace!("Extracted {} message(s) from {}", messages.len(), name);
        Ok(FileSchema {
            name: name.to_string(),
            package,
            messages,
        })
    }

    fn collect_message(
        &self,
        message: &MessageDescriptor,
        package: &str,
        out: &mut Vec<MessageSchema>,
    ) -> Result<()> {
        if message.is_map_entry() {
            return Ok(());
        }

        let mut fields = Vec::new();
        for field in message.fields() {
            fields.push(FieldSchema {
                name: field.name().to_string(),
                rust_ident: naming::field_ident(field.name()),
                shape: field_shape(&field),
                constraint: self.constraint(message, &field)?,
            });
        }

        out.push(MessageSchema {
            full_name: message.full_name().to_string(),
            rust_path: naming::message_path(message.full_name(), package),
            fields,
        });

        for child in message.child_messages() {
            self.collect_message(&child, package, out)?;
        }
        Ok(())
    }

    fn constraint(
        &self,
        message: &MessageDescriptor,
        field: &FieldDescriptor,
    ) -> Result<Option<Constraint>> {
        let Some(extension) = &self.rules else {
            return Ok(None);
        };

        let options = field.options();
        if !options.has_extension(extension) {
            return Ok(None);
        }

        let value = options.get_extension(extension);
        let rules = value.as_message().ok_or_else(|| {
            Error::invalid_constraint(
                message.full_name(),
                field.name(),
                format!("{} is not a message", RULES_EXTENSION),
            )
        })?;

        if let Some(string) = set_message(rules, "string") {
            let constraint = StringRules {
                trim: true,
                min_len: get_u32(&string, "min_len").map(|v| v as usize),
                max_len: get_u32(&string, "max_len").map(|v| v as usize),
                reject_whitespace: get_bool(&string, "no_whitespace").unwrap_or(false),
            };
            trace!("{}.{}: {:?}", message.full_name(), field.name(), constraint);
            return Ok(Some(constraint.into()));
        }

        if let Some(map) = set_message(rules, "map") {
            let constraint = MapRules {
                trim: true,
                // An unset field reads as the declared `[default = true]`
                drop_blank: map
                    .get_field_by_name("drop_blank")
                    .and_then(|value| value.as_bool())
                    .unwrap_or(true),
            };
            trace!("{}.{}: {:?}", message.full_name(), field.name(), constraint);
            return Ok(Some(constraint.into()));
        }

        Err(Error::invalid_constraint(
            message.full_name(),
            field.name(),
            "rules option sets neither `string` nor `map`",
        ))
    }
}

fn set_message(message: &DynamicMessage, name: &str) -> Option<DynamicMessage> {
    if !message.has_field_by_name(name) {
        return None;
    }
    message.get_field_by_name(name)?.as_message().cloned()
}

fn get_u32(message: &DynamicMessage, name: &str) -> Option<u32> {
    if !message.has_field_by_name(name) {
        return None;
    }
    message.get_field_by_name(name)?.as_u32()
}

fn get_bool(message: &DynamicMessage, name: &str) -> Option<bool> {
    if !message.has_field_by_name(name) {
        return None;
    }
    message.get_field_by_name(name)?.as_bool()
}

/// Classify how prost represents a field
fn field_shape(field: &FieldDescriptor) -> FieldShape {
    if field.is_map() {
        if let Kind::Message(entry) = field.kind() {
            let key = entry.map_entry_key_field().kind();
            let value = entry.map_entry_value_field().kind();
            if matches!((&key, &value), (Kind::String, Kind::String)) {
                return FieldShape::StringMap;
            }
            return FieldShape::Unsupported(format!(
                "map<{}, {}>",
                describe_kind(&key),
                describe_kind(&value)
            ));
        }
    }

    if field.is_list() {
        return FieldShape::Unsupported(format!("repeated {}", describe_kind(&field.kind())));
    }

    // proto3 `optional` fields sit in a synthetic oneof of their own
    if let Some(oneof) = field.containing_oneof() {
        if !field.field_descriptor_proto().proto3_optional() {
            return FieldShape::Unsupported(format!(
                "{} in oneof {}",
                describe_kind(&field.kind()),
                oneof.name()
            ));
        }
    }

    match field.kind() {
        Kind::String => FieldShape::ScalarString {
            explicit_presence: field.supports_presence()
                && field.cardinality() != Cardinality::Required,
        },
        other => FieldShape::Unsupported(describe_kind(&other)),
    }
}

fn describe_kind(kind: &Kind) -> String {
    match kind {
        Kind::Double => "double".to_string(),
        Kind::Float => "float".to_string(),
        Kind::Int32 => "int32".to_string(),
        Kind::Int64 => "int64".to_string(),
        Kind::Uint32 => "uint32".to_string(),
        Kind::Uint64 => "uint64".to_string(),
        Kind::Sint32 => "sint32".to_string(),
        Kind::Sint64 => "sint64".to_string(),
        Kind::Fixed32 => "fixed32".to_string(),
        Kind::Fixed64 => "fixed64".to_string(),
        Kind::Sfixed32 => "sfixed32".to_string(),
        Kind::Sfixed64 => "sfixed64".to_string(),
        Kind::Bool => "bool".to_string(),
        Kind::String => "string".to_string(),
        Kind::Bytes => "bytes".to_string(),
        Kind::Message(message) => message.full_name().to_string(),
        Kind::Enum(enum_type) => enum_type.full_name().to_string(),
    }
}
