//! Low-level protobuf wire format reading.
//!
//! `prost-types` decodes option messages into fixed structs and drops any
//! extension it does not know, including `protonorm.rules`. The plugin driver
//! therefore walks the top level of a `CodeGeneratorRequest` by hand and keeps
//! the raw `FileDescriptorProto` payloads intact.
//!
//! ## Wire Format Overview
//!
//! Each protobuf field is encoded as:
//! - A varint "tag" containing the field number and wire type
//! - The field data (format depends on wire type)

use crate::error::{Error, Result};

/// Protobuf wire types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum WireType {
    /// Variable-length integer
    Varint = 0,
    /// 64-bit fixed-width
    I64 = 1,
    /// Length-delimited (strings, bytes, embedded messages)
    Len = 2,
    /// Start group (deprecated)
    StartGroup = 3,
    /// End group (deprecated)
    EndGroup = 4,
    /// 32-bit fixed-width
    I32 = 5,
}

impl TryFrom<u8> for WireType {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(WireType::Varint),
            1 => Ok(WireType::I64),
            2 => Ok(WireType::Len),
            3 => Ok(WireType::StartGroup),
            4 => Ok(WireType::EndGroup),
            5 => Ok(WireType::I32),
            _ => Err(Error::invalid_wire_format(
                0,
                format!("unknown wire type: {}", value),
            )),
        }
    }
}

/// Maximum valid protobuf field number (2^29 - 1)
pub const MAX_VALID_NUMBER: u32 = 536_870_911;

/// Decode a varint from the given bytes.
///
/// Returns the decoded value and the number of bytes consumed.
pub fn decode_varint(data: &[u8]) -> Result<(u64, usize)> {
    let mut result: u64 = 0;
    let mut shift = 0;

    for (i, &byte) in data.iter().enumerate() {
        if i >= 10 {
            return Err(Error::varint_decode(i));
        }

        result |= ((byte & 0x7F) as u64) << shift;
        shift += 7;

        if byte & 0x80 == 0 {
            return Ok((result, i + 1));
        }
    }

    Err(Error::varint_decode(data.len()))
}

/// One top-level field of an encoded message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WireField<'a> {
    /// Field number
    pub number: u32,
    /// Wire type from the tag
    pub wire_type: WireType,
    /// Value bytes: the payload for `Len`, the raw encoding otherwise
    pub value: &'a [u8],
}

/// Read a single field from the start of `data`.
///
/// Returns the field and the total bytes consumed (tag included).
pub fn read_field(data: &[u8]) -> Result<(WireField<'_>, usize)> {
    if data.is_empty() {
        return Err(Error::invalid_wire_format(0, "empty data"));
    }

    let (tag, tag_len) = decode_varint(data)
        .map_err(|_| Error::invalid_wire_format(0, "failed to decode field tag"))?;

    let wire_type = WireType::try_from((tag & 0x07) as u8)?;
    let number = (tag >> 3) as u32;

    if number == 0 || number > MAX_VALID_NUMBER {
        return Err(Error::InvalidFieldNumber {
            number,
            max: MAX_VALID_NUMBER,
        });
    }

    let rest = &data[tag_len..];
    let (value_start, value_len) = match wire_type {
        WireType::Varint => {
            let (_, len) = decode_varint(rest).map_err(|_| {
                Error::invalid_wire_format(tag_len, "failed to decode varint value")
            })?;
            (0, len)
        }
        WireType::I64 => (0, 8),
        WireType::I32 => (0, 4),
        WireType::Len => {
            let (length, prefix_len) = decode_varint(rest).map_err(|_| {
                Error::invalid_wire_format(tag_len, "failed to decode length prefix")
            })?;
            let length = usize::try_from(length).map_err(|_| {
                Error::invalid_wire_format(tag_len, "length prefix does not fit in memory")
            })?;
            (prefix_len, length)
        }
        WireType::StartGroup | WireType::EndGroup => {
            return Err(Error::invalid_wire_format(
                0,
                format!("unexpected group in field {}", number),
            ));
        }
    };

    let end = value_start
        .checked_add(value_len)
        .filter(|&end| end <= rest.len())
        .ok_or_else(|| {
            Error::invalid_wire_format(
                tag_len,
                format!(
                    "not enough bytes for field {} (need {}, have {})",
                    number,
                    value_len,
                    rest.len().saturating_sub(value_start)
                ),
            )
        })?;

    let field = WireField {
        number,
        wire_type,
        value: &rest[value_start..end],
    };
    Ok((field, tag_len + end))
}

/// Iterator over the top-level fields of an encoded message
#[derive(Debug, Clone)]
pub struct WireFields<'a> {
    data: &'a [u8],
    position: usize,
    failed: bool,
}

impl<'a> Iterator for WireFields<'a> {
    type Item = Result<WireField<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.position >= self.data.len() {
            return None;
        }

        match read_field(&self.data[self.position..]) {
            Ok((field, consumed)) => {
                self.position += consumed;
                Some(Ok(field))
            }
            Err(err) => {
                self.failed = true;
                Some(Err(offset_error(err, self.position)))
            }
        }
    }
}

/// Iterate over the top-level fields of `data`. Iteration stops after the
/// first error.
pub fn fields(data: &[u8]) -> WireFields<'_> {
    WireFields {
        data,
        position: 0,
        failed: false,
    }
}

fn offset_error(err: Error, base: usize) -> Error {
    match err {
        Error::InvalidWireFormat { offset, details } => Error::InvalidWireFormat {
            offset: base + offset,
            details,
        },
        Error::VarintDecode { offset } => Error::VarintDecode {
            offset: base + offset,
        },
        other => other,
    }
}
