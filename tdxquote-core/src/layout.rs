//! Layout descriptors for the vendor's fixed-width record files.
//!
//! A layout binds a record's byte width to the ordered list of little-endian
//! fields packed inside it. Both supported kinds use a 32-byte stride:
//!
//! | Kind   | Fields                                                                 |
//! |--------|------------------------------------------------------------------------|
//! | Daily  | u32 date, u32 open, u32 high, u32 low, u32 close, f32 amount, u32 volume, u32 prev_close |
//! | Minute | u16 packed_date, u16 minutes, f32 open, f32 high, f32 low, f32 close, f32 amount, u32 volume, u32 reserved |

use serde::{Deserialize, Serialize};

use crate::error::DecodeError;
use crate::record::RawRecord;

/// Primitive type of a packed field. All fields are little-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldType {
    U16,
    U32,
    F32,
}

impl FieldType {
    /// Width of the field in bytes.
    pub const fn size(self) -> usize {
        match self {
            FieldType::U16 => 2,
            FieldType::U32 | FieldType::F32 => 4,
        }
    }
}

/// One named field within a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub ty: FieldType,
}

const fn field(name: &'static str, ty: FieldType) -> FieldSpec {
    FieldSpec { name, ty }
}

/// A decoded field value, before any kind-specific transform.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    U16(u16),
    U32(u32),
    F32(f32),
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::U16(v) => write!(f, "{v}"),
            FieldValue::U32(v) => write!(f, "{v}"),
            FieldValue::F32(v) => write!(f, "{v}"),
        }
    }
}

/// Byte layout of one record kind.
#[derive(Debug, PartialEq, Eq)]
pub struct RecordLayout {
    pub name: &'static str,
    pub fields: &'static [FieldSpec],
}

impl RecordLayout {
    /// Record width in bytes: the sum of all field sizes.
    pub const fn width(&self) -> usize {
        let mut total = 0;
        let mut i = 0;
        while i < self.fields.len() {
            total += self.fields[i].ty.size();
            i += 1;
        }
        total
    }

    /// Byte offset of the named field within a record.
    pub fn offset_of(&self, name: &str) -> Option<usize> {
        let mut offset = 0;
        for f in self.fields {
            if f.name == name {
                return Some(offset);
            }
            offset += f.ty.size();
        }
        None
    }

    /// Number of records in a buffer of `len` bytes.
    ///
    /// Fails with `MalformedFile` unless `len` is an exact multiple of the
    /// record width. Zero bytes is zero records.
    pub fn record_count(&self, len: usize) -> Result<usize, DecodeError> {
        let width = self.width();
        if len % width != 0 {
            return Err(DecodeError::MalformedFile { len, width });
        }
        Ok(len / width)
    }

    /// Walk `buf` in fixed strides, in ascending offset order.
    ///
    /// The caller is expected to have validated the length with
    /// [`record_count`](Self::record_count); a trailing partial stride is not
    /// yielded.
    pub fn strides<'a>(&'static self, buf: &'a [u8]) -> impl Iterator<Item = RawRecord<'a>> + 'a {
        buf.chunks_exact(self.width())
            .map(move |bytes| RawRecord::new(self, bytes))
    }
}

/// Daily (`.day`) record layout. Prices are stored in hundredths.
pub static DAILY_LAYOUT: RecordLayout = RecordLayout {
    name: "daily",
    fields: &[
        field("date", FieldType::U32),
        field("open", FieldType::U32),
        field("high", FieldType::U32),
        field("low", FieldType::U32),
        field("close", FieldType::U32),
        field("amount", FieldType::F32),
        field("volume", FieldType::U32),
        field("prev_close", FieldType::U32),
    ],
};

/// Minute (`.lc5` / `.lc1`) record layout. Prices are native floats.
pub static MINUTE_LAYOUT: RecordLayout = RecordLayout {
    name: "minute",
    fields: &[
        field("packed_date", FieldType::U16),
        field("minutes", FieldType::U16),
        field("open", FieldType::F32),
        field("high", FieldType::F32),
        field("low", FieldType::F32),
        field("close", FieldType::F32),
        field("amount", FieldType::F32),
        field("volume", FieldType::U32),
        field("reserved", FieldType::U32),
    ],
};

/// Width shared by every supported record kind.
pub const RECORD_WIDTH: usize = 32;

const _: () = assert!(DAILY_LAYOUT.width() == RECORD_WIDTH);
const _: () = assert!(MINUTE_LAYOUT.width() == RECORD_WIDTH);
