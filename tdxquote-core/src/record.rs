//! Raw record windows borrowed from a whole-file buffer.

use crate::layout::{FieldType, FieldValue, RecordLayout};

/// One stride of a file buffer, paired with the layout that describes it.
///
/// Borrowed for the duration of a single decode step and never mutated.
#[derive(Debug, Clone, Copy)]
pub struct RawRecord<'a> {
    layout: &'static RecordLayout,
    bytes: &'a [u8],
}

impl<'a> RawRecord<'a> {
    pub(crate) fn new(layout: &'static RecordLayout, bytes: &'a [u8]) -> Self {
        debug_assert_eq!(bytes.len(), layout.width());
        Self { layout, bytes }
    }

    pub fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    pub fn layout(&self) -> &'static RecordLayout {
        self.layout
    }

    /// Sequential little-endian reader over the record's fields.
    pub(crate) fn reader(&self) -> FieldReader<'a> {
        FieldReader {
            bytes: self.bytes,
            pos: 0,
        }
    }

    /// Unpack every field in layout order without applying any transform.
    pub fn values(&self) -> Vec<FieldValue> {
        let mut reader = self.reader();
        self.layout
            .fields
            .iter()
            .map(|f| match f.ty {
                FieldType::U16 => FieldValue::U16(reader.u16()),
                FieldType::U32 => FieldValue::U32(reader.u32()),
                FieldType::F32 => FieldValue::F32(reader.f32()),
            })
            .collect()
    }
}

/// Cursor that reads little-endian primitives front to back.
///
/// Only the crate's own layout-driven decoders hold one. Every field sequence
/// they read sums to exactly the layout width, so reads stay inside the window.
pub(crate) struct FieldReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl FieldReader<'_> {
    fn take<const N: usize>(&mut self) -> [u8; N] {
        let mut out = [0u8; N];
        out.copy_from_slice(&self.bytes[self.pos..self.pos + N]);
        self.pos += N;
        out
    }

    pub(crate) fn u16(&mut self) -> u16 {
        u16::from_le_bytes(self.take())
    }

    pub(crate) fn u32(&mut self) -> u32 {
        u32::from_le_bytes(self.take())
    }

    pub(crate) fn f32(&mut self) -> f32 {
        f32::from_le_bytes(self.take())
    }

    /// Bytes consumed so far.
    pub(crate) fn position(&self) -> usize {
        self.pos
    }
}
