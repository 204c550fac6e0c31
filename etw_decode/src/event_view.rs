// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

use etw_types::Guid;
use etw_types::PointerWidth;
use etw_types::RecordContext;
use log::debug;
use log::trace;

use crate::array_view::read_element;
use crate::byte_reader::PayloadReader;
use crate::charconv;
use crate::offset_cache::OffsetCache;
use crate::ArrayCount;
use crate::ArrayView;
use crate::DecodeError;
use crate::DecodeOptions;
use crate::ElementType;
use crate::EventSchema;
use crate::FieldKind;
use crate::FieldValue;
use crate::ScalarType;

macro_rules! scalar_accessor {
    ($name:ident, $ty:ty, $scalar:ident, $read:ident) => {
        #[doc = concat!("Reads a `", stringify!($scalar), "` field.")]
        pub fn $name(&self, index: usize) -> Result<$ty, DecodeError> {
            return self.read_fixed(
                index,
                FieldKind::Scalar(ScalarType::$scalar),
                PayloadReader::$read,
            );
        }
    };
}

/// Field accessor for one event payload.
///
/// An `EventView` borrows a payload and the schema that describes it, and
/// decodes fields on request, in any order. It never copies the payload:
/// strings are decoded into new `String`s, everything else is read in place
/// or returned as a slice of the payload.
///
/// Offsets are resolved lazily. The first request for field N computes the
/// sizes of fields `0..N` (starting from the highest field whose offset is
/// already known) and caches every offset it passes. Later requests for any
/// of those fields are cache hits. Fields after the highest requested field
/// are never examined.
///
/// A malformed payload makes the affected accessor return a [`DecodeError`].
/// Because offsets are sequential, a field whose size cannot be determined
/// makes every later field fail too, while earlier fields stay readable.
///
/// The offset cache is filled through `&self`, so an `EventView` is `Send` but
/// not `Sync`. Clone the view to give another thread its own cache.
///
/// The view trusts its schema. A schema that does not match the payload
/// usually shows up as [`DecodeError::OutOfBounds`] or garbage values.
#[derive(Clone, Debug)]
pub struct EventView<'sch, 'dat> {
    schema: &'sch EventSchema<'sch>,
    context: RecordContext,
    payload: &'dat [u8],
    reader: PayloadReader,
    options: DecodeOptions,
    cache: OffsetCache,
}

impl<'sch, 'dat> EventView<'sch, 'dat> {
    /// Creates a view of `payload` using [`DecodeOptions::Default`].
    /// Address-sized fields use `context.pointer_width`.
    pub fn new(schema: &'sch EventSchema<'sch>, context: RecordContext, payload: &'dat [u8]) -> Self {
        return Self::with_options(schema, context, payload, DecodeOptions::Default);
    }

    /// Creates a view of `payload` with the specified options.
    pub fn with_options(
        schema: &'sch EventSchema<'sch>,
        context: RecordContext,
        payload: &'dat [u8],
        options: DecodeOptions,
    ) -> Self {
        return Self {
            schema,
            context,
            payload,
            reader: PayloadReader::new(context.pointer_width),
            options,
            cache: OffsetCache::new(schema.len()),
        };
    }

    /// Points this view at another record that uses the same schema, keeping the
    /// cache allocation. Every cached offset is discarded first, and
    /// [`EventView::size_computations`] restarts at 0.
    pub fn rebind(&mut self, context: RecordContext, payload: &'dat [u8]) {
        self.cache.reset();
        self.context = context;
        self.payload = payload;
        self.reader = PayloadReader::new(context.pointer_width);
    }

    /// The schema this view decodes with.
    pub fn schema(&self) -> &'sch EventSchema<'sch> {
        return self.schema;
    }

    /// Metadata of the record.
    pub fn context(&self) -> &RecordContext {
        return &self.context;
    }

    /// The payload bytes.
    pub fn payload(&self) -> &'dat [u8] {
        return self.payload;
    }

    /// Width of address-sized fields.
    pub fn pointer_width(&self) -> PointerWidth {
        return self.reader.pointer_width();
    }

    /// Options used when decoding strings.
    pub fn options(&self) -> DecodeOptions {
        return self.options;
    }

    /// Number of fields in the schema.
    pub fn len(&self) -> usize {
        return self.schema.len();
    }

    /// True if the schema has no fields.
    pub fn is_empty(&self) -> bool {
        return self.schema.is_empty();
    }

    /// Returns the index of the field named `name`.
    pub fn field_index(&self, name: &str) -> Result<usize, DecodeError> {
        return self
            .schema
            .field_index(name)
            .ok_or_else(|| self.fail(DecodeError::UnknownField(name.to_string())));
    }

    /// Number of offset slots resolved so far, including the end-of-last-field
    /// slot once it is known.
    pub fn resolved_offsets(&self) -> usize {
        return self.cache.resolved_count();
    }

    /// Number of field sizes computed by this view since it was created or
    /// rebound. Repeating a request does not increase it.
    pub fn size_computations(&self) -> usize {
        return self.cache.size_computations();
    }

    /// Byte offset of field `index` within the payload.
    pub fn offset(&self, index: usize) -> Result<usize, DecodeError> {
        self.kind_of(index)?;
        return self.resolve(index);
    }

    /// Size of field `index` in bytes, including any terminator.
    pub fn size(&self, index: usize) -> Result<usize, DecodeError> {
        self.kind_of(index)?;
        let end = self.resolve(index + 1)?;
        let start = self.resolve(index)?;
        return Ok(end - start);
    }

    /// The bytes of field `index`, including any terminator.
    pub fn field_bytes(&self, index: usize) -> Result<&'dat [u8], DecodeError> {
        self.kind_of(index)?;
        let end = self.resolve(index + 1)?;
        let start = self.resolve(index)?;
        let payload = self.payload;
        return payload
            .get(start..end)
            .ok_or_else(|| self.fail(self.out_of_bounds(index, start, end - start)));
    }

    scalar_accessor!(u8, u8, U8, read_u8);
    scalar_accessor!(i8, i8, I8, read_i8);
    scalar_accessor!(u16, u16, U16, read_u16);
    scalar_accessor!(i16, i16, I16, read_i16);
    scalar_accessor!(u32, u32, U32, read_u32);
    scalar_accessor!(i32, i32, I32, read_i32);
    scalar_accessor!(u64, u64, U64, read_u64);
    scalar_accessor!(i64, i64, I64, read_i64);
    scalar_accessor!(f32, f32, F32, read_f32);
    scalar_accessor!(f64, f64, F64, read_f64);

    /// Reads a `Bool32` field. Any nonzero value is true.
    pub fn bool32(&self, index: usize) -> Result<bool, DecodeError> {
        let value = self.read_fixed(
            index,
            FieldKind::Scalar(ScalarType::Bool32),
            PayloadReader::read_u32,
        )?;
        return Ok(value != 0);
    }

    /// Reads a `Pointer` field, widened to u64.
    pub fn pointer(&self, index: usize) -> Result<u64, DecodeError> {
        return self.read_fixed(index, FieldKind::Pointer, PayloadReader::read_pointer);
    }

    /// Reads a `Guid` field.
    pub fn guid(&self, index: usize) -> Result<Guid, DecodeError> {
        return self.read_fixed(index, FieldKind::Guid, PayloadReader::read_guid);
    }

    /// Returns the bytes of a `Blob` field.
    pub fn blob(&self, index: usize) -> Result<&'dat [u8], DecodeError> {
        match self.kind_of(index)? {
            FieldKind::Blob(_) => {}
            actual => return Err(self.mismatch(index, "Blob", actual)),
        }

        return self.field_bytes(index);
    }

    /// Returns the text bytes of a string field, before character decoding:
    ///
    /// - `Utf16Z`, `AnsiZ`: without the terminator.
    /// - `Utf16Fixed`: up to the first NUL in the buffer.
    /// - `Utf16Counted`: all bytes.
    /// - `Utf16Rest`, `AnsiRest`: the rest of the payload, without trailing NULs
    ///   if [`DecodeOptions::TrimRestNul`] is set.
    pub fn string_bytes(&self, index: usize) -> Result<&'dat [u8], DecodeError> {
        let kind = self.kind_of(index)?;
        if !kind.is_string() {
            return Err(self.mismatch(index, "String", kind));
        }

        let bytes = self.field_bytes(index)?;
        let trim = self.options.has_flag(DecodeOptions::TrimRestNul);
        let len = match kind {
            FieldKind::Utf16Z => bytes.len().saturating_sub(2),
            FieldKind::AnsiZ => bytes.len().saturating_sub(1),
            FieldKind::Utf16Fixed(_) => charconv::utf16le_strnlen(bytes),
            FieldKind::Utf16Rest if trim => charconv::utf16le_trim_nul_len(bytes),
            FieldKind::AnsiRest if trim => charconv::trim_nul_len(bytes),
            _ => bytes.len(),
        };
        return Ok(&bytes[..len]);
    }

    /// Decodes a string field. UTF-16 kinds are decoded as UTF-16LE; an unpaired
    /// surrogate is an error unless [`DecodeOptions::Utf16Lossy`] is set. 8-bit
    /// kinds are decoded as Latin-1 and never fail.
    pub fn string(&self, index: usize) -> Result<String, DecodeError> {
        let bytes = self.string_bytes(index)?;
        return match self.kind_of(index)? {
            FieldKind::AnsiZ | FieldKind::AnsiRest => Ok(charconv::latin1_to_string(bytes)),
            _ => charconv::utf16le_to_string(
                bytes,
                self.options.has_flag(DecodeOptions::Utf16Lossy),
            )
            .map_err(|position| {
                self.fail(DecodeError::InvalidUtf16 {
                    field: index,
                    position,
                })
            }),
        };
    }

    /// Returns the SID bytes of a `Sid` field, or `None` if the record has no SID.
    pub fn sid(&self, index: usize) -> Result<Option<&'dat [u8]>, DecodeError> {
        let kind = self.kind_of(index)?;
        if kind != FieldKind::Sid {
            return Err(self.mismatch(index, "Sid", kind));
        }

        let bytes = self.field_bytes(index)?;
        if self.reader.read_u32(bytes, 0) == Some(0) {
            return Ok(None);
        }

        return Ok(bytes.get(2 * self.reader.pointer_size()..));
    }

    /// Returns a lazy view of an `Array` field's elements.
    pub fn array(&self, index: usize) -> Result<ArrayView<'dat>, DecodeError> {
        let element = match self.kind_of(index)? {
            FieldKind::Array { element, .. } => element,
            actual => return Err(self.mismatch(index, "Array", actual)),
        };

        let bytes = self.field_bytes(index)?;
        return Ok(ArrayView::new(bytes, element, self.reader));
    }

    /// Decodes field `index`, whatever its kind.
    pub fn value(&self, index: usize) -> Result<FieldValue<'dat>, DecodeError> {
        let kind = self.kind_of(index)?;
        let element = match kind {
            FieldKind::Scalar(scalar) => ElementType::Scalar(scalar),
            FieldKind::Pointer => ElementType::Pointer,
            FieldKind::Guid => ElementType::Guid,
            FieldKind::Blob(len) => ElementType::Blob(len),
            FieldKind::Sid => return Ok(FieldValue::Sid(self.sid(index)?)),
            FieldKind::Array { .. } => return Ok(FieldValue::Array(self.array(index)?)),
            _ => return Ok(FieldValue::String(self.string(index)?)),
        };

        let offset = self.resolve(index)?;
        return read_element(self.reader, element, self.payload, offset)
            .map(FieldValue::Fixed)
            .ok_or_else(|| {
                self.fail(self.out_of_bounds(index, offset, element.size(self.pointer_width())))
            });
    }

    /// Returns an iterator over `(name, value)` for every field, in schema order.
    /// Each value is decoded when the iterator reaches it.
    pub fn values(
        &self,
    ) -> impl Iterator<Item = (&'sch str, Result<FieldValue<'dat>, DecodeError>)> + '_ {
        return self
            .schema
            .fields()
            .iter()
            .enumerate()
            .map(move |(index, field)| (field.name(), self.value(index)));
    }

    fn read_fixed<T>(
        &self,
        index: usize,
        expected: FieldKind,
        read: fn(PayloadReader, &[u8], usize) -> Option<T>,
    ) -> Result<T, DecodeError> {
        let kind = self.kind_of(index)?;
        if kind != expected {
            return Err(self.mismatch(index, expected.name(), kind));
        }

        let offset = self.resolve(index)?;
        return read(self.reader, self.payload, offset).ok_or_else(|| {
            let size = expected.fixed_size(self.pointer_width()).unwrap_or(0);
            self.fail(self.out_of_bounds(index, offset, size))
        });
    }

    fn kind_of(&self, index: usize) -> Result<FieldKind, DecodeError> {
        return self
            .schema
            .field(index)
            .map(|field| field.kind())
            .ok_or_else(|| self.fail(DecodeError::NoSuchField(index)));
    }

    /// Returns the offset stored in `slot`, filling it and every unresolved slot
    /// before it. Slot `len()` is the end of the last field.
    fn resolve(&self, slot: usize) -> Result<usize, DecodeError> {
        if let Some(offset) = self.cache.get(slot) {
            return Ok(offset);
        }

        let (mut index, mut offset) = match self.cache.nearest_resolved(slot) {
            Some(found) => found,
            None => {
                self.cache.set(0, 0);
                (0, 0)
            }
        };

        while index < slot {
            self.cache.count_size_computation();
            let size = self.compute_size(index, offset)?;
            let end = match offset.checked_add(size) {
                Some(end) if end <= self.payload.len() => end,
                _ => return Err(self.fail(self.out_of_bounds(index, offset, size))),
            };

            trace!(
                "{}: field {} at {}, size {}",
                self.schema,
                index,
                offset,
                size
            );

            index += 1;
            offset = end;
            self.cache.set(index, offset);
        }

        return Ok(offset);
    }

    /// Size of field `index`, which starts at `offset`. Offsets of all earlier
    /// fields are resolved.
    fn compute_size(&self, index: usize, offset: usize) -> Result<usize, DecodeError> {
        let pointer_width = self.pointer_width();
        return match self.kind_of(index)? {
            FieldKind::Scalar(scalar) => Ok(scalar.size()),
            FieldKind::Pointer => Ok(pointer_width.size()),
            FieldKind::Guid => Ok(Guid::SIZE),
            FieldKind::Blob(len) => Ok(len as usize),
            FieldKind::Utf16Fixed(chars) => Ok(chars as usize * 2),
            FieldKind::Utf16Z => self
                .reader
                .utf16_nul_terminated_size(self.payload, offset)
                .ok_or_else(|| {
                    self.fail(DecodeError::Unterminated {
                        field: index,
                        start: offset,
                    })
                }),
            FieldKind::AnsiZ => self
                .reader
                .nul_terminated_size(self.payload, offset)
                .ok_or_else(|| {
                    self.fail(DecodeError::Unterminated {
                        field: index,
                        start: offset,
                    })
                }),
            FieldKind::Utf16Counted { count_field } => {
                let count = self.count_value(index, count_field)?;
                self.counted_size(index, count, 2)
            }
            FieldKind::Utf16Rest | FieldKind::AnsiRest => {
                Ok(self.payload.len().saturating_sub(offset))
            }
            FieldKind::Sid => self.sid_size(index, offset),
            FieldKind::Array { element, count } => {
                let element_size = element.size(pointer_width);
                let count = match count {
                    ArrayCount::Field(count_field) => self.count_value(index, count_field)?,
                    ArrayCount::Fixed(count) => count.into(),
                    ArrayCount::RestOfPayload => {
                        let remaining = self.payload.len().saturating_sub(offset);
                        let whole = match remaining.checked_rem(element_size) {
                            Some(partial) => partial == 0,
                            None => remaining == 0,
                        };
                        return if whole {
                            Ok(remaining)
                        } else {
                            Err(self.fail(DecodeError::PartialElement {
                                field: index,
                                remaining,
                                element_size,
                            }))
                        };
                    }
                };
                self.counted_size(index, count, element_size)
            }
        };
    }

    /// Reads the count stored in `count_field` for variable-length field `index`.
    fn count_value(&self, index: usize, count_field: usize) -> Result<u64, DecodeError> {
        let element = match self.schema.field(count_field) {
            Some(source) if count_field < index => match source.kind() {
                FieldKind::Scalar(scalar) if scalar.is_integer() => ElementType::Scalar(scalar),
                FieldKind::Pointer => ElementType::Pointer,
                _ => return Err(self.invalid_count_field(index, count_field)),
            },
            _ => return Err(self.invalid_count_field(index, count_field)),
        };

        let offset = self.resolve(count_field)?;
        return read_element(self.reader, element, self.payload, offset)
            .and_then(|value| value.as_u64())
            .ok_or_else(|| {
                self.fail(self.out_of_bounds(
                    count_field,
                    offset,
                    element.size(self.pointer_width()),
                ))
            });
    }

    fn counted_size(&self, index: usize, count: u64, element_size: usize) -> Result<usize, DecodeError> {
        return usize::try_from(count)
            .ok()
            .and_then(|count| count.checked_mul(element_size))
            .ok_or_else(|| {
                self.fail(DecodeError::CountOverflow {
                    field: index,
                    count,
                    element_size,
                })
            });
    }

    /// A SID field is either a 4-byte 0, or a `TOKEN_USER` (two pointers)
    /// followed by a SID of `8 + 4 * SubAuthorityCount` bytes, where
    /// `SubAuthorityCount` is byte 1 of the SID.
    fn sid_size(&self, index: usize, offset: usize) -> Result<usize, DecodeError> {
        let first = self
            .reader
            .read_u32(self.payload, offset)
            .ok_or_else(|| self.fail(self.out_of_bounds(index, offset, 4)))?;
        if first == 0 {
            return Ok(4);
        }

        let header = 2 * self.reader.pointer_size();
        let sub_authority_count = self
            .reader
            .read_u8(self.payload, offset + header + 1)
            .ok_or_else(|| self.fail(self.out_of_bounds(index, offset, header + 8)))?;
        return Ok(header + 8 + 4 * sub_authority_count as usize);
    }

    fn invalid_count_field(&self, index: usize, count_field: usize) -> DecodeError {
        return self.fail(DecodeError::InvalidCountField {
            field: index,
            count_field,
        });
    }

    fn mismatch(&self, index: usize, expected: &'static str, actual: FieldKind) -> DecodeError {
        return self.fail(DecodeError::TypeMismatch {
            field: index,
            expected,
            actual: actual.name(),
        });
    }

    fn out_of_bounds(&self, index: usize, start: usize, size: usize) -> DecodeError {
        return DecodeError::OutOfBounds {
            field: index,
            start,
            end: start.saturating_add(size),
            len: self.payload.len(),
        };
    }

    fn fail(&self, error: DecodeError) -> DecodeError {
        debug!("{}: {}", self.schema, error);
        return error;
    }
}
