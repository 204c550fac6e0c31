// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

use core::fmt;

use etw_types::EventKey;
use etw_types::Guid;
use etw_types::PointerWidth;

use crate::SchemaError;

/// Fixed-width value types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScalarType {
    /// 8-bit unsigned integer.
    U8,
    /// 8-bit signed integer.
    I8,
    /// 16-bit unsigned integer.
    U16,
    /// 16-bit signed integer.
    I16,
    /// 32-bit unsigned integer.
    U32,
    /// 32-bit signed integer.
    I32,
    /// 64-bit unsigned integer.
    U64,
    /// 64-bit signed integer.
    I64,
    /// 32-bit float.
    F32,
    /// 64-bit float.
    F64,
    /// Win32 `BOOL`: 4-byte integer, 0 = false, nonzero = true.
    Bool32,
}

impl ScalarType {
    /// Size in bytes: 1, 2, 4, or 8.
    pub const fn size(self) -> usize {
        return match self {
            ScalarType::U8 | ScalarType::I8 => 1,
            ScalarType::U16 | ScalarType::I16 => 2,
            ScalarType::U32 | ScalarType::I32 | ScalarType::F32 | ScalarType::Bool32 => 4,
            ScalarType::U64 | ScalarType::I64 | ScalarType::F64 => 8,
        };
    }

    /// True for the integer types. Only integer fields can supply an element
    /// count.
    pub const fn is_integer(self) -> bool {
        return !matches!(
            self,
            ScalarType::F32 | ScalarType::F64 | ScalarType::Bool32
        );
    }

    /// Type name, e.g. `"U32"`.
    pub const fn name(self) -> &'static str {
        return match self {
            ScalarType::U8 => "U8",
            ScalarType::I8 => "I8",
            ScalarType::U16 => "U16",
            ScalarType::I16 => "I16",
            ScalarType::U32 => "U32",
            ScalarType::I32 => "I32",
            ScalarType::U64 => "U64",
            ScalarType::I64 => "I64",
            ScalarType::F32 => "F32",
            ScalarType::F64 => "F64",
            ScalarType::Bool32 => "Bool32",
        };
    }
}

/// Element type of an array field. Every element type has a fixed size for a
/// given pointer width.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ElementType {
    /// Fixed-width value.
    Scalar(ScalarType),
    /// Address-sized value.
    Pointer,
    /// 16-byte GUID.
    Guid,
    /// Opaque block of N bytes.
    Blob(u16),
}

impl ElementType {
    /// Size of one element in bytes.
    pub const fn size(self, pointer_width: PointerWidth) -> usize {
        return match self {
            ElementType::Scalar(scalar) => scalar.size(),
            ElementType::Pointer => pointer_width.size(),
            ElementType::Guid => Guid::SIZE,
            ElementType::Blob(len) => len as usize,
        };
    }

    /// Type name, e.g. `"Pointer"`.
    pub const fn name(self) -> &'static str {
        return match self {
            ElementType::Scalar(scalar) => scalar.name(),
            ElementType::Pointer => "Pointer",
            ElementType::Guid => "Guid",
            ElementType::Blob(_) => "Blob",
        };
    }
}

/// Where an array field gets its element count.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ArrayCount {
    /// The value of the field with this index, which must be an earlier
    /// integer field.
    Field(usize),

    /// A count fixed by the schema.
    Fixed(u32),

    /// As many elements as fit in the rest of the payload. Must be the last
    /// field.
    RestOfPayload,
}

/// How a field is stored in the payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// Fixed-width value.
    Scalar(ScalarType),

    /// Address-sized unsigned value, 4 or 8 bytes depending on the record's
    /// pointer width.
    Pointer,

    /// 16-byte GUID in Windows `GUID` layout.
    Guid,

    /// Opaque block of N bytes.
    Blob(u16),

    /// UTF-16LE string terminated by a NUL code unit. Size includes the
    /// terminator.
    Utf16Z,

    /// UTF-16LE buffer of exactly N code units, e.g. `WCHAR Name[16]`. The value
    /// stops at the first NUL in the buffer.
    Utf16Fixed(u16),

    /// UTF-16LE string whose length in code units is the value of an earlier
    /// integer field. No terminator.
    Utf16Counted {
        /// Index of the field holding the code unit count.
        count_field: usize,
    },

    /// UTF-16LE string extending to the end of the payload. Must be the last field.
    Utf16Rest,

    /// 8-bit string terminated by a NUL byte. Size includes the terminator.
    AnsiZ,

    /// 8-bit (ASCII or Latin-1) string extending to the end of the payload. Must
    /// be the last field.
    AnsiRest,

    /// Windows security identifier, stored either as a 4-byte zero (no SID) or
    /// as a `TOKEN_USER` (two pointers) followed by the SID.
    Sid,

    /// Array of fixed-size elements.
    Array {
        /// Type of each element.
        element: ElementType,
        /// Where the element count comes from.
        count: ArrayCount,
    },
}

impl FieldKind {
    /// Kind name, e.g. `"Utf16Z"`, or the scalar type name for scalars.
    pub const fn name(&self) -> &'static str {
        return match self {
            FieldKind::Scalar(scalar) => scalar.name(),
            FieldKind::Pointer => "Pointer",
            FieldKind::Guid => "Guid",
            FieldKind::Blob(_) => "Blob",
            FieldKind::Utf16Z => "Utf16Z",
            FieldKind::Utf16Fixed(_) => "Utf16Fixed",
            FieldKind::Utf16Counted { .. } => "Utf16Counted",
            FieldKind::Utf16Rest => "Utf16Rest",
            FieldKind::AnsiZ => "AnsiZ",
            FieldKind::AnsiRest => "AnsiRest",
            FieldKind::Sid => "Sid",
            FieldKind::Array { .. } => "Array",
        };
    }

    /// Returns the size of the field if it does not depend on payload content,
    /// or `None` for variable-length kinds. Also `None` if a fixed array's
    /// size overflows `usize`.
    pub const fn fixed_size(&self, pointer_width: PointerWidth) -> Option<usize> {
        return match self {
            FieldKind::Scalar(scalar) => Some(scalar.size()),
            FieldKind::Pointer => Some(pointer_width.size()),
            FieldKind::Guid => Some(Guid::SIZE),
            FieldKind::Blob(len) => Some(*len as usize),
            FieldKind::Utf16Fixed(chars) => Some(*chars as usize * 2),
            FieldKind::Array {
                element,
                count: ArrayCount::Fixed(count),
            } => element.size(pointer_width).checked_mul(*count as usize),
            _ => None,
        };
    }

    /// True if the field extends to the end of the payload.
    pub const fn is_terminal(&self) -> bool {
        return matches!(
            self,
            FieldKind::Utf16Rest
                | FieldKind::AnsiRest
                | FieldKind::Array {
                    count: ArrayCount::RestOfPayload,
                    ..
                }
        );
    }

    /// True for string kinds.
    pub const fn is_string(&self) -> bool {
        return matches!(
            self,
            FieldKind::Utf16Z
                | FieldKind::Utf16Fixed(_)
                | FieldKind::Utf16Counted { .. }
                | FieldKind::Utf16Rest
                | FieldKind::AnsiZ
                | FieldKind::AnsiRest
        );
    }

    /// True if the field's value can be used as a count: integer scalars and
    /// pointers.
    pub const fn is_count_source(&self) -> bool {
        return match self {
            FieldKind::Scalar(scalar) => scalar.is_integer(),
            FieldKind::Pointer => true,
            _ => false,
        };
    }

    /// Index of the field that supplies this field's count, if any.
    pub const fn count_field(&self) -> Option<usize> {
        return match self {
            FieldKind::Utf16Counted { count_field } => Some(*count_field),
            FieldKind::Array {
                count: ArrayCount::Field(count_field),
                ..
            } => Some(*count_field),
            _ => None,
        };
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return f.pad(self.name());
    }
}

/// One field of an event schema: a name and a storage kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FieldDesc<'a> {
    name: &'a str,
    kind: FieldKind,
}

impl<'a> FieldDesc<'a> {
    /// Creates a field descriptor.
    pub const fn new(name: &'a str, kind: FieldKind) -> Self {
        return Self { name, kind };
    }

    /// Field name, e.g. `"ProcessId"`.
    pub const fn name(&self) -> &'a str {
        return self.name;
    }

    /// How the field is stored.
    pub const fn kind(&self) -> FieldKind {
        return self.kind;
    }
}

/// The part of an [`EventKey`] that selects a payload layout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct SchemaKey {
    /// Provider GUID, or class GUID for classic events.
    pub provider_id: Guid,

    /// Manifest event id, or 0 for classic events.
    pub event_id: u16,

    /// Opcode.
    pub opcode: u8,

    /// Version of the event definition.
    pub version: u8,
}

impl SchemaKey {
    /// Creates a key from values.
    pub const fn new(provider_id: Guid, event_id: u16, opcode: u8, version: u8) -> Self {
        return Self {
            provider_id,
            event_id,
            opcode,
            version,
        };
    }

    /// Extracts the layout-selecting part of an event key.
    pub const fn from_event_key(key: &EventKey) -> Self {
        return Self::new(key.provider_id, key.event_id, key.opcode, key.version);
    }
}

/// Layout of one event definition's payload: its fields in payload order.
///
/// Field order is byte order. The offset of each field is the end of the field
/// before it, so a field's offset can only be known after the sizes of all
/// preceding fields are known.
///
/// Schemas are usually `const` tables, e.g. [`crate::schema_tables`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EventSchema<'a> {
    key: SchemaKey,
    provider_name: &'a str,
    task_name: &'a str,
    opcode_name: &'a str,
    fields: &'a [FieldDesc<'a>],
}

impl<'a> EventSchema<'a> {
    /// Creates a schema.
    pub const fn new(
        key: SchemaKey,
        provider_name: &'a str,
        task_name: &'a str,
        opcode_name: &'a str,
        fields: &'a [FieldDesc<'a>],
    ) -> Self {
        return Self {
            key,
            provider_name,
            task_name,
            opcode_name,
            fields,
        };
    }

    /// The event definition this schema describes.
    pub const fn key(&self) -> &SchemaKey {
        return &self.key;
    }

    /// Provider name, e.g. `"MSNT_SystemTrace"`.
    pub const fn provider_name(&self) -> &'a str {
        return self.provider_name;
    }

    /// Task name, e.g. `"Process"`.
    pub const fn task_name(&self) -> &'a str {
        return self.task_name;
    }

    /// Opcode name, e.g. `"Start"`.
    pub const fn opcode_name(&self) -> &'a str {
        return self.opcode_name;
    }

    /// Fields in payload order.
    pub const fn fields(&self) -> &'a [FieldDesc<'a>] {
        return self.fields;
    }

    /// Number of fields.
    pub const fn len(&self) -> usize {
        return self.fields.len();
    }

    /// True if the schema has no fields.
    pub const fn is_empty(&self) -> bool {
        return self.fields.is_empty();
    }

    /// Returns the field at `index`.
    pub fn field(&self, index: usize) -> Option<&'a FieldDesc<'a>> {
        return self.fields.get(index);
    }

    /// Returns the index of the field named `name`.
    pub fn field_index(&self, name: &str) -> Option<usize> {
        return self.fields.iter().position(|field| field.name == name);
    }

    /// Checks the schema's internal consistency:
    ///
    /// - count fields refer to an earlier integer or pointer field;
    /// - fields that extend to the end of the payload are last;
    /// - array elements are not zero-sized;
    /// - field names are unique.
    ///
    /// [`crate::EventView`] does not call this. It trusts its schema and reports
    /// an inconsistency as a [`crate::DecodeError`] from the affected accessor.
    pub fn validate(&self) -> Result<(), SchemaError> {
        for (index, field) in self.fields.iter().enumerate() {
            if let Some(count_field) = field.kind.count_field() {
                let usable = count_field < index
                    && self.fields[count_field].kind.is_count_source();
                if !usable {
                    return Err(SchemaError::BadCountField {
                        field: index,
                        name: field.name.to_string(),
                        count_field,
                    });
                }
            }

            if field.kind.is_terminal() && index + 1 != self.fields.len() {
                return Err(SchemaError::TerminalNotLast {
                    field: index,
                    name: field.name.to_string(),
                    kind: field.kind.name(),
                });
            }

            if let FieldKind::Array { element, .. } = field.kind {
                if element.size(PointerWidth::Bits32) == 0 {
                    return Err(SchemaError::ZeroSizedElement {
                        field: index,
                        name: field.name.to_string(),
                    });
                }
            }

            if self.fields[..index].iter().any(|f| f.name == field.name) {
                return Err(SchemaError::DuplicateName(field.name.to_string()));
            }
        }

        return Ok(());
    }
}

impl fmt::Display for EventSchema<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return write!(
            f,
            "{}/{}/{} v{}",
            self.provider_name, self.task_name, self.opcode_name, self.key.version
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIELDS: &[FieldDesc] = &[
        FieldDesc::new("Count", FieldKind::Scalar(ScalarType::U16)),
        FieldDesc::new(
            "Values",
            FieldKind::Array {
                element: ElementType::Pointer,
                count: ArrayCount::Field(0),
            },
        ),
        FieldDesc::new("Name", FieldKind::Utf16Counted { count_field: 0 }),
        FieldDesc::new("Tail", FieldKind::AnsiRest),
    ];

    const SCHEMA: EventSchema = EventSchema::new(
        SchemaKey::new(Guid::zero(), 7, 0, 1),
        "Provider",
        "Task",
        "Opcode",
        FIELDS,
    );

    fn check(fields: &[FieldDesc]) -> Result<(), SchemaError> {
        return EventSchema::new(SchemaKey::default(), "", "", "", fields).validate();
    }

    #[test]
    fn sizes() {
        assert_eq!(4, ScalarType::Bool32.size());
        assert_eq!(8, ScalarType::F64.size());
        assert_eq!(4, ElementType::Pointer.size(PointerWidth::Bits32));
        assert_eq!(8, ElementType::Pointer.size(PointerWidth::Bits64));
        assert_eq!(16, ElementType::Guid.size(PointerWidth::Bits64));
        assert_eq!(
            Some(24),
            FieldKind::Array {
                element: ElementType::Pointer,
                count: ArrayCount::Fixed(3)
            }
            .fixed_size(PointerWidth::Bits64)
        );
        assert_eq!(
            Some(32),
            FieldKind::Utf16Fixed(16).fixed_size(PointerWidth::Bits64)
        );
        assert_eq!(None, FieldKind::Utf16Z.fixed_size(PointerWidth::Bits64));
        assert_eq!(None, FieldKind::Sid.fixed_size(PointerWidth::Bits64));
    }

    #[test]
    fn lookup() {
        assert_eq!(4, SCHEMA.len());
        assert_eq!(Some(2), SCHEMA.field_index("Name"));
        assert_eq!(None, SCHEMA.field_index("name"));
        assert_eq!("Tail", SCHEMA.field(3).unwrap().name());
        assert!(SCHEMA.field(4).is_none());
        assert_eq!("Provider/Task/Opcode v1", SCHEMA.to_string());
        assert_eq!(Ok(()), SCHEMA.validate());
    }

    #[test]
    fn validate_count_field() {
        let forward = [
            FieldDesc::new("Name", FieldKind::Utf16Counted { count_field: 1 }),
            FieldDesc::new("Count", FieldKind::Scalar(ScalarType::U16)),
        ];
        assert!(matches!(
            check(&forward),
            Err(SchemaError::BadCountField { field: 0, .. })
        ));

        let float = [
            FieldDesc::new("Count", FieldKind::Scalar(ScalarType::F32)),
            FieldDesc::new("Name", FieldKind::Utf16Counted { count_field: 0 }),
        ];
        assert!(matches!(
            check(&float),
            Err(SchemaError::BadCountField { field: 1, .. })
        ));
    }

    #[test]
    fn validate_layout() {
        let terminal = [
            FieldDesc::new("Rest", FieldKind::Utf16Rest),
            FieldDesc::new("After", FieldKind::Scalar(ScalarType::U8)),
        ];
        assert!(matches!(
            check(&terminal),
            Err(SchemaError::TerminalNotLast {
                field: 0,
                kind: "Utf16Rest",
                ..
            })
        ));

        let zero = [FieldDesc::new(
            "Empty",
            FieldKind::Array {
                element: ElementType::Blob(0),
                count: ArrayCount::Fixed(2),
            },
        )];
        assert!(matches!(
            check(&zero),
            Err(SchemaError::ZeroSizedElement { field: 0, .. })
        ));

        let dup = [
            FieldDesc::new("A", FieldKind::Guid),
            FieldDesc::new("A", FieldKind::Pointer),
        ];
        assert_eq!(Err(SchemaError::DuplicateName("A".to_string())), check(&dup));
    }
}
