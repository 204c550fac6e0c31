// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

/// Error returned by an [`crate::EventView`] field accessor.
///
/// Each accessor fails or succeeds independently. A failure while resolving the
/// offset of field N means every field after N fails the same way, while
/// fields before N remain readable.
#[allow(missing_docs)] // Variant fields are described on the variant.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// Field `field` needs bytes `start..end` but the payload is only `len` bytes.
    #[error("field {field}: bytes {start}..{end} out of bounds for payload of {len} bytes")]
    OutOfBounds {
        field: usize,
        start: usize,
        end: usize,
        len: usize,
    },

    /// NUL-terminated field `field`, starting at `start`, has no terminator.
    #[error("field {field}: no terminator between offset {start} and end of payload")]
    Unterminated { field: usize, start: usize },

    /// UTF-16 field `field` has an unpaired surrogate at code unit `position`.
    #[error("field {field}: invalid UTF-16 at code unit {position}")]
    InvalidUtf16 { field: usize, position: usize },

    /// Accessor used on a field of a different kind.
    #[error("field {field}: accessor expects {expected}, field is {actual}")]
    TypeMismatch {
        field: usize,
        expected: &'static str,
        actual: &'static str,
    },

    /// Field index is not less than the schema's field count.
    #[error("field index {0} out of range")]
    NoSuchField(usize),

    /// Schema has no field with the given name.
    #[error("no field named \"{0}\"")]
    UnknownField(String),

    /// Variable-length field `field` refers to a count field that is not an
    /// earlier integer field.
    #[error("field {field}: count field {count_field} is not an earlier integer field")]
    InvalidCountField { field: usize, count_field: usize },

    /// `count * element_size` does not fit in `usize`.
    #[error("field {field}: {count} elements of {element_size} bytes overflow")]
    CountOverflow {
        field: usize,
        count: u64,
        element_size: usize,
    },

    /// Rest-of-payload array whose remaining bytes are not a whole number of
    /// elements.
    #[error("field {field}: {remaining} bytes is not a whole number of {element_size}-byte elements")]
    PartialElement {
        field: usize,
        remaining: usize,
        element_size: usize,
    },
}

/// Error returned by [`crate::EventSchema::validate`].
#[allow(missing_docs)] // Variant fields are described on the variant.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    /// Field refers to a count field that is not an earlier integer field.
    #[error("field {field} ({name}): count field {count_field} is not an earlier integer field")]
    BadCountField {
        field: usize,
        name: String,
        count_field: usize,
    },

    /// Field extends to the end of the payload but is not the last field.
    #[error("field {field} ({name}): {kind} must be the last field")]
    TerminalNotLast {
        field: usize,
        name: String,
        kind: &'static str,
    },

    /// Array of zero-sized elements.
    #[error("field {field} ({name}): array element size is 0")]
    ZeroSizedElement { field: usize, name: String },

    /// Two fields share a name.
    #[error("duplicate field name \"{0}\"")]
    DuplicateName(String),
}
