// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

use crate::ArrayView;
use crate::ElementValue;

/// A decoded field of any kind, as returned by [`crate::EventView::value`].
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue<'dat> {
    /// Scalar, pointer, GUID, or blob field.
    Fixed(ElementValue<'dat>),

    /// String field, decoded.
    String(String),

    /// SID field: the SID bytes, or `None` if the record has no SID.
    Sid(Option<&'dat [u8]>),

    /// Array field.
    Array(ArrayView<'dat>),
}

impl<'dat> FieldValue<'dat> {
    /// For an integer or pointer field, returns the value as u64.
    pub fn as_u64(&self) -> Option<u64> {
        return match self {
            FieldValue::Fixed(value) => value.as_u64(),
            _ => None,
        };
    }

    /// For a string field, returns the string.
    pub fn as_str(&self) -> Option<&str> {
        return match self {
            FieldValue::String(value) => Some(value.as_str()),
            _ => None,
        };
    }

    /// For an array field, returns the array view.
    pub fn as_array(&self) -> Option<ArrayView<'dat>> {
        return match self {
            FieldValue::Array(value) => Some(*value),
            _ => None,
        };
    }
}

impl<'dat> From<ElementValue<'dat>> for FieldValue<'dat> {
    fn from(value: ElementValue<'dat>) -> Self {
        return FieldValue::Fixed(value);
    }
}
