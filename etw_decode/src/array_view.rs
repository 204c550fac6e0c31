// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

use core::iter;

use etw_types::Guid;

use crate::byte_reader::PayloadReader;
use crate::ElementType;
use crate::ScalarType;

/// One decoded fixed-size value: a scalar field, or one element of an array field.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ElementValue<'dat> {
    /// `U8` value.
    U8(u8),
    /// `I8` value.
    I8(i8),
    /// `U16` value.
    U16(u16),
    /// `I16` value.
    I16(i16),
    /// `U32` value.
    U32(u32),
    /// `I32` value.
    I32(i32),
    /// `U64` value.
    U64(u64),
    /// `I64` value.
    I64(i64),
    /// `F32` value.
    F32(f32),
    /// `F64` value.
    F64(f64),
    /// `Bool32` value.
    Bool(bool),
    /// Address-sized value, widened to 64 bits.
    Pointer(u64),
    /// GUID value.
    Guid(Guid),
    /// Fixed-size blob, borrowed from the payload.
    Blob(&'dat [u8]),
}

impl<'dat> ElementValue<'dat> {
    /// For integer and pointer values, returns the value as u64. Signed values
    /// are sign-extended, so a negative value becomes a very large u64.
    /// Returns `None` for floats, bools, GUIDs, and blobs.
    pub fn as_u64(&self) -> Option<u64> {
        return match *self {
            ElementValue::U8(v) => Some(v.into()),
            ElementValue::I8(v) => Some(v as i64 as u64),
            ElementValue::U16(v) => Some(v.into()),
            ElementValue::I16(v) => Some(v as i64 as u64),
            ElementValue::U32(v) => Some(v.into()),
            ElementValue::I32(v) => Some(v as i64 as u64),
            ElementValue::U64(v) => Some(v),
            ElementValue::I64(v) => Some(v as u64),
            ElementValue::Pointer(v) => Some(v),
            _ => None,
        };
    }
}

/// Decodes one element of type `element` at `offset`. Returns `None` if the
/// element does not fit in `data`.
pub(crate) fn read_element(
    reader: PayloadReader,
    element: ElementType,
    data: &[u8],
    offset: usize,
) -> Option<ElementValue<'_>> {
    return match element {
        ElementType::Scalar(scalar) => match scalar {
            ScalarType::U8 => reader.read_u8(data, offset).map(ElementValue::U8),
            ScalarType::I8 => reader.read_i8(data, offset).map(ElementValue::I8),
            ScalarType::U16 => reader.read_u16(data, offset).map(ElementValue::U16),
            ScalarType::I16 => reader.read_i16(data, offset).map(ElementValue::I16),
            ScalarType::U32 => reader.read_u32(data, offset).map(ElementValue::U32),
            ScalarType::I32 => reader.read_i32(data, offset).map(ElementValue::I32),
            ScalarType::U64 => reader.read_u64(data, offset).map(ElementValue::U64),
            ScalarType::I64 => reader.read_i64(data, offset).map(ElementValue::I64),
            ScalarType::F32 => reader.read_f32(data, offset).map(ElementValue::F32),
            ScalarType::F64 => reader.read_f64(data, offset).map(ElementValue::F64),
            ScalarType::Bool32 => reader
                .read_u32(data, offset)
                .map(|v| ElementValue::Bool(v != 0)),
        },
        ElementType::Pointer => reader
            .read_pointer(data, offset)
            .map(ElementValue::Pointer),
        ElementType::Guid => reader.read_guid(data, offset).map(ElementValue::Guid),
        ElementType::Blob(len) => reader
            .bytes(data, offset, len as usize)
            .map(ElementValue::Blob),
    };
}

/// Lazy view of an array field's elements.
///
/// Holds only the array's bytes. Each element is decoded when it is indexed or
/// iterated, and the view can be iterated any number of times.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ArrayView<'dat> {
    data: &'dat [u8],
    element: ElementType,
    element_size: usize,
    reader: PayloadReader,
}

impl<'dat> ArrayView<'dat> {
    /// Creates a view of `data` as elements of type `element`. Trailing bytes
    /// that do not make a whole element are ignored.
    pub fn new(data: &'dat [u8], element: ElementType, reader: PayloadReader) -> Self {
        return Self {
            data,
            element,
            element_size: element.size(reader.pointer_width()),
            reader,
        };
    }

    /// Element type.
    pub fn element_type(&self) -> ElementType {
        return self.element;
    }

    /// Size of each element in bytes.
    pub fn element_size(&self) -> usize {
        return self.element_size;
    }

    /// The array's bytes.
    pub fn bytes(&self) -> &'dat [u8] {
        return self.data;
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        return if self.element_size == 0 {
            0
        } else {
            self.data.len() / self.element_size
        };
    }

    /// True if the array has no elements.
    pub fn is_empty(&self) -> bool {
        return self.len() == 0;
    }

    /// Decodes element `index`, or returns `None` if `index >= len()`.
    pub fn get(&self, index: usize) -> Option<ElementValue<'dat>> {
        if index >= self.len() {
            return None;
        }

        return read_element(self.reader, self.element, self.data, index * self.element_size);
    }

    /// Returns an iterator over the elements, starting from element 0.
    pub fn iter(&self) -> ArrayIter<'dat> {
        return ArrayIter {
            array: *self,
            front: 0,
            back: self.len(),
        };
    }
}

impl<'dat> IntoIterator for ArrayView<'dat> {
    type Item = ElementValue<'dat>;
    type IntoIter = ArrayIter<'dat>;

    fn into_iter(self) -> Self::IntoIter {
        return self.iter();
    }
}

impl<'dat> IntoIterator for &ArrayView<'dat> {
    type Item = ElementValue<'dat>;
    type IntoIter = ArrayIter<'dat>;

    fn into_iter(self) -> Self::IntoIter {
        return self.iter();
    }
}

/// Iterator over the elements of an [`ArrayView`].
#[derive(Clone, Debug)]
pub struct ArrayIter<'dat> {
    array: ArrayView<'dat>,
    front: usize,
    back: usize,
}

impl<'dat> Iterator for ArrayIter<'dat> {
    type Item = ElementValue<'dat>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.front >= self.back {
            return None;
        }

        let value = self.array.get(self.front);
        self.front += 1;
        return value;
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.back - self.front;
        return (remaining, Some(remaining));
    }

    fn nth(&mut self, n: usize) -> Option<Self::Item> {
        self.front = self.front.saturating_add(n).min(self.back);
        return self.next();
    }
}

impl<'dat> DoubleEndedIterator for ArrayIter<'dat> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front >= self.back {
            return None;
        }

        self.back -= 1;
        return self.array.get(self.back);
    }
}

impl<'dat> ExactSizeIterator for ArrayIter<'dat> {}

impl<'dat> iter::FusedIterator for ArrayIter<'dat> {}

#[cfg(test)]
mod tests {
    use super::*;
    use etw_types::PointerWidth;

    const R32: PayloadReader = PayloadReader::new(PointerWidth::Bits32);
    const R64: PayloadReader = PayloadReader::new(PointerWidth::Bits64);

    #[test]
    fn element_values() {
        let data = [0xFEu8, 0xFF, 0xFF, 0xFF, 1, 0, 0, 0];
        let i32_type = ElementType::Scalar(ScalarType::I32);
        assert_eq!(Some(ElementValue::I32(-2)), read_element(R64, i32_type, &data, 0));
        assert_eq!(None, read_element(R64, i32_type, &data, 5));
        assert_eq!(
            Some(ElementValue::Bool(true)),
            read_element(R64, ElementType::Scalar(ScalarType::Bool32), &data, 4)
        );
        assert_eq!(
            Some(ElementValue::Pointer(0xFFFFFFFE)),
            read_element(R32, ElementType::Pointer, &data, 0)
        );
        assert_eq!(
            Some(ElementValue::Blob(&data[2..5])),
            read_element(R64, ElementType::Blob(3), &data, 2)
        );

        assert_eq!(Some(u64::MAX - 1), ElementValue::I32(-2).as_u64());
        assert_eq!(Some(7), ElementValue::U16(7).as_u64());
        assert_eq!(None, ElementValue::F32(1.0).as_u64());
        assert_eq!(None, ElementValue::Bool(false).as_u64());
    }

    #[test]
    fn array() {
        let data: Vec<u8> = [10u16, 20, 30, 40]
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .chain([0xAA])
            .collect();
        let array = ArrayView::new(&data, ElementType::Scalar(ScalarType::U16), R64);
        assert_eq!(4, array.len());
        assert!(!array.is_empty());
        assert_eq!(Some(ElementValue::U16(30)), array.get(2));
        assert_eq!(None, array.get(4));

        let values: Vec<_> = array.iter().filter_map(|v| v.as_u64()).collect();
        assert_eq!(vec![10, 20, 30, 40], values);

        let mut iter = array.iter();
        assert_eq!(4, iter.len());
        assert_eq!(Some(ElementValue::U16(40)), iter.next_back());
        assert_eq!(Some(ElementValue::U16(20)), iter.nth(1));
        assert_eq!(Some(ElementValue::U16(30)), iter.next());
        assert_eq!(None, iter.next());
        assert_eq!(None, iter.next_back());

        // Restartable: a new iterator sees every element again.
        assert_eq!(4, array.into_iter().count());

        let empty = ArrayView::new(&[], ElementType::Guid, R64);
        assert!(empty.is_empty());
        assert_eq!(None, empty.iter().next());
    }
}
