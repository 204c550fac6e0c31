// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

use etw_types::Guid;
use etw_types::PointerWidth;

/// Helper for reading little-endian values and address-sized values from an
/// event payload.
///
/// Every read is bounds-checked: a read that would extend past the end of
/// `data` returns `None` instead of panicking.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PayloadReader {
    pointer_width: PointerWidth,
}

impl PayloadReader {
    /// Create a new reader for a payload whose address-sized fields have the
    /// given width.
    pub const fn new(pointer_width: PointerWidth) -> Self {
        return Self { pointer_width };
    }

    /// Width of address-sized values.
    pub const fn pointer_width(self) -> PointerWidth {
        return self.pointer_width;
    }

    /// Size of address-sized values in bytes (4 or 8).
    pub const fn pointer_size(self) -> usize {
        return self.pointer_width.size();
    }

    /// Returns `data[offset..offset + len]`, or `None` if out of range.
    pub fn bytes(self, data: &[u8], offset: usize, len: usize) -> Option<&[u8]> {
        let end = offset.checked_add(len)?;
        return data.get(offset..end);
    }

    fn array<const N: usize>(self, data: &[u8], offset: usize) -> Option<[u8; N]> {
        return self.bytes(data, offset, N)?.try_into().ok();
    }

    /// Reads a u8 at `offset`.
    pub fn read_u8(self, data: &[u8], offset: usize) -> Option<u8> {
        return data.get(offset).copied();
    }

    /// Reads an i8 at `offset`.
    pub fn read_i8(self, data: &[u8], offset: usize) -> Option<i8> {
        return data.get(offset).map(|b| *b as i8);
    }

    /// Reads a little-endian u16 at `offset`.
    pub fn read_u16(self, data: &[u8], offset: usize) -> Option<u16> {
        return self.array(data, offset).map(u16::from_le_bytes);
    }

    /// Reads a little-endian i16 at `offset`.
    pub fn read_i16(self, data: &[u8], offset: usize) -> Option<i16> {
        return self.array(data, offset).map(i16::from_le_bytes);
    }

    /// Reads a little-endian u32 at `offset`.
    pub fn read_u32(self, data: &[u8], offset: usize) -> Option<u32> {
        return self.array(data, offset).map(u32::from_le_bytes);
    }

    /// Reads a little-endian i32 at `offset`.
    pub fn read_i32(self, data: &[u8], offset: usize) -> Option<i32> {
        return self.array(data, offset).map(i32::from_le_bytes);
    }

    /// Reads a little-endian u64 at `offset`.
    pub fn read_u64(self, data: &[u8], offset: usize) -> Option<u64> {
        return self.array(data, offset).map(u64::from_le_bytes);
    }

    /// Reads a little-endian i64 at `offset`.
    pub fn read_i64(self, data: &[u8], offset: usize) -> Option<i64> {
        return self.array(data, offset).map(i64::from_le_bytes);
    }

    /// Reads a little-endian f32 at `offset`.
    pub fn read_f32(self, data: &[u8], offset: usize) -> Option<f32> {
        return self.array(data, offset).map(f32::from_le_bytes);
    }

    /// Reads a little-endian f64 at `offset`.
    pub fn read_f64(self, data: &[u8], offset: usize) -> Option<f64> {
        return self.array(data, offset).map(f64::from_le_bytes);
    }

    /// Reads an address-sized value at `offset`, widened to u64.
    pub fn read_pointer(self, data: &[u8], offset: usize) -> Option<u64> {
        return match self.pointer_width {
            PointerWidth::Bits32 => self.read_u32(data, offset).map(u64::from),
            PointerWidth::Bits64 => self.read_u64(data, offset),
        };
    }

    /// Reads a GUID stored in Windows `GUID` layout at `offset`.
    pub fn read_guid(self, data: &[u8], offset: usize) -> Option<Guid> {
        return self
            .array::<16>(data, offset)
            .map(|bytes| Guid::from_bytes_le(&bytes));
    }

    /// Searches for a NUL UTF-16 code unit starting at `offset`, stepping by 2.
    /// Returns the length in bytes of the string including the terminator, or
    /// `None` if no terminator is found before the end of `data`.
    pub fn utf16_nul_terminated_size(self, data: &[u8], offset: usize) -> Option<usize> {
        let mut pos = offset;
        while data.len().checked_sub(pos)? >= 2 {
            if data[pos] == 0 && data[pos + 1] == 0 {
                return Some(pos + 2 - offset);
            }
            pos += 2;
        }
        return None;
    }

    /// Searches for a NUL byte starting at `offset`. Returns the length in bytes
    /// of the string including the terminator, or `None` if no terminator is
    /// found before the end of `data`.
    pub fn nul_terminated_size(self, data: &[u8], offset: usize) -> Option<usize> {
        let tail = data.get(offset..)?;
        return tail.iter().position(|b| *b == 0).map(|len| len + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_I16: i16 = 0x1234;
    const TEST_U16: u16 = 0x1234;
    const TEST_I32: i32 = 0x12345678;
    const TEST_U32: u32 = 0x12345678;
    const TEST_I64: i64 = 0x1234567890abcdef;
    const TEST_U64: u64 = 0x1234567890abcdef;
    const TEST_F32: f32 = 1234.5678;
    const TEST_F64: f64 = 1234.5678;

    const R32: PayloadReader = PayloadReader::new(PointerWidth::Bits32);
    const R64: PayloadReader = PayloadReader::new(PointerWidth::Bits64);

    #[test]
    fn read() {
        assert_eq!(Some(TEST_I16), R64.read_i16(&TEST_I16.to_le_bytes(), 0));
        assert_eq!(Some(TEST_U16), R64.read_u16(&TEST_U16.to_le_bytes(), 0));
        assert_eq!(Some(TEST_I32), R64.read_i32(&TEST_I32.to_le_bytes(), 0));
        assert_eq!(Some(TEST_U32), R64.read_u32(&TEST_U32.to_le_bytes(), 0));
        assert_eq!(Some(TEST_I64), R64.read_i64(&TEST_I64.to_le_bytes(), 0));
        assert_eq!(Some(TEST_U64), R64.read_u64(&TEST_U64.to_le_bytes(), 0));
        assert_eq!(Some(TEST_F32), R64.read_f32(&TEST_F32.to_le_bytes(), 0));
        assert_eq!(Some(TEST_F64), R64.read_f64(&TEST_F64.to_le_bytes(), 0));
        assert_eq!(Some(-1), R64.read_i8(&[0xFF], 0));
    }

    #[test]
    fn read_out_of_range() {
        let data = [1u8, 2, 3, 4, 5];
        assert_eq!(Some(0x05040302), R64.read_u32(&data, 1));
        assert_eq!(None, R64.read_u32(&data, 2));
        assert_eq!(None, R64.read_u8(&data, 5));
        assert_eq!(None, R64.read_u16(&data, usize::MAX));
        assert_eq!(None, R64.bytes(&data, usize::MAX, 2));
        assert_eq!(Some(&data[5..]), R64.bytes(&data, 5, 0));
    }

    #[test]
    fn pointer() {
        let data = 0x1122334455667788u64.to_le_bytes();
        assert_eq!(Some(0x1122334455667788), R64.read_pointer(&data, 0));
        assert_eq!(Some(0x55667788), R32.read_pointer(&data, 0));
        assert_eq!(None, R64.read_pointer(&data, 4));
        assert_eq!(Some(0x11223344), R32.read_pointer(&data, 4));
        assert_eq!(8, R64.pointer_size());
        assert_eq!(4, R32.pointer_size());
    }

    #[test]
    fn terminators() {
        let data = [b'a', 0, b'b', 0, 0, 0, b'c', 0];
        assert_eq!(Some(6), R64.utf16_nul_terminated_size(&data, 0));
        assert_eq!(Some(4), R64.utf16_nul_terminated_size(&data, 2));
        assert_eq!(None, R64.utf16_nul_terminated_size(&data, 6));
        assert_eq!(None, R64.utf16_nul_terminated_size(&data, 9));

        // Odd offset: units are [0, b'b'], [0, 0].
        assert_eq!(Some(4), R64.utf16_nul_terminated_size(&data, 1));

        assert_eq!(Some(2), R64.nul_terminated_size(&data, 0));
        assert_eq!(Some(1), R64.nul_terminated_size(&data, 1));
        assert_eq!(Some(2), R64.nul_terminated_size(&data, 6));
        assert_eq!(None, R64.nul_terminated_size(&data, 8));
        assert_eq!(None, R64.nul_terminated_size(&data, 9));
        assert_eq!(None, R64.nul_terminated_size(b"abc", 0));
    }
}
