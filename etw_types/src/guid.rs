// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

use core::fmt;

/// A 128-bit identifier, e.g. an ETW provider id or a PDB signature.
///
/// ETW payloads store a GUID in the Windows `GUID` struct layout: `data1`,
/// `data2`, and `data3` are little-endian, `data4` is 8 bytes in stream order.
/// Use [`Guid::from_bytes_le`] to read a GUID from a payload.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Guid {
    data1: u32,
    data2: u16,
    data3: u16,
    data4: [u8; 8],
}

impl Guid {
    /// Size of a GUID in bytes.
    pub const SIZE: usize = 16;

    /// Returns the all-zero GUID.
    pub const fn zero() -> Self {
        return Self {
            data1: 0,
            data2: 0,
            data3: 0,
            data4: [0; 8],
        };
    }

    /// Creates a GUID from its components, e.g.
    /// `Guid::from_fields(0x3d6fa8d0, 0xfe05, 0x11d0, [0x9d, 0xda, 0x00, 0xc0, 0x4f, 0xd7, 0xba, 0x7c])`
    /// for `3d6fa8d0-fe05-11d0-9dda-00c04fd7ba7c`.
    pub const fn from_fields(data1: u32, data2: u16, data3: u16, data4: [u8; 8]) -> Self {
        return Self {
            data1,
            data2,
            data3,
            data4,
        };
    }

    /// Reads a GUID stored in Windows `GUID` layout (first three fields
    /// little-endian). This is the layout used in ETW payloads.
    pub const fn from_bytes_le(bytes: &[u8; 16]) -> Self {
        return Self {
            data1: u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            data2: u16::from_le_bytes([bytes[4], bytes[5]]),
            data3: u16::from_le_bytes([bytes[6], bytes[7]]),
            data4: [
                bytes[8], bytes[9], bytes[10], bytes[11], bytes[12], bytes[13], bytes[14],
                bytes[15],
            ],
        };
    }

    /// Reads a GUID stored in RFC 4122 (big-endian) layout.
    pub const fn from_bytes_be(bytes: &[u8; 16]) -> Self {
        return Self {
            data1: u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            data2: u16::from_be_bytes([bytes[4], bytes[5]]),
            data3: u16::from_be_bytes([bytes[6], bytes[7]]),
            data4: [
                bytes[8], bytes[9], bytes[10], bytes[11], bytes[12], bytes[13], bytes[14],
                bytes[15],
            ],
        };
    }

    /// Returns the GUID in Windows `GUID` layout (first three fields little-endian).
    pub const fn to_bytes_le(&self) -> [u8; 16] {
        let d1 = self.data1.to_le_bytes();
        let d2 = self.data2.to_le_bytes();
        let d3 = self.data3.to_le_bytes();
        let d4 = &self.data4;
        return [
            d1[0], d1[1], d1[2], d1[3], d2[0], d2[1], d3[0], d3[1], d4[0], d4[1], d4[2], d4[3],
            d4[4], d4[5], d4[6], d4[7],
        ];
    }

    /// Returns the GUID in RFC 4122 (big-endian) layout.
    pub const fn to_bytes_be(&self) -> [u8; 16] {
        let d1 = self.data1.to_be_bytes();
        let d2 = self.data2.to_be_bytes();
        let d3 = self.data3.to_be_bytes();
        let d4 = &self.data4;
        return [
            d1[0], d1[1], d1[2], d1[3], d2[0], d2[1], d3[0], d3[1], d4[0], d4[1], d4[2], d4[3],
            d4[4], d4[5], d4[6], d4[7],
        ];
    }

    /// First component.
    pub const fn data1(&self) -> u32 {
        return self.data1;
    }

    /// Second component.
    pub const fn data2(&self) -> u16 {
        return self.data2;
    }

    /// Third component.
    pub const fn data3(&self) -> u16 {
        return self.data3;
    }

    /// Last 8 bytes.
    pub const fn data4(&self) -> [u8; 8] {
        return self.data4;
    }

    /// Returns the text form `xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx` as ASCII bytes
    /// (lowercase hex, no braces).
    pub fn to_utf8_bytes(&self) -> [u8; 36] {
        const HEX: &[u8; 16] = b"0123456789abcdef";
        let be = self.to_bytes_be();
        let mut result = [b'-'; 36];
        let mut pos = 0;
        for (i, b) in be.iter().enumerate() {
            if i == 4 || i == 6 || i == 8 || i == 10 {
                pos += 1; // Leave the '-'.
            }
            result[pos] = HEX[(b >> 4) as usize];
            result[pos + 1] = HEX[(b & 0xF) as usize];
            pos += 2;
        }
        return result;
    }

    /// Parses `xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx`, optionally wrapped in `{}`.
    /// Hex digits may be upper or lower case. Returns `None` if the text is not
    /// a GUID.
    pub fn try_parse(text: &str) -> Option<Self> {
        let mut bytes = text.as_bytes();
        if bytes.len() == 38 && bytes[0] == b'{' && bytes[37] == b'}' {
            bytes = &bytes[1..37];
        }

        if bytes.len() != 36 {
            return None;
        }

        let mut be = [0u8; 16];
        let mut pos = 0;
        for (i, out) in be.iter_mut().enumerate() {
            if i == 4 || i == 6 || i == 8 || i == 10 {
                if bytes[pos] != b'-' {
                    return None;
                }
                pos += 1;
            }
            *out = (hex_digit(bytes[pos])? << 4) | hex_digit(bytes[pos + 1])?;
            pos += 2;
        }

        return Some(Self::from_bytes_be(&be));
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let utf8 = self.to_utf8_bytes();
        // to_utf8_bytes only produces ASCII.
        return f.pad(core::str::from_utf8(&utf8).map_err(|_| fmt::Error)?);
    }
}

fn hex_digit(ch: u8) -> Option<u8> {
    return match ch {
        b'0'..=b'9' => Some(ch - b'0'),
        b'a'..=b'f' => Some(ch - b'a' + 10),
        b'A'..=b'F' => Some(ch - b'A' + 10),
        _ => None,
    };
}

#[cfg(test)]
mod tests {
    extern crate alloc;
    use alloc::string::ToString;

    use super::*;

    const PROCESS: Guid = Guid::from_fields(
        0x3d6fa8d0,
        0xfe05,
        0x11d0,
        [0x9d, 0xda, 0x00, 0xc0, 0x4f, 0xd7, 0xba, 0x7c],
    );

    #[test]
    fn text() {
        assert_eq!(
            "3d6fa8d0-fe05-11d0-9dda-00c04fd7ba7c",
            PROCESS.to_string()
        );
        assert_eq!(
            Some(PROCESS),
            Guid::try_parse("{3D6FA8D0-FE05-11D0-9DDA-00C04FD7BA7C}")
        );
        assert_eq!(
            Some(PROCESS),
            Guid::try_parse("3d6fa8d0-fe05-11d0-9dda-00c04fd7ba7c")
        );
        assert_eq!(None, Guid::try_parse("3d6fa8d0-fe05-11d0-9dda-00c04fd7ba7"));
        assert_eq!(None, Guid::try_parse("3d6fa8d0xfe05-11d0-9dda-00c04fd7ba7c"));
        assert_eq!(None, Guid::try_parse("3d6fa8d0-fe05-11d0-9dda-00c04fd7ba7g"));
    }

    #[test]
    fn layouts() {
        let le = PROCESS.to_bytes_le();
        assert_eq!([0xd0, 0xa8, 0x6f, 0x3d, 0x05, 0xfe, 0xd0, 0x11], le[..8]);
        assert_eq!(PROCESS.data4(), le[8..]);
        assert_eq!(PROCESS, Guid::from_bytes_le(&le));
        assert_eq!(PROCESS, Guid::from_bytes_be(&PROCESS.to_bytes_be()));
    }

    #[test]
    fn matches_uuid() {
        let uuid = uuid::Uuid::parse_str("b3e675d7-2554-4f18-830b-2762732560de").unwrap();
        let guid = Guid::from_bytes_le(&uuid.to_bytes_le());
        assert_eq!(uuid.to_string(), guid.to_string());
        assert_eq!(*uuid.as_bytes(), guid.to_bytes_be());

        let (d1, d2, d3, d4) = uuid.as_fields();
        assert_eq!(Guid::from_fields(d1, d2, d3, *d4), guid);
    }

    #[test]
    fn zero() {
        assert_eq!(Guid::default(), Guid::zero());
        assert_eq!("00000000-0000-0000-0000-000000000000", Guid::zero().to_string());
    }
}
