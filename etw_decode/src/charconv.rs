// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

use core::char;

/// Decodes UTF-16LE bytes into a string.
///
/// If `lossy` is false, the first unpaired surrogate stops decoding and
/// `Err(index)` is returned, where `index` is the position of the offending code
/// unit. If `lossy` is true, each unpaired surrogate becomes U+FFFD.
///
/// A trailing odd byte is treated like an unpaired surrogate: it is reported
/// as an error at index `bytes.len() / 2`, or replaced with U+FFFD if `lossy`.
pub fn utf16le_to_string(bytes: &[u8], lossy: bool) -> Result<String, usize> {
    let units = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]));

    let mut result = String::with_capacity(bytes.len() / 2);
    let mut index = 0;
    for decoded in char::decode_utf16(units) {
        match decoded {
            Ok(ch) => {
                result.push(ch);
                index += ch.len_utf16();
            }
            Err(_) if lossy => {
                result.push(char::REPLACEMENT_CHARACTER);
                index += 1;
            }
            Err(_) => {
                return Err(index);
            }
        }
    }

    if bytes.len() % 2 != 0 {
        if !lossy {
            return Err(index);
        }
        result.push(char::REPLACEMENT_CHARACTER);
    }

    return Ok(result);
}

/// Returns the length of `bytes` after removing trailing NUL UTF-16 code units.
/// Odd-length input is returned unchanged.
pub fn utf16le_trim_nul_len(bytes: &[u8]) -> usize {
    if bytes.len() % 2 != 0 {
        return bytes.len();
    }

    let mut len = bytes.len();
    while len >= 2 && bytes[len - 2] == 0 && bytes[len - 1] == 0 {
        len -= 2;
    }
    return len;
}

/// Returns the length in bytes of the UTF-16LE string before the first NUL code
/// unit, or `bytes.len()` if there is none.
pub fn utf16le_strnlen(bytes: &[u8]) -> usize {
    return bytes
        .chunks_exact(2)
        .position(|pair| pair[0] == 0 && pair[1] == 0)
        .map_or(bytes.len(), |units| units * 2);
}

/// Decodes single-byte text. Bytes 0x00..=0x7F are ASCII; bytes 0x80..=0xFF are
/// treated as Latin-1 (ISO-8859-1), which maps each byte to the code point of
/// the same value. Never fails.
pub fn latin1_to_string(bytes: &[u8]) -> String {
    return bytes.iter().map(|b| *b as char).collect();
}

/// Returns the length of `bytes` after removing trailing NUL bytes.
pub fn trim_nul_len(bytes: &[u8]) -> usize {
    let mut len = bytes.len();
    while len > 0 && bytes[len - 1] == 0 {
        len -= 1;
    }
    return len;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utf16(text: &str) -> Vec<u8> {
        return text.encode_utf16().flat_map(|u| u.to_le_bytes()).collect();
    }

    #[test]
    fn utf16_valid() {
        assert_eq!(Ok(String::new()), utf16le_to_string(&[], false));
        assert_eq!(Ok("abc".to_string()), utf16le_to_string(&utf16("abc"), false));
        assert_eq!(
            Ok("x\u{10302}\u{FFFD}y".to_string()),
            utf16le_to_string(&utf16("x\u{10302}\u{FFFD}y"), false)
        );
    }

    #[test]
    fn utf16_unpaired() {
        // 'a', lone low surrogate, 'b'
        let lone_low = [b'a', 0, 0x00, 0xDC, b'b', 0];
        assert_eq!(Err(1), utf16le_to_string(&lone_low, false));
        assert_eq!(
            Ok("a\u{FFFD}b".to_string()),
            utf16le_to_string(&lone_low, true)
        );

        // 'a', surrogate pair, lone high surrogate at end
        let mut bytes = utf16("a\u{10302}");
        bytes.extend_from_slice(&[0x00, 0xD8]);
        assert_eq!(Err(3), utf16le_to_string(&bytes, false));
        assert_eq!(
            Ok("a\u{10302}\u{FFFD}".to_string()),
            utf16le_to_string(&bytes, true)
        );
    }

    #[test]
    fn utf16_odd_length() {
        assert_eq!(Err(1), utf16le_to_string(&[b'a', 0, b'b'], false));
        assert_eq!(
            Ok("a\u{FFFD}".to_string()),
            utf16le_to_string(&[b'a', 0, b'b'], true)
        );
    }

    #[test]
    fn utf16_lengths() {
        assert_eq!(4, utf16le_strnlen(&[b'a', 0, b'b', 0, 0, 0, b'c', 0]));
        assert_eq!(4, utf16le_strnlen(&[b'a', 0, b'b', 0]));
        assert_eq!(0, utf16le_strnlen(&[0, 0, b'b', 0]));

        assert_eq!(4, utf16le_trim_nul_len(&[b'a', 0, b'b', 0, 0, 0, 0, 0]));
        assert_eq!(4, utf16le_trim_nul_len(&[b'a', 0, b'b', 0]));
        assert_eq!(0, utf16le_trim_nul_len(&[0, 0]));
        assert_eq!(5, utf16le_trim_nul_len(&[b'a', 0, b'b', 0, 0]));
    }

    #[test]
    fn latin1() {
        assert_eq!("", latin1_to_string(b""));
        assert_eq!("abc", latin1_to_string(b"abc"));
        assert_eq!("a\u{E9}\u{FF}", latin1_to_string(&[b'a', 0xE9, 0xFF]));
        assert_eq!(3, trim_nul_len(b"abc\0\0"));
        assert_eq!(0, trim_nul_len(b"\0"));
    }
}
