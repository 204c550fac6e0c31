// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

/// Flags that control how an [`crate::EventView`] turns field bytes into values.
///
/// The options are fixed when the view is created and apply to every field of
/// the view, so all string fields of a record follow the same policy.
#[repr(C)]
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct DecodeOptions(u32);

#[allow(non_upper_case_globals)]
impl DecodeOptions {
    /// Returns a `DecodeOptions` with the specified numeric value.
    pub const fn from_int(value: u32) -> Self {
        return Self(value);
    }

    /// Returns the numeric value corresponding to this `DecodeOptions` value.
    pub const fn as_int(self) -> u32 {
        return self.0;
    }

    /// Returns true if `self & flag != 0`.
    pub const fn has_flag(self, flag: Self) -> bool {
        return self.0 & flag.0 != 0;
    }

    /// Returns `self & !flag`.
    pub const fn and_not(self, flag: Self) -> Self {
        return Self(self.0 & !flag.0);
    }

    /// Returns `self | flag`.
    pub const fn or(self, flag: Self) -> Self {
        return Self(self.0 | flag.0);
    }

    /// No flags set: invalid UTF-16 is an error and rest-of-payload strings
    /// keep their trailing NULs.
    pub const None: Self = Self(0);

    /// Replace unpaired UTF-16 surrogates (and a trailing odd byte) with U+FFFD
    /// instead of failing with [`crate::DecodeError::InvalidUtf16`].
    pub const Utf16Lossy: Self = Self(0x01);

    /// Remove trailing NUL characters from strings that extend to the end of
    /// the payload (`Utf16Rest`, `AnsiRest`). Producers often pad these.
    pub const TrimRestNul: Self = Self(0x02);

    /// All flags set.
    pub const All: Self = Self(0x03);

    /// Default flags: `TrimRestNul`. Invalid UTF-16 is reported as an error.
    pub const Default: Self = Self::TrimRestNul;
}

impl Default for DecodeOptions {
    fn default() -> Self {
        return Self::Default;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags() {
        let options = DecodeOptions::default();
        assert!(options.has_flag(DecodeOptions::TrimRestNul));
        assert!(!options.has_flag(DecodeOptions::Utf16Lossy));

        let options = options.or(DecodeOptions::Utf16Lossy);
        assert_eq!(DecodeOptions::All, options);
        assert_eq!(
            DecodeOptions::Utf16Lossy,
            options.and_not(DecodeOptions::TrimRestNul)
        );
        assert_eq!(3, DecodeOptions::from_int(3).as_int());
        assert!(!DecodeOptions::None.has_flag(DecodeOptions::All));
    }
}
