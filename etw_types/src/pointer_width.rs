// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

use core::fmt;

/// Size of address-sized ("pointer") fields in an event payload. Determined by
/// the architecture of the process (or kernel) that produced the event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PointerWidth {
    /// Pointers are 4 bytes.
    Bits32,

    /// Pointers are 8 bytes.
    Bits64,
}

impl PointerWidth {
    /// `EVENT_HEADER_FLAG_32_BIT_HEADER`: the event was logged by a 32-bit producer.
    pub const HEADER_FLAG_32_BIT: u16 = 0x0020;

    /// `EVENT_HEADER_FLAG_64_BIT_HEADER`: the event was logged by a 64-bit producer.
    pub const HEADER_FLAG_64_BIT: u16 = 0x0040;

    /// Returns the pointer width of the current target.
    pub const fn host() -> Self {
        return if cfg!(target_pointer_width = "32") {
            Self::Bits32
        } else {
            Self::Bits64
        };
    }

    /// Returns `Bits32` for 4, `Bits64` for 8, `None` otherwise.
    pub const fn from_size(size: u8) -> Option<Self> {
        return match size {
            4 => Some(Self::Bits32),
            8 => Some(Self::Bits64),
            _ => None,
        };
    }

    /// Gets the pointer width from an ETW event header's `Flags` field.
    /// Headers with neither the 32-bit nor the 64-bit flag are treated as 64-bit.
    pub const fn from_header_flags(flags: u16) -> Self {
        return if flags & Self::HEADER_FLAG_32_BIT != 0 {
            Self::Bits32
        } else {
            Self::Bits64
        };
    }

    /// Size of a pointer in bytes (4 or 8).
    pub const fn size(self) -> usize {
        return match self {
            Self::Bits32 => 4,
            Self::Bits64 => 8,
        };
    }

    /// Returns true for `Bits64`.
    pub const fn is_64bit(self) -> bool {
        return matches!(self, Self::Bits64);
    }
}

impl fmt::Display for PointerWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            PointerWidth::Bits32 => "Bits32",
            PointerWidth::Bits64 => "Bits64",
        };
        return f.pad(text);
    }
}
