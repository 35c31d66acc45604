// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Encoding of Rust strings into the platform `wchar_t` representation.

use smallvec::SmallVec;

use super::raw::wide_char;

/// Number of wide characters kept on the stack before spilling to the heap.
pub(crate) const INLINE_CAPACITY: usize = 32;

/// A string encoded as `wchar_t` units, not null-terminated.
pub(crate) struct WideString {
    units: SmallVec<[wide_char; INLINE_CAPACITY]>,
}

impl WideString {
    #[cfg(windows)]
    pub(crate) fn new(text: &str) -> Self {
        Self {
            units: text.encode_utf16().collect(),
        }
    }

    #[cfg(not(windows))]
    pub(crate) fn new(text: &str) -> Self {
        Self {
            units: text.chars().map(u32::from).collect(),
        }
    }

    pub(crate) fn as_ptr(&self) -> *const wide_char {
        self.units.as_ptr()
    }

    /// Length in `wchar_t` units, which is what the native side counts.
    pub(crate) fn char_count(&self) -> u16 {
        clamp_count(self.units.len())
    }

    #[cfg(test)]
    pub(crate) fn spilled(&self) -> bool {
        self.units.spilled()
    }
}

/// Counts wider than the ABI allows are cut down, so the native side only
/// reads a prefix.
pub(crate) fn clamp_count(len: usize) -> u16 {
    u16::try_from(len).unwrap_or(u16::MAX)
}

/// Decodes `len` wide characters starting at `ptr`.
///
/// SAFETY: `ptr` must be valid for `len` reads, or null with `len == 0`.
#[cfg(test)]
pub(crate) unsafe fn decode(ptr: *const wide_char, len: u16) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    let units = unsafe { std::slice::from_raw_parts(ptr, len.into()) };
    #[cfg(windows)]
    let text = String::from_utf16_lossy(units);
    #[cfg(not(windows))]
    let text = units
        .iter()
        .map(|&u| char::from_u32(u).unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect();
    Some(text)
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test_case("", 0; "empty")]
    #[test_case("Load", 4; "ascii")]
    #[test_case("übersetzen", 10; "latin-1 supplement")]
    fn test_char_count(text: &str, expected: u16) {
        assert_eq!(WideString::new(text).char_count(), expected);
    }

    #[test]
    fn test_short_text_stays_inline() {
        let wide = WideString::new("Worker");
        assert!(!wide.spilled());
        assert_eq!(unsafe { decode(wide.as_ptr(), wide.char_count()) }.unwrap(), "Worker");
    }

    #[test]
    fn test_long_text_spills_to_heap() {
        let text = "a-fairly-long-event-identifier-that-does-not-fit-inline";
        let wide = WideString::new(text);
        assert!(wide.spilled());
        assert_eq!(unsafe { decode(wide.as_ptr(), wide.char_count()) }.unwrap(), text);
    }

    #[test]
    fn test_clamp_count() {
        assert_eq!(clamp_count(6), 6);
        assert_eq!(clamp_count(usize::from(u16::MAX)), u16::MAX);
        assert_eq!(clamp_count(100_000), u16::MAX);
    }
}
