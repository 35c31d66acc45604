// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Colors attached to instrumentation events.

use std::fmt;

/// A color for an instrumentation event, packed as `0xRRGGBBAA`.
///
/// [`ProfilerColor::DEFAULT`] leaves the choice of color to Superluminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ProfilerColor(u32);

impl ProfilerColor {
    /// Lets the profiler pick the color.
    pub const DEFAULT: ProfilerColor = ProfilerColor(0xFFFF_FFFF);

    /// An opaque color from its red, green and blue components.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, 0xFF)
    }

    /// A color from all four components.
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        ProfilerColor(u32::from_be_bytes([r, g, b, a]))
    }

    /// A color from an already packed `0xRRGGBBAA` value.
    pub const fn from_u32(value: u32) -> Self {
        ProfilerColor(value)
    }

    /// The packed `0xRRGGBBAA` value handed to the profiler.
    pub const fn value(self) -> u32 {
        self.0
    }

    /// Red component.
    pub const fn r(self) -> u8 {
        self.0.to_be_bytes()[0]
    }

    /// Green component.
    pub const fn g(self) -> u8 {
        self.0.to_be_bytes()[1]
    }

    /// Blue component.
    pub const fn b(self) -> u8 {
        self.0.to_be_bytes()[2]
    }

    /// Alpha component.
    pub const fn a(self) -> u8 {
        self.0.to_be_bytes()[3]
    }
}

impl Default for ProfilerColor {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<u32> for ProfilerColor {
    fn from(value: u32) -> Self {
        ProfilerColor(value)
    }
}

impl From<ProfilerColor> for u32 {
    fn from(color: ProfilerColor) -> Self {
        color.0
    }
}

impl fmt::Display for ProfilerColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:08X}", self.0)
    }
}
