// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Field cursors for the fixed-width discovery frame layout.
//!
//! Every write and read is bounds-checked and advances the offset, so field
//! positions follow from the field order and widths instead of literals.

use crate::error::{Error, Result};

/// Bounds-checked writer over a caller-provided buffer.
pub(crate) struct FrameWriter<'a> {
    buffer: &'a mut [u8],
    offset: usize,
}

impl<'a> FrameWriter<'a> {
    pub fn new(buffer: &'a mut [u8]) -> Self {
        Self { buffer, offset: 0 }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    fn reserve(&self, len: usize) -> Result<()> {
        let required = self.offset + len;
        if required > self.buffer.len() {
            return Err(Error::BufferTooSmall {
                required,
                available: self.buffer.len(),
            });
        }
        Ok(())
    }

    pub fn write_u8(&mut self, value: u8) -> Result<()> {
        self.reserve(1)?;
        self.buffer[self.offset] = value;
        self.offset += 1;
        Ok(())
    }

    pub fn write_bytes(&mut self, data: &[u8]) -> Result<()> {
        self.reserve(data.len())?;
        self.buffer[self.offset..self.offset + data.len()].copy_from_slice(data);
        self.offset += data.len();
        Ok(())
    }

    /// Write `value` into a `width`-byte slot, NUL padded. At least one NUL
    /// always terminates the field.
    pub fn write_field(&mut self, field: &'static str, value: &str, width: usize) -> Result<()> {
        if value.len() >= width {
            return Err(Error::FieldTooLong {
                field,
                max: width - 1,
            });
        }
        self.reserve(width)?;
        let slot = &mut self.buffer[self.offset..self.offset + width];
        slot[..value.len()].copy_from_slice(value.as_bytes());
        slot[value.len()..].fill(0);
        self.offset += width;
        Ok(())
    }

    /// Zero-fill up to absolute offset `end`.
    pub fn pad_to(&mut self, end: usize) -> Result<()> {
        if end <= self.offset {
            return Ok(());
        }
        self.reserve(end - self.offset)?;
        self.buffer[self.offset..end].fill(0);
        self.offset = end;
        Ok(())
    }
}

/// Bounds-checked reader.
pub(crate) struct FrameReader<'a> {
    buffer: &'a [u8],
    offset: usize,
}

impl<'a> FrameReader<'a> {
    pub fn new(buffer: &'a [u8]) -> Self {
        Self { buffer, offset: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.offset)
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self.offset + len;
        if end > self.buffer.len() {
            return Err(Error::Truncated {
                expected: end,
                actual: self.buffer.len(),
            });
        }
        let bytes = &self.buffer[self.offset..end];
        self.offset = end;
        Ok(bytes)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    /// Read a `width`-byte NUL padded slot. The last byte is treated as NUL
    /// whatever it holds; invalid UTF-8 is replaced.
    pub fn read_field(&mut self, width: usize) -> Result<String> {
        let slot = self.take(width)?;
        let usable = &slot[..width.saturating_sub(1)];
        let end = usable.iter().position(|&b| b == 0).unwrap_or(usable.len());
        Ok(String::from_utf8_lossy(&usable[..end]).into_owned())
    }
}
