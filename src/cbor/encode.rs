//! Minimal CBOR primitive writer
//!
//! Just enough of RFC 8949 to render SenML: shortest-form headers,
//! signed integers, definite-length text and byte strings, doubles, bools,
//! and array/map headers with counts known up front.

use crate::Result;
use crate::io::{ByteSink, StreamFormat, write_framed};

pub(crate) const MAJOR_UNSIGNED: u8 = 0;
pub(crate) const MAJOR_NEGATIVE: u8 = 1;
pub(crate) const MAJOR_BYTES: u8 = 2;
pub(crate) const MAJOR_TEXT: u8 = 3;
pub(crate) const MAJOR_ARRAY: u8 = 4;
pub(crate) const MAJOR_MAP: u8 = 5;
pub(crate) const MAJOR_TAG: u8 = 6;
pub(crate) const MAJOR_SIMPLE: u8 = 7;

/// Explicit render context for the CBOR tree walk
pub(crate) struct CborWriter<'a, S: ?Sized> {
    sink: &'a mut S,
    format: StreamFormat,
}

impl<'a, S: ByteSink + ?Sized> CborWriter<'a, S> {
    pub fn new(sink: &'a mut S, format: StreamFormat) -> Self {
        Self { sink, format }
    }

    fn raw(&mut self, bytes: &[u8]) -> Result<()> {
        write_framed(self.sink, self.format, bytes)
    }

    /// Major type + shortest-form argument
    pub fn header(&mut self, major: u8, value: u64) -> Result<()> {
        let major = major << 5;
        if value < 24 {
            self.raw(&[major | value as u8])
        } else if value <= u64::from(u8::MAX) {
            self.raw(&[major | 24, value as u8])
        } else if value <= u64::from(u16::MAX) {
            let b = (value as u16).to_be_bytes();
            self.raw(&[major | 25, b[0], b[1]])
        } else if value <= u64::from(u32::MAX) {
            let b = (value as u32).to_be_bytes();
            self.raw(&[major | 26, b[0], b[1], b[2], b[3]])
        } else {
            let b = value.to_be_bytes();
            self.raw(&[major | 27])?;
            self.raw(&b)
        }
    }

    pub fn int(&mut self, value: i64) -> Result<()> {
        if value >= 0 {
            self.header(MAJOR_UNSIGNED, value as u64)
        } else {
            self.header(MAJOR_NEGATIVE, !(value as u64))
        }
    }

    pub fn text(&mut self, value: &str) -> Result<()> {
        self.header(MAJOR_TEXT, value.len() as u64)?;
        self.raw(value.as_bytes())
    }

    pub fn bytes(&mut self, value: &[u8]) -> Result<()> {
        self.header(MAJOR_BYTES, value.len() as u64)?;
        self.raw(value)
    }

    pub fn double(&mut self, value: f64) -> Result<()> {
        self.raw(&[(MAJOR_SIMPLE << 5) | 27])?;
        self.raw(&value.to_be_bytes())
    }

    pub fn bool(&mut self, value: bool) -> Result<()> {
        self.raw(&[(MAJOR_SIMPLE << 5) | if value { 21 } else { 20 }])
    }

    pub fn array_header(&mut self, len: usize) -> Result<()> {
        self.header(MAJOR_ARRAY, len as u64)
    }

    pub fn map_header(&mut self, len: usize) -> Result<()> {
        self.header(MAJOR_MAP, len as u64)
    }
}
