//! Pull-based CBOR decoder over a byte source

use tracing::debug;

use crate::io::{ByteSource, StreamFormat, read_framed};
use crate::{Result, SenMLError};

use super::encode::{
    MAJOR_ARRAY, MAJOR_BYTES, MAJOR_MAP, MAJOR_NEGATIVE, MAJOR_SIMPLE, MAJOR_TAG, MAJOR_TEXT,
    MAJOR_UNSIGNED,
};

/// A decoded data item header: major type plus its argument
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Header {
    /// Definite argument (small value, length, or count)
    Definite { major: u8, arg: u64, info: u8 },
    /// Indefinite-length container start
    Indefinite { major: u8 },
    /// The `break` stop code terminating an indefinite container
    Break,
}

/// One complete scalar data item, buffered at value granularity
#[derive(Debug, PartialEq)]
pub(crate) enum CborValue {
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    Bool(bool),
    Null,
    /// A nested structure or unsupported item that was consumed and dropped
    Skipped,
}

pub(crate) struct CborReader<'a, B: ?Sized> {
    source: &'a mut B,
    format: StreamFormat,
}

impl<'a, B: ByteSource + ?Sized> CborReader<'a, B> {
    pub fn new(source: &'a mut B, format: StreamFormat) -> Self {
        Self { source, format }
    }

    fn byte(&mut self) -> Result<u8> {
        read_framed(self.source, self.format)?.ok_or(SenMLError::UnexpectedEof)
    }

    pub fn header(&mut self) -> Result<Header> {
        let initial = self.byte()?;
        let major = initial >> 5;
        let info = initial & 0x1f;
        let arg = match info {
            0..=23 => u64::from(info),
            24 => u64::from(self.byte()?),
            25 => {
                let b = [self.byte()?, self.byte()?];
                u64::from(u16::from_be_bytes(b))
            }
            26 => {
                let mut b = [0u8; 4];
                for slot in &mut b {
                    *slot = self.byte()?;
                }
                u64::from(u32::from_be_bytes(b))
            }
            27 => {
                let mut b = [0u8; 8];
                for slot in &mut b {
                    *slot = self.byte()?;
                }
                u64::from_be_bytes(b)
            }
            31 => {
                return if major == MAJOR_SIMPLE {
                    Ok(Header::Break)
                } else if matches!(major, MAJOR_ARRAY | MAJOR_MAP) {
                    Ok(Header::Indefinite { major })
                } else {
                    Err(SenMLError::invalid_cbor(
                        "indefinite-length strings are not supported",
                    ))
                };
            }
            _ => {
                return Err(SenMLError::invalid_cbor(format!(
                    "reserved additional info {info}"
                )));
            }
        };
        Ok(Header::Definite { major, arg, info })
    }

    /// Read one complete data item, buffering strings and byte strings,
    /// consuming and discarding nested structures
    pub fn value(&mut self) -> Result<CborValue> {
        let header = self.header()?;
        self.value_for(header)
    }

    pub fn value_for(&mut self, header: Header) -> Result<CborValue> {
        match header {
            Header::Break => Err(SenMLError::invalid_cbor("unexpected break code")),
            Header::Indefinite { major } => {
                self.skip_indefinite(major)?;
                Ok(CborValue::Skipped)
            }
            Header::Definite { major, arg, info } => match major {
                MAJOR_UNSIGNED => {
                    let v = i64::try_from(arg)
                        .map_err(|_| SenMLError::invalid_cbor("integer out of range"))?;
                    Ok(CborValue::Int(v))
                }
                MAJOR_NEGATIVE => {
                    let v = i64::try_from(arg)
                        .map_err(|_| SenMLError::invalid_cbor("integer out of range"))?;
                    Ok(CborValue::Int(-1 - v))
                }
                MAJOR_BYTES => Ok(CborValue::Bytes(self.take(arg)?)),
                MAJOR_TEXT => {
                    let bytes = self.take(arg)?;
                    String::from_utf8(bytes)
                        .map(CborValue::Text)
                        .map_err(|_| SenMLError::InvalidUtf8 {
                            context: "CBOR text string",
                        })
                }
                MAJOR_ARRAY => {
                    for _ in 0..arg {
                        self.value()?;
                    }
                    Ok(CborValue::Skipped)
                }
                MAJOR_MAP => {
                    for _ in 0..arg.saturating_mul(2) {
                        self.value()?;
                    }
                    Ok(CborValue::Skipped)
                }
                MAJOR_TAG => {
                    debug!(tag = arg, "ignoring CBOR tag");
                    self.value()
                }
                _ => self.simple(arg, info),
            },
        }
    }

    fn simple(&mut self, arg: u64, info: u8) -> Result<CborValue> {
        match info {
            20 => Ok(CborValue::Bool(false)),
            21 => Ok(CborValue::Bool(true)),
            22 | 23 => Ok(CborValue::Null),
            25 => Ok(CborValue::Float(half_to_f64(arg as u16))),
            26 => Ok(CborValue::Float(f64::from(f32::from_bits(arg as u32)))),
            27 => Ok(CborValue::Float(f64::from_bits(arg))),
            _ => {
                debug!(value = arg, "ignoring unassigned simple value");
                Ok(CborValue::Skipped)
            }
        }
    }

    fn take(&mut self, len: u64) -> Result<Vec<u8>> {
        let len = usize::try_from(len)
            .map_err(|_| SenMLError::invalid_cbor("string length out of range"))?;
        let mut out = Vec::with_capacity(len.min(4096));
        for _ in 0..len {
            out.push(self.byte()?);
        }
        Ok(out)
    }

    fn skip_indefinite(&mut self, _major: u8) -> Result<()> {
        loop {
            match self.header()? {
                Header::Break => return Ok(()),
                h => {
                    self.value_for(h)?;
                }
            }
        }
    }
}

/// IEEE 754 half-precision to double, RFC 8949 appendix D
fn half_to_f64(half: u16) -> f64 {
    let exp = (half >> 10) & 0x1f;
    let mant = f64::from(half & 0x3ff);
    let value = match exp {
        0 => mant * 2f64.powi(-24),
        31 => {
            if mant == 0.0 {
                f64::INFINITY
            } else {
                f64::NAN
            }
        }
        _ => (mant + 1024.0) * 2f64.powi(i32::from(exp) - 25),
    };
    if half & 0x8000 != 0 { -value } else { value }
}
