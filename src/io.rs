//! Byte sink/source seams between the codecs and platform I/O
//!
//! The codecs never talk to a platform stream directly. Rendering goes
//! through [`ByteSink`], parsing pulls single bytes from a [`ByteSource`]
//! until it yields `None` (the end-of-stream sentinel). Buffering and
//! backpressure are whatever the adapter behind the trait provides.

use crate::{Result, SenMLError};

/// Destination for rendered wire bytes
pub trait ByteSink {
    /// Write all of `bytes` to the sink
    fn write(&mut self, bytes: &[u8]) -> Result<()>;
}

impl<W: std::io::Write> ByteSink for W {
    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        self.write_all(bytes)?;
        Ok(())
    }
}

/// Source of wire bytes, one at a time
pub trait ByteSource {
    /// Pull the next byte, or `None` once the stream is exhausted
    fn read_byte(&mut self) -> Result<Option<u8>>;
}

/// A [`ByteSource`] over an in-memory slice
#[derive(Debug)]
pub struct SliceSource<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> SliceSource<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }
}

impl ByteSource for SliceSource<'_> {
    fn read_byte(&mut self) -> Result<Option<u8>> {
        let byte = self.data.get(self.pos).copied();
        if byte.is_some() {
            self.pos += 1;
        }
        Ok(byte)
    }
}

/// A [`ByteSource`] over any blocking [`std::io::Read`]
#[derive(Debug)]
pub struct ReaderSource<R> {
    reader: R,
}

impl<R: std::io::Read> ReaderSource<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: std::io::Read> ByteSource for ReaderSource<R> {
    fn read_byte(&mut self) -> Result<Option<u8>> {
        let mut buf = [0u8; 1];
        loop {
            match self.reader.read(&mut buf) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(buf[0])),
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }
}

/// Framing applied on top of the raw wire bytes
///
/// `Hex` carries each wire byte as two ASCII hex characters, for transports
/// that cannot pass binary or where a human needs to read along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamFormat {
    #[default]
    Raw,
    Hex,
}

const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

/// Write `bytes` through `sink`, hex-expanding when the format asks for it
pub(crate) fn write_framed<S: ByteSink + ?Sized>(
    sink: &mut S,
    format: StreamFormat,
    bytes: &[u8],
) -> Result<()> {
    match format {
        StreamFormat::Raw => sink.write(bytes),
        StreamFormat::Hex => {
            for &b in bytes {
                let pair = [
                    HEX_DIGITS[(b >> 4) as usize],
                    HEX_DIGITS[(b & 0x0f) as usize],
                ];
                sink.write(&pair)?;
            }
            Ok(())
        }
    }
}

/// Read one logical wire byte, collapsing a hex pair when the format asks
///
/// In hex mode, ASCII whitespace before a pair is tolerated; a stream that
/// ends halfway through a pair is an error.
pub(crate) fn read_framed<B: ByteSource + ?Sized>(
    source: &mut B,
    format: StreamFormat,
) -> Result<Option<u8>> {
    match format {
        StreamFormat::Raw => source.read_byte(),
        StreamFormat::Hex => {
            let hi = loop {
                match source.read_byte()? {
                    None => return Ok(None),
                    Some(b) if b.is_ascii_whitespace() => continue,
                    Some(b) => break hex_nibble(b)?,
                }
            };
            let lo = match source.read_byte()? {
                None => return Err(SenMLError::UnexpectedEof),
                Some(b) => hex_nibble(b)?,
            };
            Ok(Some((hi << 4) | lo))
        }
    }
}

fn hex_nibble(byte: u8) -> Result<u8> {
    match byte {
        b'0'..=b'9' => Ok(byte - b'0'),
        b'a'..=b'f' => Ok(byte - b'a' + 10),
        b'A'..=b'F' => Ok(byte - b'A' + 10),
        _ => Err(SenMLError::serialization(format!(
            "invalid hex digit 0x{byte:02x}"
        ))),
    }
}
