//! SenML JSON wire format
//!
//! Rendering walks the pack tree and emits a JSON array of objects through a
//! [`ByteSink`]; the first leaf child of each pack is inlined into the pack's
//! own object. Parsing drives the byte-at-a-time [`tokenizer`] with a
//! pack-bound listener, so no document buffer ever exists.

pub mod tokenizer;

mod listener;

use crate::io::{ByteSink, ByteSource, StreamFormat, read_framed, write_framed};
use crate::node::SenMLNode;
use crate::pack::SenMLPack;
use crate::record::{SenMLRecord, SenMLValue};
use crate::{Result, SenMLError};

use listener::PackListener;
use tokenizer::JsonTokenizer;

/// Render `pack` as a SenML JSON array
pub(crate) fn write_pack<S: ByteSink + ?Sized>(
    pack: &SenMLPack,
    sink: &mut S,
    format: StreamFormat,
) -> Result<()> {
    let mut writer = JsonWriter { sink, format };
    writer.raw(b"[")?;
    content_to_json(pack, &mut writer)?;
    writer.raw(b"]")
}

/// Parse a SenML JSON document from `source` into `pack`
pub(crate) fn parse_into<B: ByteSource + ?Sized>(
    pack: &mut SenMLPack,
    source: &mut B,
    format: StreamFormat,
) -> Result<()> {
    let mut tokenizer = JsonTokenizer::new();
    let mut listener = PackListener::new(pack);
    while let Some(byte) = read_framed(source, format)? {
        tokenizer.feed(byte, &mut listener)?;
    }
    tokenizer.finish(&mut listener)
}

/// Explicit render context: the sink and framing, threaded through the
/// recursive tree walk as a parameter
struct JsonWriter<'a, S: ?Sized> {
    sink: &'a mut S,
    format: StreamFormat,
}

impl<S: ByteSink + ?Sized> JsonWriter<'_, S> {
    fn raw(&mut self, bytes: &[u8]) -> Result<()> {
        write_framed(self.sink, self.format, bytes)
    }

    fn string(&mut self, text: &str) -> Result<()> {
        self.raw(b"\"")?;
        let mut start = 0;
        for (i, byte) in text.bytes().enumerate() {
            let escape: &[u8] = match byte {
                b'"' => b"\\\"",
                b'\\' => b"\\\\",
                b'\n' => b"\\n",
                b'\r' => b"\\r",
                b'\t' => b"\\t",
                0x00..=0x1f => &[],
                _ => continue,
            };
            self.raw(&text.as_bytes()[start..i])?;
            if escape.is_empty() {
                self.raw(format!("\\u{:04x}", byte).as_bytes())?;
            } else {
                self.raw(escape)?;
            }
            start = i + 1;
        }
        self.raw(&text.as_bytes()[start..])?;
        self.raw(b"\"")
    }

    fn number(&mut self, value: f64, precision: Option<u8>) -> Result<()> {
        if !value.is_finite() {
            return Err(SenMLError::serialization(
                "non-finite numbers cannot be rendered as JSON",
            ));
        }
        let text = match precision {
            Some(p) => {
                let fixed = format!("{:.*}", usize::from(p), value);
                if fixed.contains('.') {
                    fixed.trim_end_matches('0').trim_end_matches('.').to_string()
                } else {
                    fixed
                }
            }
            None => format!("{value}"),
        };
        self.raw(text.as_bytes())
    }
}

/// Emit a pack as one self-contained object (with its first leaf child
/// inlined), followed by sibling objects for its remaining children
fn content_to_json<S: ByteSink + ?Sized>(
    pack: &SenMLPack,
    writer: &mut JsonWriter<'_, S>,
) -> Result<()> {
    writer.raw(b"{")?;
    pack_fields_to_json(pack, writer)?;

    let mut rest = pack.children().iter();
    if let Some(SenMLNode::Record(first)) = pack.children().first() {
        writer.raw(b",")?;
        record_fields_to_json(first, writer)?;
        rest.next();
    }
    writer.raw(b"}")?;

    for child in rest {
        writer.raw(b",")?;
        match child {
            SenMLNode::Record(record) => {
                writer.raw(b"{")?;
                record_fields_to_json(record, writer)?;
                writer.raw(b"}")?;
            }
            SenMLNode::Pack(nested) => content_to_json(nested, writer)?,
        }
    }
    Ok(())
}

fn pack_fields_to_json<S: ByteSink + ?Sized>(
    pack: &SenMLPack,
    writer: &mut JsonWriter<'_, S>,
) -> Result<()> {
    writer.raw(b"\"bn\":")?;
    writer.string(&pack.base_name)?;
    if let Some(unit) = pack.base_unit {
        writer.raw(b",\"bu\":")?;
        writer.string(unit.symbol())?;
    }
    if let Some(bt) = pack.base_time() {
        writer.raw(b",\"bt\":")?;
        writer.number(bt, None)?;
    }
    if let Some(bs) = pack.base_sum {
        writer.raw(b",\"bs\":")?;
        writer.number(bs, None)?;
    }
    Ok(())
}

fn record_fields_to_json<S: ByteSink + ?Sized>(
    record: &SenMLRecord,
    writer: &mut JsonWriter<'_, S>,
) -> Result<()> {
    writer.raw(b"\"n\":")?;
    writer.string(&record.name)?;
    if let Some(unit) = record.unit {
        writer.raw(b",\"u\":")?;
        writer.string(unit.symbol())?;
    }
    if let Some(time) = record.time {
        writer.raw(b",\"t\":")?;
        writer.number(time, None)?;
    }
    match &record.value {
        SenMLValue::None => Ok(()),
        SenMLValue::Float { value, precision } => {
            writer.raw(b",\"v\":")?;
            writer.number(*value, *precision)
        }
        SenMLValue::Bool(value) => {
            writer.raw(b",\"vb\":")?;
            writer.raw(if *value { b"true" } else { b"false" })
        }
        SenMLValue::Str(value) => {
            writer.raw(b",\"vs\":")?;
            writer.string(value)
        }
        SenMLValue::Data(data) => {
            use base64::Engine as _;
            writer.raw(b",\"vd\":")?;
            let encoded = base64::engine::general_purpose::STANDARD.encode(data);
            writer.string(&encoded)
        }
        SenMLValue::Sum(value) => {
            writer.raw(b",\"s\":")?;
            writer.number(*value, None)
        }
    }
}
