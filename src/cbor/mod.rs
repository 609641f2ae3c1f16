//! SenML CBOR wire format
//!
//! Same tree walk and inlining rule as the JSON renderer, but keys are the
//! RFC 8428 reserved integer labels and binary values are native byte
//! strings. CBOR frames containers with up-front counts instead of
//! delimiters, so rendering leans on [`SenMLPack::array_length`] and
//! [`SenMLPack::field_length`] for exact headers.

mod decode;
mod encode;

use tracing::debug;

use crate::io::{ByteSink, ByteSource, StreamFormat};
use crate::node::SenMLNode;
use crate::pack::SenMLPack;
use crate::record::{SenMLRecord, SenMLValue};
use crate::resolve::{PendingRecord, PendingValue, Resolver};
use crate::{Result, SenMLError};

use decode::{CborReader, CborValue, Header};
use encode::{CborWriter, MAJOR_ARRAY, MAJOR_MAP};

/// RFC 8428 integer labels for SenML CBOR map keys
pub mod label {
    pub const BASE_NAME: i64 = -2;
    pub const BASE_TIME: i64 = -3;
    pub const BASE_UNIT: i64 = -4;
    pub const BASE_VALUE: i64 = -5;
    pub const BASE_SUM: i64 = -6;
    pub const NAME: i64 = 0;
    pub const UNIT: i64 = 1;
    pub const VALUE: i64 = 2;
    pub const STRING_VALUE: i64 = 3;
    pub const BOOL_VALUE: i64 = 4;
    pub const SUM: i64 = 5;
    pub const TIME: i64 = 6;
    pub const UPDATE_TIME: i64 = 7;
    pub const DATA_VALUE: i64 = 8;
}

/// Render `pack` as a SenML CBOR array
pub(crate) fn write_pack<S: ByteSink + ?Sized>(
    pack: &SenMLPack,
    sink: &mut S,
    format: StreamFormat,
) -> Result<()> {
    let mut writer = CborWriter::new(sink, format);
    writer.array_header(pack.array_length())?;
    content_to_cbor(pack, &mut writer)
}

fn content_to_cbor<S: ByteSink + ?Sized>(
    pack: &SenMLPack,
    writer: &mut CborWriter<'_, S>,
) -> Result<()> {
    writer.map_header(pack.field_length())?;
    pack_fields_to_cbor(pack, writer)?;

    let mut rest = pack.children().iter();
    if let Some(SenMLNode::Record(first)) = pack.children().first() {
        record_fields_to_cbor(first, writer)?;
        rest.next();
    }

    for child in rest {
        match child {
            SenMLNode::Record(record) => {
                writer.map_header(record.field_count())?;
                record_fields_to_cbor(record, writer)?;
            }
            SenMLNode::Pack(nested) => content_to_cbor(nested, writer)?,
        }
    }
    Ok(())
}

fn pack_fields_to_cbor<S: ByteSink + ?Sized>(
    pack: &SenMLPack,
    writer: &mut CborWriter<'_, S>,
) -> Result<()> {
    writer.int(label::BASE_NAME)?;
    writer.text(&pack.base_name)?;
    if let Some(unit) = pack.base_unit {
        writer.int(label::BASE_UNIT)?;
        writer.text(unit.symbol())?;
    }
    if let Some(bt) = pack.base_time() {
        writer.int(label::BASE_TIME)?;
        writer.double(bt)?;
    }
    if let Some(bs) = pack.base_sum {
        writer.int(label::BASE_SUM)?;
        writer.double(bs)?;
    }
    Ok(())
}

fn record_fields_to_cbor<S: ByteSink + ?Sized>(
    record: &SenMLRecord,
    writer: &mut CborWriter<'_, S>,
) -> Result<()> {
    writer.int(label::NAME)?;
    writer.text(&record.name)?;
    if let Some(unit) = record.unit {
        writer.int(label::UNIT)?;
        writer.text(unit.symbol())?;
    }
    if let Some(time) = record.time {
        writer.int(label::TIME)?;
        writer.double(time)?;
    }
    match &record.value {
        SenMLValue::None => Ok(()),
        SenMLValue::Float { value, .. } => {
            writer.int(label::VALUE)?;
            writer.double(*value)
        }
        SenMLValue::Bool(value) => {
            writer.int(label::BOOL_VALUE)?;
            writer.bool(*value)
        }
        SenMLValue::Str(value) => {
            writer.int(label::STRING_VALUE)?;
            writer.text(value)
        }
        SenMLValue::Data(data) => {
            writer.int(label::DATA_VALUE)?;
            writer.bytes(data)
        }
        SenMLValue::Sum(value) => {
            writer.int(label::SUM)?;
            writer.double(*value)
        }
    }
}

/// Parse a SenML CBOR document from `source` into `pack`
pub(crate) fn parse_into<B: ByteSource + ?Sized>(
    pack: &mut SenMLPack,
    source: &mut B,
    format: StreamFormat,
) -> Result<()> {
    let mut reader = CborReader::new(source, format);
    let mut resolver = Resolver::new(pack);

    match reader.header()? {
        Header::Definite {
            major: MAJOR_ARRAY,
            arg,
            ..
        } => {
            for _ in 0..arg {
                let pending = read_map(&mut reader)?;
                resolver.apply(pack, pending);
            }
            Ok(())
        }
        Header::Indefinite { major: MAJOR_ARRAY } => {
            loop {
                match reader.header()? {
                    Header::Break => return Ok(()),
                    header => {
                        let pending = read_map_body(&mut reader, header)?;
                        resolver.apply(pack, pending);
                    }
                }
            }
        }
        _ => Err(SenMLError::invalid_cbor("document is not a SenML array")),
    }
}

fn read_map<B: ByteSource + ?Sized>(reader: &mut CborReader<'_, B>) -> Result<PendingRecord> {
    let header = reader.header()?;
    read_map_body(reader, header)
}

fn read_map_body<B: ByteSource + ?Sized>(
    reader: &mut CborReader<'_, B>,
    header: Header,
) -> Result<PendingRecord> {
    let mut pending = PendingRecord::default();
    match header {
        Header::Definite {
            major: MAJOR_MAP,
            arg,
            ..
        } => {
            for _ in 0..arg {
                read_entry(reader, &mut pending)?;
            }
        }
        Header::Indefinite { major: MAJOR_MAP } => loop {
            match reader.header()? {
                Header::Break => break,
                key_header => {
                    let key = reader.value_for(key_header)?;
                    apply_entry(reader, &mut pending, key)?;
                }
            }
        },
        _ => return Err(SenMLError::invalid_cbor("array element is not a map")),
    }
    Ok(pending)
}

fn read_entry<B: ByteSource + ?Sized>(
    reader: &mut CborReader<'_, B>,
    pending: &mut PendingRecord,
) -> Result<()> {
    let key = reader.value()?;
    apply_entry(reader, pending, key)
}

fn apply_entry<B: ByteSource + ?Sized>(
    reader: &mut CborReader<'_, B>,
    pending: &mut PendingRecord,
    key: CborValue,
) -> Result<()> {
    let CborValue::Int(label) = key else {
        debug!(?key, "skipping non-integer map key");
        reader.value()?;
        return Ok(());
    };
    let value = reader.value()?;
    match (label, value) {
        (label::BASE_NAME, CborValue::Text(v)) => pending.base_name = Some(v),
        (label::BASE_UNIT, CborValue::Text(v)) => pending.base_unit = Some(v),
        (label::BASE_TIME, v) => pending.base_time = as_number(label, v),
        (label::BASE_SUM, v) => pending.base_sum = as_number(label, v),
        (label::NAME, CborValue::Text(v)) => pending.name = Some(v),
        (label::UNIT, CborValue::Text(v)) => pending.unit = Some(v),
        (label::TIME, v) => pending.time = as_number(label, v),
        (label::VALUE, v) => pending.value = as_number(label, v).map(PendingValue::Number),
        (label::SUM, v) => pending.value = as_number(label, v).map(PendingValue::Sum),
        (label::BOOL_VALUE, CborValue::Bool(v)) => pending.value = Some(PendingValue::Bool(v)),
        (label::STRING_VALUE, CborValue::Text(v)) => {
            pending.value = Some(PendingValue::Text(v));
        }
        (label::DATA_VALUE, CborValue::Bytes(v)) => {
            pending.value = Some(PendingValue::DataRaw(v));
        }
        (label, value) => debug!(label, ?value, "skipping unknown or mistyped map entry"),
    }
    Ok(())
}

/// Numeric labels accept any CBOR number representation
fn as_number(label: i64, value: CborValue) -> Option<f64> {
    match value {
        CborValue::Int(v) => Some(v as f64),
        CborValue::Float(v) => Some(v),
        other => {
            debug!(label, ?other, "skipping non-numeric value");
            None
        }
    }
}
