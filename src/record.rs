//! SenML records and their typed values

use tracing::warn;

use crate::unit::SenMLUnit;

/// Callback fired when a parse delivers binary data to an actuator record
pub type DataCallback = Box<dyn FnMut(&[u8]) + Send>;

/// The single typed value slot of a record
///
/// `Float` carries an optional decimal precision hint used only when
/// rendering to JSON; it never affects the stored value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SenMLValue {
    /// No value stored yet
    #[default]
    None,
    /// Numeric measurement (`v` on the wire)
    Float { value: f64, precision: Option<u8> },
    /// Boolean measurement (`vb`)
    Bool(bool),
    /// Textual measurement (`vs`)
    Str(String),
    /// Opaque binary measurement (`vd`; base64 in JSON, native bytes in CBOR)
    Data(Vec<u8>),
    /// Integrated sum (`s`)
    Sum(f64),
}

/// Binary value as delivered by a parser, before decoding
#[derive(Debug, Clone, Copy)]
pub enum IncomingData<'a> {
    /// JSON framing: base64 text, still encoded
    Base64(&'a str),
    /// CBOR framing: a native byte string
    Raw(&'a [u8]),
}

/// A single sensor or actuator reading
///
/// Records are caller-owned leaves of a [`SenMLPack`](crate::SenMLPack)
/// tree. The stored `time` is an offset relative to the owning pack's base
/// time; `None` means the field is absent and is omitted on the wire.
pub struct SenMLRecord {
    pub name: String,
    pub unit: Option<SenMLUnit>,
    pub time: Option<f64>,
    pub value: SenMLValue,
    data_callback: Option<DataCallback>,
}

impl SenMLRecord {
    /// Create a record with no value
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            unit: None,
            time: None,
            value: SenMLValue::None,
            data_callback: None,
        }
    }

    /// Create a record with a numeric value
    pub fn with_value<S: Into<String>>(name: S, value: f64) -> Self {
        let mut record = Self::new(name);
        record.set_value(value);
        record
    }

    /// Create a record with a boolean value
    pub fn with_bool_value<S: Into<String>>(name: S, value: bool) -> Self {
        let mut record = Self::new(name);
        record.set_bool(value);
        record
    }

    /// Create a record with a string value
    pub fn with_string_value<S: Into<String>, V: Into<String>>(name: S, value: V) -> Self {
        let mut record = Self::new(name);
        record.set_string(value);
        record
    }

    /// Create a record with a binary value
    pub fn with_data_value<S: Into<String>>(name: S, data: Vec<u8>) -> Self {
        let mut record = Self::new(name);
        record.set_data(data);
        record
    }

    /// Create a record with an integrated sum
    pub fn with_sum<S: Into<String>>(name: S, sum: f64) -> Self {
        let mut record = Self::new(name);
        record.set_sum(sum);
        record
    }

    /// Create a binary actuator: a data record whose callback fires whenever
    /// a parse delivers a value for it, after any base64 decoding
    pub fn binary_actuator<S: Into<String>>(name: S, callback: DataCallback) -> Self {
        let mut record = Self::new(name);
        record.data_callback = Some(callback);
        record
    }

    /// Set the unit
    pub fn with_unit(mut self, unit: SenMLUnit) -> Self {
        self.unit = Some(unit);
        self
    }

    /// Set the time offset
    pub fn with_time(mut self, time: f64) -> Self {
        self.time = Some(time);
        self
    }

    pub fn set_value(&mut self, value: f64) {
        self.value = SenMLValue::Float {
            value,
            precision: None,
        };
    }

    /// Store a numeric value along with the decimal precision to render it at
    pub fn set_value_with_precision(&mut self, value: f64, precision: u8) {
        self.value = SenMLValue::Float {
            value,
            precision: Some(precision),
        };
    }

    pub fn set_bool(&mut self, value: bool) {
        self.value = SenMLValue::Bool(value);
    }

    pub fn set_string<V: Into<String>>(&mut self, value: V) {
        self.value = SenMLValue::Str(value.into());
    }

    pub fn set_data(&mut self, data: Vec<u8>) {
        self.value = SenMLValue::Data(data);
    }

    pub fn set_sum(&mut self, sum: f64) {
        self.value = SenMLValue::Sum(sum);
    }

    pub fn set_time(&mut self, time: f64) {
        self.time = Some(time);
    }

    pub fn set_unit(&mut self, unit: SenMLUnit) {
        self.unit = Some(unit);
    }

    /// Whether this record has a value to render
    pub fn has_value(&self) -> bool {
        !matches!(self.value, SenMLValue::None)
    }

    /// Number of wire fields this record contributes (name + unit? + time? + value?)
    pub fn field_count(&self) -> usize {
        1 + usize::from(self.unit.is_some())
            + usize::from(self.time.is_some())
            + usize::from(self.has_value())
    }

    /// Shift the stored time so the absolute time (base + offset) survives a
    /// base-time change on the owning pack
    pub(crate) fn adjust_to_base_time(&mut self, old_base: f64, new_base: f64) {
        if let Some(t) = self.time {
            self.time = Some(t + old_base - new_base);
        }
    }

    /// Deliver a parsed binary value: decode if needed, store, fire the callback
    ///
    /// Decoding failures are logged and the record is left unchanged; a parse
    /// never aborts over one bad value.
    pub(crate) fn actuate(&mut self, incoming: IncomingData<'_>) {
        let decoded = match incoming {
            #[cfg(feature = "json")]
            IncomingData::Base64(text) => {
                use base64::Engine as _;
                match base64::engine::general_purpose::STANDARD.decode(text) {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        warn!(record = %self.name, error = %e, "discarding undecodable base64 value");
                        return;
                    }
                }
            }
            #[cfg(not(feature = "json"))]
            IncomingData::Base64(_) => {
                warn!(record = %self.name, "base64 data received without json support");
                return;
            }
            IncomingData::Raw(bytes) => bytes.to_vec(),
        };
        if let Some(callback) = self.data_callback.as_mut() {
            callback(&decoded);
        }
        self.value = SenMLValue::Data(decoded);
    }
}

impl std::fmt::Debug for SenMLRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SenMLRecord")
            .field("name", &self.name)
            .field("unit", &self.unit)
            .field("time", &self.time)
            .field("value", &self.value)
            .field("actuator", &self.data_callback.is_some())
            .finish()
    }
}

impl PartialEq for SenMLRecord {
    fn eq(&self, other: &Self) -> bool {
        // Callbacks are identity, not state
        self.name == other.name
            && self.unit == other.unit
            && self.time == other.time
            && self.value == other.value
    }
}
