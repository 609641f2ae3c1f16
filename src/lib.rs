//! # SenML Stream - streaming Sensor Measurement Lists for Rust
//!
//! An implementation of [RFC 8428](https://tools.ietf.org/html/rfc8428) -
//! Sensor Measurement Lists (SenML) - built for constrained devices: records
//! are caller-owned, rendering streams straight into a byte sink, and parsing
//! consumes input one byte at a time with no document buffer.
//!
//! ## Features
//!
//! - **Dual wire formats**: JSON (string keys, base64 binary) and CBOR
//!   (integer labels, native byte strings)
//! - **Streaming parse**: a byte-driven JSON tokenizer and a pull-based CBOR
//!   decoder; only the token in flight is buffered
//! - **Base-value inheritance**: base name/unit/time on a pack apply to its
//!   children, and the first leaf child inlines into the pack's wire object
//! - **Device hierarchies**: packs nest, modelling devices behind a gateway
//! - **Actuation**: binary records can carry a callback that fires as soon as
//!   a parse delivers their value
//!
//! ## Quick Start
//!
//! ```rust
//! use senml_stream::{SenMLPack, SenMLRecord, SenMLUnit, Result};
//!
//! fn example() -> Result<()> {
//!     let mut pack = SenMLPack::new("dev1");
//!     pack.add(SenMLRecord::with_value("temp", 20.5).with_unit(SenMLUnit::Celsius));
//!
//!     let json = pack.to_json()?;
//!     assert_eq!(json, r#"[{"bn":"dev1","n":"temp","u":"Cel","v":20.5}]"#);
//!     Ok(())
//! }
//! # example().unwrap();
//! ```
//!
//! ## Parsing into a registered tree
//!
//! Parsing does not build a new document; it resolves each incoming record
//! against the records already registered in the pack (by name, with base
//! name concatenation) and sets their values in place, firing actuator
//! callbacks along the way. Anything that does not match is logged and
//! skipped.

pub mod error;
pub mod io;
pub mod node;
pub mod pack;
pub mod record;
pub mod unit;

#[cfg(any(feature = "json", feature = "cbor"))]
mod resolve;

#[cfg(feature = "json")]
pub mod json;

#[cfg(feature = "cbor")]
pub mod cbor;

// Re-export main types
pub use error::{Result, SenMLError};
pub use io::{ByteSink, ByteSource, ReaderSource, SliceSource, StreamFormat};
pub use node::SenMLNode;
pub use pack::SenMLPack;
pub use record::{DataCallback, SenMLRecord, SenMLValue};
pub use unit::SenMLUnit;

#[cfg(feature = "json")]
pub use json::tokenizer::{JsonEvent, JsonListener, JsonTokenizer};

/// SenML Content-Format identifiers for CoAP
pub mod content_format {
    /// application/senml+json
    pub const SENML_JSON: u16 = 110;
    /// application/sensml+json
    pub const SENSML_JSON: u16 = 111;
    /// application/senml+cbor
    pub const SENML_CBOR: u16 = 112;
    /// application/sensml+cbor
    pub const SENSML_CBOR: u16 = 113;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_pack_creation() {
        let mut pack = SenMLPack::new("urn:dev:sensor1;");
        pack.add(SenMLRecord::with_value("temperature", 22.5));

        assert_eq!(pack.len(), 1);
        assert_eq!(pack.base_name, "urn:dev:sensor1;");
        assert!(pack.children()[0].as_record().unwrap().has_value());
    }
}
