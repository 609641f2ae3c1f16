//! SenML packs: containers of records with shared base fields

use crate::node::SenMLNode;
use crate::record::SenMLRecord;
use crate::unit::SenMLUnit;
#[allow(unused_imports)]
use crate::{
    Result,
    io::{ByteSink, ByteSource, StreamFormat},
};

/// An ordered collection of records that share base fields
///
/// Children inherit `base_name` (prefixed to their names on the wire),
/// `base_unit`, and `base_time` (their stored times are offsets from it).
/// A child may itself be a pack, modelling a device behind a gateway; it then
/// renders as its own wire object that resets the base fields.
///
/// Children are owned by value. A record moves into the pack on
/// [`add`](Self::add), so one record can never be linked into two packs; the
/// double-add failure mode of pointer-linked SenML implementations is
/// unrepresentable here.
#[derive(Debug, PartialEq, Default)]
pub struct SenMLPack {
    pub base_name: String,
    pub base_unit: Option<SenMLUnit>,
    pub base_sum: Option<f64>,
    pub(crate) base_time: Option<f64>,
    children: Vec<SenMLNode>,
}

impl SenMLPack {
    /// Create an empty pack
    pub fn new<S: Into<String>>(base_name: S) -> Self {
        Self {
            base_name: base_name.into(),
            ..Default::default()
        }
    }

    /// Set the base unit
    pub fn with_base_unit(mut self, unit: SenMLUnit) -> Self {
        self.base_unit = Some(unit);
        self
    }

    /// Set the base time without adjusting children (builder form, for packs
    /// that are still empty)
    pub fn with_base_time(mut self, time: f64) -> Self {
        self.base_time = Some(time);
        self
    }

    /// Set the base sum
    pub fn with_base_sum(mut self, sum: f64) -> Self {
        self.base_sum = Some(sum);
        self
    }

    /// The current base time, if set
    pub fn base_time(&self) -> Option<f64> {
        self.base_time
    }

    /// Change the base time, shifting every child's stored time so each
    /// child's absolute time (base + offset) is preserved
    ///
    /// Recurses into nested packs that have no base time of their own; a
    /// nested pack with its own base time anchors its subtree.
    pub fn set_base_time(&mut self, time: f64) {
        let old = self.base_time.unwrap_or(0.0);
        self.base_time = Some(time);
        for child in &mut self.children {
            child.adjust_to_base_time(old, time);
        }
    }

    /// Append a child in O(1), taking ownership of it
    pub fn add(&mut self, child: impl Into<SenMLNode>) {
        self.children.push(child.into());
    }

    /// Drop all children, recursing into nested packs first
    ///
    /// Safe to call on an empty pack, repeatedly.
    pub fn clear(&mut self) {
        for child in &mut self.children {
            if let SenMLNode::Pack(p) = child {
                p.clear();
            }
        }
        self.children.clear();
    }

    /// Number of direct children
    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// The direct children, in wire order
    pub fn children(&self) -> &[SenMLNode] {
        &self.children
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SenMLNode> {
        self.children.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, SenMLNode> {
        self.children.iter_mut()
    }

    /// Exact number of top-level wire array elements this pack renders
    ///
    /// The pack itself is one element; a leaf first child merges into it
    /// (the inlining rule) and so contributes no element of its own.
    pub fn array_length(&self) -> usize {
        let mut result = 1;
        for child in &self.children {
            result += child.array_length();
        }
        if matches!(self.children.first(), Some(SenMLNode::Record(_))) {
            result -= 1;
        }
        result
    }

    /// Exact number of wire fields in this pack's own object/map, including
    /// an inlined first child's fields
    pub fn field_length(&self) -> usize {
        let mut result = 1; // base name is always rendered
        result += usize::from(self.base_unit.is_some());
        result += usize::from(self.base_time.is_some());
        result += usize::from(self.base_sum.is_some());
        if let Some(SenMLNode::Record(first)) = self.children.first() {
            result += first.field_count();
        }
        result
    }

    /// Find the pack (self or a nested descendant) with the given base name
    pub(crate) fn find_pack_mut(&mut self, base_name: &str) -> Option<&mut SenMLPack> {
        if self.base_name == base_name {
            return Some(self);
        }
        for child in &mut self.children {
            if let SenMLNode::Pack(p) = child
                && let Some(found) = p.find_pack_mut(base_name)
            {
                return Some(found);
            }
        }
        None
    }

    /// Find a direct leaf child by its bare record name
    pub(crate) fn find_child_record_mut(&mut self, name: &str) -> Option<&mut SenMLRecord> {
        self.children
            .iter_mut()
            .filter_map(SenMLNode::as_record_mut)
            .find(|r| r.name == name)
    }

    /// Find a record anywhere in the tree whose resolved full name
    /// (owning pack's base name + record name) matches
    pub(crate) fn find_record_mut(&mut self, full_name: &str) -> Option<&mut SenMLRecord> {
        let suffix = full_name.strip_prefix(self.base_name.as_str());
        for child in &mut self.children {
            match child {
                SenMLNode::Record(r) => {
                    if suffix == Some(r.name.as_str()) || r.name == full_name {
                        return Some(r);
                    }
                }
                SenMLNode::Pack(p) => {
                    if let Some(found) = p.find_record_mut(full_name) {
                        return Some(found);
                    }
                }
            }
        }
        None
    }
}

impl<'a> IntoIterator for &'a SenMLPack {
    type Item = &'a SenMLNode;
    type IntoIter = std::slice::Iter<'a, SenMLNode>;

    fn into_iter(self) -> Self::IntoIter {
        self.children.iter()
    }
}

// Wire format entry points
impl SenMLPack {
    /// Render this pack as a SenML JSON array into `sink`
    #[cfg(feature = "json")]
    pub fn write_json<S: ByteSink + ?Sized>(
        &self,
        sink: &mut S,
        format: StreamFormat,
    ) -> Result<()> {
        crate::json::write_pack(self, sink, format)
    }

    /// Render this pack as a SenML JSON string
    #[cfg(feature = "json")]
    pub fn to_json(&self) -> Result<String> {
        let mut out: Vec<u8> = Vec::new();
        self.write_json(&mut out, StreamFormat::Raw)?;
        String::from_utf8(out).map_err(|_| crate::SenMLError::InvalidUtf8 {
            context: "rendered JSON",
        })
    }

    /// Parse a SenML JSON document from `source`, one byte at a time, setting
    /// values on matching records in this tree and firing actuator callbacks
    ///
    /// Blocks until the source reports end-of-stream.
    #[cfg(feature = "json")]
    pub fn from_json<B: ByteSource + ?Sized>(
        &mut self,
        source: &mut B,
        format: StreamFormat,
    ) -> Result<()> {
        crate::json::parse_into(self, source, format)
    }

    /// Parse a SenML JSON document held in memory
    #[cfg(feature = "json")]
    pub fn from_json_str(&mut self, json: &str) -> Result<()> {
        let mut source = crate::io::SliceSource::new(json.as_bytes());
        self.from_json(&mut source, StreamFormat::Raw)
    }

    /// Render this pack as a SenML CBOR array into `sink`
    #[cfg(feature = "cbor")]
    pub fn write_cbor<S: ByteSink + ?Sized>(
        &self,
        sink: &mut S,
        format: StreamFormat,
    ) -> Result<()> {
        crate::cbor::write_pack(self, sink, format)
    }

    /// Render this pack as SenML CBOR bytes
    #[cfg(feature = "cbor")]
    pub fn to_cbor(&self) -> Result<Vec<u8>> {
        let mut out: Vec<u8> = Vec::new();
        self.write_cbor(&mut out, StreamFormat::Raw)?;
        Ok(out)
    }

    /// Parse a SenML CBOR document from `source`
    #[cfg(feature = "cbor")]
    pub fn from_cbor<B: ByteSource + ?Sized>(
        &mut self,
        source: &mut B,
        format: StreamFormat,
    ) -> Result<()> {
        crate::cbor::parse_into(self, source, format)
    }

    /// Parse a SenML CBOR document held in memory
    #[cfg(feature = "cbor")]
    pub fn from_cbor_slice(&mut self, bytes: &[u8]) -> Result<()> {
        let mut source = crate::io::SliceSource::new(bytes);
        self.from_cbor(&mut source, StreamFormat::Raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_pack() {
        let pack = SenMLPack::new("dev1");
        assert!(pack.is_empty());
        assert_eq!(pack.array_length(), 1);
        assert_eq!(pack.field_length(), 1);
    }

    #[test]
    fn test_add_and_len() {
        let mut pack = SenMLPack::new("dev1");
        pack.add(SenMLRecord::with_value("temp", 22.5));
        pack.add(SenMLRecord::with_value("humidity", 45.0));
        assert_eq!(pack.len(), 2);
    }

    #[test]
    fn test_clear_is_idempotent() {
        let mut pack = SenMLPack::new("dev1");
        pack.clear();
        pack.clear();
        assert!(pack.is_empty());

        let mut child = SenMLPack::new("child");
        child.add(SenMLRecord::with_value("t", 1.0));
        pack.add(child);
        pack.add(SenMLRecord::with_value("temp", 22.5));
        pack.clear();
        assert!(pack.is_empty());
        pack.clear();
        assert!(pack.is_empty());
    }

    #[test]
    fn test_base_time_cascade() {
        let mut pack = SenMLPack::new("dev1");
        pack.set_base_time(10.0);
        pack.add(SenMLRecord::with_value("temp", 22.5).with_time(5.0));

        // absolute time is 15.0; after the move it must stay 15.0
        pack.set_base_time(12.0);
        let child = pack.children()[0].as_record().unwrap();
        assert_eq!(child.time, Some(3.0));
    }

    #[test]
    fn test_base_time_cascade_recurses_into_unanchored_pack() {
        let mut inner = SenMLPack::new("inner");
        inner.add(SenMLRecord::with_value("t", 1.0).with_time(4.0));
        let mut pack = SenMLPack::new("dev1").with_base_time(0.0);
        pack.add(inner);

        pack.set_base_time(1.0);
        let inner = pack.children()[0].as_pack().unwrap();
        assert_eq!(inner.children()[0].as_record().unwrap().time, Some(3.0));
    }

    #[test]
    fn test_array_length_inlines_first_leaf() {
        let mut pack = SenMLPack::new("dev1");
        pack.add(SenMLRecord::with_value("a", 1.0));
        pack.add(SenMLRecord::with_value("b", 2.0));
        pack.add(SenMLRecord::with_value("c", 3.0));
        assert_eq!(pack.array_length(), 3);
    }

    #[test]
    fn test_array_length_with_pack_first() {
        let mut inner = SenMLPack::new("inner");
        inner.add(SenMLRecord::with_value("t", 1.0));
        let mut pack = SenMLPack::new("dev1");
        pack.add(inner);
        // the nested pack cannot inline, so both objects render
        assert_eq!(pack.array_length(), 2);
    }

    #[test]
    fn test_field_length() {
        let mut pack = SenMLPack::new("dev1").with_base_time(1.0);
        pack.add(
            SenMLRecord::with_value("temp", 22.5).with_unit(crate::SenMLUnit::Celsius),
        );
        // bn + bt + inlined (n, u, v)
        assert_eq!(pack.field_length(), 5);
    }

    #[test]
    fn test_find_record_by_full_name() {
        let mut inner = SenMLPack::new("gw/");
        inner.add(SenMLRecord::with_value("door", 0.0));
        let mut pack = SenMLPack::new("dev1/");
        pack.add(SenMLRecord::with_value("temp", 22.5));
        pack.add(inner);

        assert!(pack.find_record_mut("dev1/temp").is_some());
        assert!(pack.find_record_mut("gw/door").is_some());
        assert!(pack.find_record_mut("dev1/door").is_none());
    }
}
