//! Parse-side record resolution, shared by the JSON and CBOR parsers
//!
//! Both parsers accumulate the fields of one wire object/map into a
//! [`PendingRecord`] and hand it to the [`Resolver`], which locates the
//! matching record in the caller's tree and applies the fields. Resolution is
//! best-effort: anything that cannot be matched is logged and skipped, never
//! fatal.

use tracing::debug;

use crate::pack::SenMLPack;
use crate::record::{IncomingData, SenMLRecord};
use crate::unit::SenMLUnit;

/// A value as it came off the wire, before it is applied to a record
#[derive(Debug)]
pub(crate) enum PendingValue {
    Number(f64),
    Bool(bool),
    Text(String),
    /// `vd` with JSON framing: still base64 text
    DataBase64(String),
    /// `vd` with CBOR framing: native bytes
    DataRaw(Vec<u8>),
    Sum(f64),
}

/// Field accumulator for one wire object/map
#[derive(Debug, Default)]
pub(crate) struct PendingRecord {
    pub base_name: Option<String>,
    pub base_unit: Option<String>,
    pub base_time: Option<f64>,
    pub base_sum: Option<f64>,
    pub name: Option<String>,
    pub unit: Option<String>,
    pub time: Option<f64>,
    pub value: Option<PendingValue>,
}

impl PendingRecord {
    pub fn is_empty(&self) -> bool {
        self.base_name.is_none()
            && self.base_unit.is_none()
            && self.base_time.is_none()
            && self.base_sum.is_none()
            && self.name.is_none()
            && self.unit.is_none()
            && self.time.is_none()
            && self.value.is_none()
    }
}

/// Applies completed wire objects to a pack tree
///
/// Tracks the base name across objects, since base fields persist from one
/// wire object to the next until overridden.
#[derive(Debug, Default)]
pub(crate) struct Resolver {
    current_base: String,
}

impl Resolver {
    pub fn new(root: &SenMLPack) -> Self {
        Self {
            current_base: root.base_name.clone(),
        }
    }

    /// Apply one completed wire object to the tree
    ///
    /// Base fields may arrive without a `bn` in the same object; they then
    /// belong to whichever base name is currently in effect.
    pub fn apply(&mut self, root: &mut SenMLPack, pending: PendingRecord) {
        let has_base_fields = pending.base_name.is_some()
            || pending.base_unit.is_some()
            || pending.base_time.is_some()
            || pending.base_sum.is_some();
        if let Some(bn) = pending.base_name {
            self.current_base = bn;
        }
        if has_base_fields {
            match root.find_pack_mut(&self.current_base) {
                Some(pack) => {
                    if let Some(bu) = &pending.base_unit {
                        match SenMLUnit::from_symbol(bu) {
                            Some(unit) => pack.base_unit = Some(unit),
                            None => debug!(unit = %bu, "skipping unknown base unit"),
                        }
                    }
                    if let Some(bt) = pending.base_time {
                        // Incoming record times are already offsets from the
                        // incoming base, so no cascade here.
                        pack.base_time = Some(bt);
                    }
                    if let Some(bs) = pending.base_sum {
                        pack.base_sum = Some(bs);
                    }
                }
                None => debug!(base_name = %self.current_base, "no pack matches base name"),
            }
        }

        if pending.name.is_none() && pending.value.is_none() {
            return; // base-only object, nothing further to resolve
        }

        let name = pending.name.as_deref().unwrap_or("");
        let record = self.locate(root, name);
        let Some(record) = record else {
            debug!(
                base_name = %self.current_base,
                name = %name,
                "no record matches incoming name, skipping"
            );
            return;
        };

        if let Some(u) = &pending.unit {
            match SenMLUnit::from_symbol(u) {
                Some(unit) => record.unit = Some(unit),
                None => debug!(unit = %u, "skipping unknown unit"),
            }
        }
        if let Some(t) = pending.time {
            record.time = Some(t);
        }
        match pending.value {
            Some(PendingValue::Number(v)) => record.set_value(v),
            Some(PendingValue::Bool(v)) => record.set_bool(v),
            Some(PendingValue::Text(v)) => record.set_string(v),
            Some(PendingValue::Sum(v)) => record.set_sum(v),
            Some(PendingValue::DataBase64(v)) => record.actuate(IncomingData::Base64(&v)),
            Some(PendingValue::DataRaw(v)) => record.actuate(IncomingData::Raw(&v)),
            None => {}
        }
    }

    /// Resolve a bare record name within the current pack, falling back to a
    /// whole-tree search on the concatenated full name
    fn locate<'a>(&self, root: &'a mut SenMLPack, name: &str) -> Option<&'a mut SenMLRecord> {
        let in_current = root
            .find_pack_mut(&self.current_base)
            .and_then(|p| p.find_child_record_mut(name))
            .is_some();
        if in_current {
            return root
                .find_pack_mut(&self.current_base)
                .and_then(|p| p.find_child_record_mut(name));
        }
        let full_name = format!("{}{}", self.current_base, name);
        root.find_record_mut(&full_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending_value(name: &str, v: f64) -> PendingRecord {
        PendingRecord {
            name: Some(name.to_string()),
            value: Some(PendingValue::Number(v)),
            ..Default::default()
        }
    }

    #[test]
    fn test_apply_sets_value_on_matching_record() {
        let mut pack = SenMLPack::new("dev1");
        pack.add(SenMLRecord::new("temp"));

        let mut resolver = Resolver::new(&pack);
        resolver.apply(&mut pack, pending_value("temp", 20.5));

        let record = pack.children()[0].as_record().unwrap();
        assert_eq!(
            record.value,
            crate::SenMLValue::Float {
                value: 20.5,
                precision: None
            }
        );
    }

    #[test]
    fn test_apply_base_fields_update_pack() {
        let mut pack = SenMLPack::new("dev1");
        let mut resolver = Resolver::new(&pack);
        resolver.apply(
            &mut pack,
            PendingRecord {
                base_name: Some("dev1".to_string()),
                base_unit: Some("Cel".to_string()),
                base_time: Some(4.5),
                ..Default::default()
            },
        );
        assert_eq!(pack.base_unit, Some(SenMLUnit::Celsius));
        assert_eq!(pack.base_time(), Some(4.5));
    }

    #[test]
    fn test_base_fields_without_base_name_use_current_pack() {
        let mut pack = SenMLPack::new("dev1");
        pack.add(SenMLRecord::new("temp"));

        let mut resolver = Resolver::new(&pack);
        resolver.apply(
            &mut pack,
            PendingRecord {
                base_unit: Some("Cel".to_string()),
                base_time: Some(2.0),
                ..Default::default()
            },
        );

        assert_eq!(pack.base_unit, Some(SenMLUnit::Celsius));
        assert_eq!(pack.base_time(), Some(2.0));
    }

    #[test]
    fn test_base_name_switches_current_pack() {
        let mut child = SenMLPack::new("gw/");
        child.add(SenMLRecord::new("door"));
        let mut pack = SenMLPack::new("dev1/");
        pack.add(child);

        let mut resolver = Resolver::new(&pack);
        resolver.apply(
            &mut pack,
            PendingRecord {
                base_name: Some("gw/".to_string()),
                ..Default::default()
            },
        );
        resolver.apply(&mut pack, pending_value("door", 1.0));

        let child = pack.children()[0].as_pack().unwrap();
        let door = child.children()[0].as_record().unwrap();
        assert!(door.has_value());
    }

    #[test]
    fn test_unmatched_name_is_skipped() {
        let mut pack = SenMLPack::new("dev1");
        pack.add(SenMLRecord::new("temp"));

        let mut resolver = Resolver::new(&pack);
        resolver.apply(&mut pack, pending_value("pressure", 1013.0));

        let record = pack.children()[0].as_record().unwrap();
        assert!(!record.has_value());
    }

    #[test]
    fn test_unknown_unit_is_skipped() {
        let mut pack = SenMLPack::new("dev1");
        pack.add(SenMLRecord::new("temp"));

        let mut resolver = Resolver::new(&pack);
        let mut pending = pending_value("temp", 1.0);
        pending.unit = Some("parsec".to_string());
        resolver.apply(&mut pack, pending);

        let record = pack.children()[0].as_record().unwrap();
        assert_eq!(record.unit, None);
        assert!(record.has_value());
    }
}
