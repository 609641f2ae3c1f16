//! Tree nodes: a pack's child is either a leaf record or a nested pack

use crate::pack::SenMLPack;
use crate::record::SenMLRecord;

/// One child of a [`SenMLPack`]
///
/// Tree walks pattern-match on this instead of asking nodes what they are;
/// nested packs model child devices behind a gateway.
#[derive(Debug, PartialEq)]
pub enum SenMLNode {
    Record(SenMLRecord),
    Pack(SenMLPack),
}

impl SenMLNode {
    /// Leaf record view, if this node is one
    pub fn as_record(&self) -> Option<&SenMLRecord> {
        match self {
            Self::Record(r) => Some(r),
            Self::Pack(_) => None,
        }
    }

    pub fn as_record_mut(&mut self) -> Option<&mut SenMLRecord> {
        match self {
            Self::Record(r) => Some(r),
            Self::Pack(_) => None,
        }
    }

    /// Nested pack view, if this node is one
    pub fn as_pack(&self) -> Option<&SenMLPack> {
        match self {
            Self::Record(_) => None,
            Self::Pack(p) => Some(p),
        }
    }

    pub fn as_pack_mut(&mut self) -> Option<&mut SenMLPack> {
        match self {
            Self::Record(_) => None,
            Self::Pack(p) => Some(p),
        }
    }

    /// How many top-level wire array elements this node contributes
    pub fn array_length(&self) -> usize {
        match self {
            Self::Record(_) => 1,
            Self::Pack(p) => p.array_length(),
        }
    }

    pub(crate) fn adjust_to_base_time(&mut self, old_base: f64, new_base: f64) {
        match self {
            Self::Record(r) => r.adjust_to_base_time(old_base, new_base),
            // A nested pack with its own base time anchors its subtree;
            // without one it inherits the parent base and must follow it.
            Self::Pack(p) => {
                if p.base_time.is_none() {
                    for child in p.iter_mut() {
                        child.adjust_to_base_time(old_base, new_base);
                    }
                }
            }
        }
    }
}

impl From<SenMLRecord> for SenMLNode {
    fn from(record: SenMLRecord) -> Self {
        Self::Record(record)
    }
}

impl From<SenMLPack> for SenMLNode {
    fn from(pack: SenMLPack) -> Self {
        Self::Pack(pack)
    }
}
