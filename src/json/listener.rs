//! Pack-bound listener: turns tokenizer events into tree mutations

use tracing::debug;

use crate::Result;
use crate::json::tokenizer::{JsonEvent, JsonListener};
use crate::pack::SenMLPack;
use crate::resolve::{PendingRecord, PendingValue, Resolver};

/// Accumulates one wire object at a time and applies it through the
/// [`Resolver`] when the object closes
pub(crate) struct PackListener<'a> {
    pack: &'a mut SenMLPack,
    resolver: Resolver,
    pending: PendingRecord,
    key: String,
    depth: usize,
}

impl<'a> PackListener<'a> {
    pub fn new(pack: &'a mut SenMLPack) -> Self {
        let resolver = Resolver::new(pack);
        Self {
            pack,
            resolver,
            pending: PendingRecord::default(),
            key: String::new(),
            depth: 0,
        }
    }

    fn number(&mut self, value: f64) {
        match self.key.as_str() {
            "bt" => self.pending.base_time = Some(value),
            "bs" => self.pending.base_sum = Some(value),
            "v" => self.pending.value = Some(PendingValue::Number(value)),
            "s" => self.pending.value = Some(PendingValue::Sum(value)),
            "t" => self.pending.time = Some(value),
            key => debug!(key, "skipping unknown or non-numeric key"),
        }
    }

    fn string(&mut self, value: &str) {
        match self.key.as_str() {
            "bn" => self.pending.base_name = Some(value.to_string()),
            "bu" => self.pending.base_unit = Some(value.to_string()),
            "n" => self.pending.name = Some(value.to_string()),
            "u" => self.pending.unit = Some(value.to_string()),
            "vs" => self.pending.value = Some(PendingValue::Text(value.to_string())),
            "vd" => self.pending.value = Some(PendingValue::DataBase64(value.to_string())),
            key => debug!(key, "skipping unknown or non-string key"),
        }
    }

    fn bool(&mut self, value: bool) {
        match self.key.as_str() {
            "vb" => self.pending.value = Some(PendingValue::Bool(value)),
            key => debug!(key, "skipping unknown or non-boolean key"),
        }
    }
}

impl JsonListener for PackListener<'_> {
    fn event(&mut self, event: JsonEvent<'_>) -> Result<()> {
        match event {
            JsonEvent::StartArray | JsonEvent::EndArray => {}
            JsonEvent::StartObject => {
                self.depth += 1;
                if self.depth == 1 {
                    self.pending = PendingRecord::default();
                } else {
                    debug!("nested object is not valid SenML, contents ignored");
                }
            }
            JsonEvent::EndObject => {
                if self.depth == 1 {
                    let pending = std::mem::take(&mut self.pending);
                    if !pending.is_empty() {
                        self.resolver.apply(self.pack, pending);
                    }
                }
                self.depth = self.depth.saturating_sub(1);
            }
            JsonEvent::Key(key) => {
                if self.depth == 1 {
                    key.clone_into(&mut self.key);
                } else {
                    self.key.clear();
                }
            }
            JsonEvent::Str(value) => {
                if self.depth == 1 {
                    self.string(value);
                }
            }
            JsonEvent::Number(value) => {
                if self.depth == 1 {
                    self.number(value);
                }
            }
            JsonEvent::Bool(value) => {
                if self.depth == 1 {
                    self.bool(value);
                }
            }
            JsonEvent::Null => {
                if self.depth == 1 {
                    debug!(key = %self.key, "skipping null value");
                }
            }
        }
        Ok(())
    }
}
