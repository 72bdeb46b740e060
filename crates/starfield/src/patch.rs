//! Runtime reconfiguration: partial patches and the cost of applying them.

use serde_json::{json, Map, Value};
use skyfx_core::error::EngineError;
use skyfx_core::params::merge_json;
use skyfx_core::particle::SizeClass;

use crate::config::{ClassProfile, StarfieldConfig};

/// What a config change costs to apply. Ordered from cheapest to most
/// expensive so combined changes take the maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ConfigChange {
    /// Nothing differs.
    Unchanged,
    /// Only render-time parameters differ; picked up on the next frame.
    Live,
    /// Core colors must be recomputed from the stored base colors.
    Brightness,
    /// Particles must be returned to the pools and generated again.
    Regenerate,
}

impl ConfigChange {
    /// Classifies the transition from `old` to `new`.
    pub fn between(old: &StarfieldConfig, new: &StarfieldConfig) -> Self {
        if old == new {
            return Self::Unchanged;
        }
        if old.reference_width != new.reference_width
            || old.reference_height != new.reference_height
            || old.distribution != new.distribution
            || old.pool_factor != new.pool_factor
            || old.palettes != new.palettes
        {
            return Self::Regenerate;
        }
        SizeClass::ALL
            .into_iter()
            .map(|class| Self::for_class(old.classes.get(class), new.classes.get(class)))
            .max()
            .map_or(Self::Live, |change| change.max(Self::Live))
    }

    fn for_class(old: &ClassProfile, new: &ClassProfile) -> Self {
        if old == new {
            Self::Unchanged
        } else if old.enabled != new.enabled
            || old.count != new.count
            || old.size != new.size
            || old.twinkle.percentage != new.twinkle.percentage
        {
            Self::Regenerate
        } else if old.brightness != new.brightness
            || old.brightness_enabled != new.brightness_enabled
            || old.white_core != new.white_core
        {
            Self::Brightness
        } else {
            Self::Live
        }
    }
}

/// A partial starfield config, merged over the current one on apply.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StarfieldPatch {
    value: Map<String, Value>,
}

impl StarfieldPatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps a JSON object. Anything else is rejected.
    pub fn from_json(value: Value) -> Result<Self, EngineError> {
        match value {
            Value::Object(value) => Ok(Self { value }),
            Value::Null => Ok(Self::default()),
            other => Err(EngineError::InvalidConfig(format!(
                "patch must be a JSON object, got {other}"
            ))),
        }
    }

    /// Sets the brightness of one class.
    pub fn brightness(self, class: SizeClass, brightness: f64) -> Self {
        self.class_field(class, "brightness", json!(brightness))
    }

    /// Sets the reference-resolution count of one class.
    pub fn count(self, class: SizeClass, count: usize) -> Self {
        self.class_field(class, "count", json!(count))
    }

    /// Enables or disables one class.
    pub fn enabled(self, class: SizeClass, enabled: bool) -> Self {
        self.class_field(class, "enabled", json!(enabled))
    }

    pub fn distribution(self, distribution: f64) -> Self {
        self.merge(json!({ "distribution": distribution }))
    }

    /// Toggles the shared starburst rays.
    pub fn starburst(self, enabled: bool) -> Self {
        self.merge(json!({ "starburst": { "enabled": enabled } }))
    }

    /// Merges an arbitrary JSON object into the patch.
    pub fn merge(mut self, more: Value) -> Self {
        let mut value = Value::Object(std::mem::take(&mut self.value));
        merge_json(&mut value, &more);
        if let Value::Object(map) = value {
            self.value = map;
        }
        self
    }

    fn class_field(self, class: SizeClass, key: &str, value: Value) -> Self {
        self.merge(json!({ "classes": { class.name(): { key: value } } }))
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// The patch as a JSON object.
    pub fn to_value(&self) -> Value {
        Value::Object(self.value.clone())
    }
}
