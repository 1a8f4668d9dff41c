use crate::settings::AppConfig;
use chrono::{DateTime, Utc};
use core_types::{FixedExpenses, ProcessingLimits};
use serde::Serialize;
use std::sync::{PoisonError, RwLock};

/// A setting value together with the version that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Versioned<T> {
    pub version: u64,
    pub updated_at: DateTime<Utc>,
    pub value: T,
}

#[derive(Debug)]
struct SlotState<T> {
    current: Option<Versioned<T>>,
    last_version: u64,
}

/// A single named setting. Writes replace the whole value and bump the version;
/// versions keep increasing across clears.
#[derive(Debug)]
pub struct SettingSlot<T> {
    name: &'static str,
    state: RwLock<SlotState<T>>,
}

impl<T: Clone> SettingSlot<T> {
    fn new(name: &'static str) -> Self {
        Self {
            name,
            state: RwLock::new(SlotState {
                current: None,
                last_version: 0,
            }),
        }
    }

    pub fn get(&self) -> Option<Versioned<T>> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .current
            .clone()
    }

    pub fn replace(&self, value: T) -> Versioned<T> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.last_version += 1;
        let entry = Versioned {
            version: state.last_version,
            updated_at: Utc::now(),
            value,
        };
        state.current = Some(entry.clone());
        tracing::info!(setting = self.name, version = entry.version, "Setting replaced.");
        entry
    }

    /// Removes the value. Returns whether there was one.
    pub fn clear(&self) -> bool {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let existed = state.current.take().is_some();
        if existed {
            tracing::info!(setting = self.name, "Setting cleared.");
        }
        existed
    }
}

/// Process-wide settings: the default expenses pre-filled into new records and the
/// limits processing days are judged against.
#[derive(Debug)]
pub struct SettingsRegistry {
    pub default_expenses: SettingSlot<FixedExpenses>,
    pub limits: SettingSlot<ProcessingLimits>,
}

impl Default for SettingsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingsRegistry {
    pub fn new() -> Self {
        Self {
            default_expenses: SettingSlot::new("default_expenses"),
            limits: SettingSlot::new("limits"),
        }
    }

    /// Seeds the registry from the `[default_expenses]` and `[limits]` tables.
    pub fn from_config(config: &AppConfig) -> Self {
        let registry = Self::new();
        if let Some(expenses) = &config.default_expenses {
            registry.default_expenses.replace(expenses.clone());
        }
        if let Some(limits) = &config.limits {
            registry.limits.replace(limits.clone());
        }
        registry
    }

    /// The configured limits, or the built-in defaults when none are set.
    pub fn effective_limits(&self) -> ProcessingLimits {
        self.limits.get().map(|v| v.value).unwrap_or_default()
    }
}
