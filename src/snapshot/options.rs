// Fri Oct 16 2026 - Alex

use serde::{Deserialize, Serialize};

/// A crash-policy flag a module may or may not express an opinion on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriState {
    #[default]
    Unset,
    Enabled,
    Disabled,
}

impl TriState {
    /// Decodes the on-target byte. Values other than 1 and 2 read as unset.
    pub fn from_byte(value: u8) -> Self {
        match value {
            1 => TriState::Enabled,
            2 => TriState::Disabled,
            _ => TriState::Unset,
        }
    }

    pub fn is_set(self) -> bool {
        self != TriState::Unset
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrashpadOptions {
    pub crashpad_handler_behavior: TriState,
    pub system_crash_reporter_forwarding: TriState,
    pub gather_indirectly_referenced_memory: TriState,
    /// Byte cap for indirectly referenced memory. Only meaningful alongside
    /// `gather_indirectly_referenced_memory`.
    pub indirectly_referenced_memory_cap: u32,
}

impl CrashpadOptions {
    pub fn is_resolved(&self) -> bool {
        self.crashpad_handler_behavior.is_set()
            && self.system_crash_reporter_forwarding.is_set()
            && self.gather_indirectly_referenced_memory.is_set()
    }

    /// Fills every field that is still unset from `other`. The memory cap is
    /// taken together with the gathering flag.
    pub fn merge_from(&mut self, other: &CrashpadOptions) {
        if !self.crashpad_handler_behavior.is_set() {
            self.crashpad_handler_behavior = other.crashpad_handler_behavior;
        }
        if !self.system_crash_reporter_forwarding.is_set() {
            self.system_crash_reporter_forwarding = other.system_crash_reporter_forwarding;
        }
        if !self.gather_indirectly_referenced_memory.is_set() {
            self.gather_indirectly_referenced_memory = other.gather_indirectly_referenced_memory;
            self.indirectly_referenced_memory_cap = other.indirectly_referenced_memory_cap;
        }
    }

    /// The byte budget for the thread phase, if gathering is enabled.
    pub fn memory_budget(&self) -> Option<u32> {
        (self.gather_indirectly_referenced_memory == TriState::Enabled)
            .then_some(self.indirectly_referenced_memory_cap)
    }
}

/// Merges per-module options in module order. The first module to set a
/// field wins it, and the scan ends once all three flags are set.
pub fn aggregate<'a, I>(modules: I) -> CrashpadOptions
where
    I: IntoIterator<Item = &'a CrashpadOptions>,
{
    let mut options = CrashpadOptions::default();
    for module in modules {
        options.merge_from(module);
        if options.is_resolved() {
            break;
        }
    }
    options
}
