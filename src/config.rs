// Tue Jan 13 2026 - Alex

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotConfig {
    /// Nodes walked per loader list before the walk gives up.
    pub loader_list_node_cap: usize,
    /// Environment block ceiling, in UTF-16 units.
    pub environment_block_max_units: usize,
    pub unloaded_module_max_entries: u32,
    /// Bytes captured around each pointer found in registers or on the stack.
    pub indirect_memory_window: u64,
    pub max_stack_bytes: u64,
    /// Upper bound on the deduplicated extra memory pool.
    pub max_extra_memory_bytes: u64,
    pub capture_handles: bool,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            loader_list_node_cap: 1024,
            environment_block_max_units: 32768,
            unloaded_module_max_entries: 64,
            indirect_memory_window: 512,
            max_stack_bytes: 1024 * 1024,
            max_extra_memory_bytes: 64 * 1024 * 1024,
            capture_handles: true,
        }
    }
}

impl SnapshotConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a JSON config. Missing fields take their defaults.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate().map_err(anyhow::Error::msg)?;
        Ok(config)
    }

    pub fn with_loader_list_node_cap(mut self, cap: usize) -> Self {
        self.loader_list_node_cap = cap;
        self
    }

    pub fn with_max_stack_bytes(mut self, bytes: u64) -> Self {
        self.max_stack_bytes = bytes;
        self
    }

    pub fn with_max_extra_memory_bytes(mut self, bytes: u64) -> Self {
        self.max_extra_memory_bytes = bytes;
        self
    }

    pub fn with_capture_handles(mut self, capture: bool) -> Self {
        self.capture_handles = capture;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.loader_list_node_cap == 0 {
            return Err("loader_list_node_cap must be greater than 0".to_string());
        }
        if self.environment_block_max_units < 2 {
            return Err("environment_block_max_units must be at least 2".to_string());
        }
        if self.indirect_memory_window == 0 {
            return Err("indirect_memory_window must be greater than 0".to_string());
        }
        if self.max_stack_bytes == 0 {
            return Err("max_stack_bytes must be greater than 0".to_string());
        }
        Ok(())
    }
}
