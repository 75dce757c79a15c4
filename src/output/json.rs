// Tue Jan 13 2026 - Alex

use crate::output::SnapshotSummary;
use serde_json::{json, to_string, to_string_pretty, Value};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use thiserror::Error;

pub struct JsonSerializer {
    pretty_print: bool,
    include_metadata: bool,
}

impl Default for JsonSerializer {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonSerializer {
    pub fn new() -> Self {
        Self {
            pretty_print: true,
            include_metadata: true,
        }
    }

    pub fn with_pretty_print(mut self, pretty: bool) -> Self {
        self.pretty_print = pretty;
        self
    }

    pub fn with_metadata(mut self, include: bool) -> Self {
        self.include_metadata = include;
        self
    }

    pub fn serialize(&self, summary: &SnapshotSummary) -> Result<String, JsonError> {
        let value = self.build_json_value(summary)?;
        let text = if self.pretty_print {
            to_string_pretty(&value)
        } else {
            to_string(&value)
        };
        text.map_err(|e| JsonError::SerializationError(e.to_string()))
    }

    pub fn serialize_to_file<P: AsRef<Path>>(&self, summary: &SnapshotSummary, path: P) -> Result<(), JsonError> {
        let text = self.serialize(summary)?;
        let file = File::create(path.as_ref())?;
        let mut writer = BufWriter::new(file);
        writer.write_all(text.as_bytes())?;
        writer.flush()?;
        Ok(())
    }

    fn build_json_value(&self, summary: &SnapshotSummary) -> Result<Value, JsonError> {
        let snapshot =
            serde_json::to_value(summary).map_err(|e| JsonError::SerializationError(e.to_string()))?;
        if !self.include_metadata {
            return Ok(snapshot);
        }
        Ok(json!({
            "generator": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
            "snapshot": snapshot,
        }))
    }
}

#[derive(Error, Debug)]
pub enum JsonError {
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
