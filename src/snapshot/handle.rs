// Sat Oct 17 2026 - Alex

use crate::process::HandleInfo;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandleSnapshot {
    pub handle: u32,
    pub type_name: String,
    pub object_name: String,
    pub attributes: u32,
    pub granted_access: u32,
    pub pointer_count: u32,
    pub handle_count: u32,
}

impl From<&HandleInfo> for HandleSnapshot {
    fn from(info: &HandleInfo) -> Self {
        Self {
            handle: info.handle,
            type_name: info.type_name.clone(),
            object_name: info.object_name.clone(),
            attributes: info.attributes,
            granted_access: info.granted_access,
            pointer_count: info.pointer_count,
            handle_count: info.handle_count,
        }
    }
}
