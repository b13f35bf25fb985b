use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::types::ResourceType;
use crate::error::ModelError;

fn default_available() -> bool {
    true
}

fn default_capacity() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: String,
    pub name: String,
    pub resource_type: ResourceType,
    #[serde(default = "default_available")]
    pub available: bool,
    /// Number of tasks that may hold this resource at once.
    #[serde(default = "default_capacity")]
    pub capacity: u32,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

impl Resource {
    pub fn new(id: impl Into<String>, name: impl Into<String>, resource_type: ResourceType) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            resource_type,
            available: true,
            capacity: 1,
            properties: Map::new(),
        }
    }

    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    pub fn with_capacity(mut self, capacity: u32) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        if self.capacity == 0 {
            return Err(ModelError::InvalidCapacity(self.id.clone()));
        }
        Ok(())
    }
}
