//! Closed enumerations shared by the validator, scheduler and emitter.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Bumped whenever a `DataType` variant is added or its predicate changes.
pub const DATA_TYPE_SCHEMA_VERSION: u32 = 1;

/// Declared data type of a contract input or output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    String,
    Integer,
    Float,
    Boolean,
    Null,
    Json,
    Array,
    Object,
    File,
    Url,
    Email,
    Uuid,
    Datetime,
    DatabaseRecord,
    Binary,
    Percentage,
    Token,
    Password,
    VersionNumber,
}

impl DataType {
    pub const ALL: [DataType; 19] = [
        DataType::String,
        DataType::Integer,
        DataType::Float,
        DataType::Boolean,
        DataType::Null,
        DataType::Json,
        DataType::Array,
        DataType::Object,
        DataType::File,
        DataType::Url,
        DataType::Email,
        DataType::Uuid,
        DataType::Datetime,
        DataType::DatabaseRecord,
        DataType::Binary,
        DataType::Percentage,
        DataType::Token,
        DataType::Password,
        DataType::VersionNumber,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DataType::String => "string",
            DataType::Integer => "integer",
            DataType::Float => "float",
            DataType::Boolean => "boolean",
            DataType::Null => "null",
            DataType::Json => "json",
            DataType::Array => "array",
            DataType::Object => "object",
            DataType::File => "file",
            DataType::Url => "url",
            DataType::Email => "email",
            DataType::Uuid => "uuid",
            DataType::Datetime => "datetime",
            DataType::DatabaseRecord => "database_record",
            DataType::Binary => "binary",
            DataType::Percentage => "percentage",
            DataType::Token => "token",
            DataType::Password => "password",
            DataType::VersionNumber => "version_number",
        }
    }

    /// Grouping used when listing the available types.
    pub fn category(self) -> &'static str {
        match self {
            DataType::String
            | DataType::Integer
            | DataType::Float
            | DataType::Boolean
            | DataType::Null => "Primitive Types",
            DataType::Json | DataType::Array | DataType::Object => "Structured Data",
            DataType::File | DataType::Binary => "Files",
            DataType::Url | DataType::Email | DataType::Uuid => "Network",
            DataType::Datetime => "Date & Time",
            DataType::DatabaseRecord => "Database",
            DataType::Percentage => "Measurement",
            DataType::Token | DataType::Password => "Security",
            DataType::VersionNumber => "Other",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        DataType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == wanted)
            .ok_or_else(|| format!("unknown data type: {s}"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    Developer,
    Qa,
    Designer,
    Database,
    Cache,
    MessageQueue,
    Storage,
    Compute,
    Gpu,
    Container,
    Network,
    ApiEndpoint,
    FileSystem,
    ThirdPartyApi,
    ExternalService,
    Other,
}

impl ResourceType {
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceType::Developer => "developer",
            ResourceType::Qa => "qa",
            ResourceType::Designer => "designer",
            ResourceType::Database => "database",
            ResourceType::Cache => "cache",
            ResourceType::MessageQueue => "message_queue",
            ResourceType::Storage => "storage",
            ResourceType::Compute => "compute",
            ResourceType::Gpu => "gpu",
            ResourceType::Container => "container",
            ResourceType::Network => "network",
            ResourceType::ApiEndpoint => "api_endpoint",
            ResourceType::FileSystem => "file_system",
            ResourceType::ThirdPartyApi => "third_party_api",
            ResourceType::ExternalService => "external_service",
            ResourceType::Other => "other",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    Ready,
    InProgress,
    Completed,
    Failed,
    /// A dependency failed; stays here until cleared externally.
    Blocked,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 6] = [
        TaskStatus::Pending,
        TaskStatus::Ready,
        TaskStatus::InProgress,
        TaskStatus::Completed,
        TaskStatus::Failed,
        TaskStatus::Blocked,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Ready => "ready",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
            TaskStatus::Blocked => "blocked",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        TaskStatus::ALL
            .iter()
            .copied()
            .find(|st| st.as_str() == wanted)
            .ok_or_else(|| format!("unknown task status: {s}"))
    }
}
