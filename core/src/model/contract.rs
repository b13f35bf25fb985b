use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::types::DataType;
use crate::error::ModelError;

fn default_required() -> bool {
    true
}

/// A declared input of a task contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputSpec {
    pub name: String,
    pub data_type: DataType,
    #[serde(default = "default_required")]
    pub required: bool,
    #[serde(default)]
    pub validation_rules: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example_value: Option<String>,
    #[serde(default)]
    pub description: String,
}

impl InputSpec {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            required: true,
            validation_rules: Vec::new(),
            example_value: None,
            description: String::new(),
        }
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn with_rules<I, S>(mut self, rules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.validation_rules = rules.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// A declared output of a task contract. Every declared output is expected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputSpec {
    pub name: String,
    pub data_type: DataType,
    #[serde(default)]
    pub validation_rules: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example_value: Option<String>,
    #[serde(default)]
    pub description: String,
}

impl OutputSpec {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            validation_rules: Vec::new(),
            example_value: None,
            description: String::new(),
        }
    }

    pub fn with_rules<I, S>(mut self, rules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.validation_rules = rules.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Input/output contract of a task.
///
/// Pre/postconditions and side effects are free text; they are carried into the
/// formal export but never parsed.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Contract {
    #[serde(default)]
    pub task_id: String,
    #[serde(default)]
    pub inputs: Vec<InputSpec>,
    #[serde(default)]
    pub outputs: Vec<OutputSpec>,
    #[serde(default)]
    pub preconditions: Vec<String>,
    #[serde(default)]
    pub postconditions: Vec<String>,
    #[serde(default)]
    pub side_effects: Vec<String>,
}

impl Contract {
    pub fn new(task_id: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            ..Self::default()
        }
    }

    pub fn input(&self, name: &str) -> Option<&InputSpec> {
        self.inputs.iter().find(|i| i.name == name)
    }

    pub fn output(&self, name: &str) -> Option<&OutputSpec> {
        self.outputs.iter().find(|o| o.name == name)
    }

    /// Input and output names must each be unique within their list.
    pub(crate) fn check_unique_names(&self, task_id: &str) -> Result<(), ModelError> {
        if let Some(name) = first_duplicate(self.inputs.iter().map(|i| i.name.as_str())) {
            return Err(ModelError::DuplicateSpecName {
                task_id: task_id.to_string(),
                kind: "input",
                name,
            });
        }

        if let Some(name) = first_duplicate(self.outputs.iter().map(|o| o.name.as_str())) {
            return Err(ModelError::DuplicateSpecName {
                task_id: task_id.to_string(),
                kind: "output",
                name,
            });
        }

        Ok(())
    }
}

fn first_duplicate<'a>(names: impl Iterator<Item = &'a str>) -> Option<String> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Some(name.to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_defaults_to_required_when_deserialized() {
        let spec: InputSpec =
            serde_json::from_str(r#"{"name":"user_id","data_type":"integer"}"#).unwrap();
        assert!(spec.required);
        assert!(spec.validation_rules.is_empty());
    }

    #[test]
    fn test_duplicate_output_name_detected() {
        let mut contract = Contract::new("t1");
        contract.outputs.push(OutputSpec::new("report", DataType::String));
        contract.outputs.push(OutputSpec::new("report", DataType::Json));

        let err = contract.check_unique_names("t1").unwrap_err();
        assert_eq!(
            err,
            ModelError::DuplicateSpecName {
                task_id: "t1".into(),
                kind: "output",
                name: "report".into(),
            }
        );
    }
}
