//! Contract validator.
//!
//! Checks concrete values against a task's declared inputs and outputs. Every
//! function here is pure: contract mismatches come back as `Violation`s and
//! never as errors.

pub mod rules;
pub mod types;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

use crate::model::{DataType, PlanningState, Task};

pub use rules::Rule;
pub use types::matches_type;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    MissingInput,
    MissingOutput,
    WrongType,
    RuleFailed,
    UnsupportedRule,
    ContractIntegrity,
}

/// One contract mismatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub task_id: String,
    /// Input/output name the violation concerns; empty for whole-contract issues.
    pub field: String,
    pub kind: ViolationKind,
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

#[derive(Clone, Copy)]
enum Side {
    Input,
    Output,
}

impl Side {
    fn label(self) -> &'static str {
        match self {
            Side::Input => "Input",
            Side::Output => "Output",
        }
    }

    fn missing_kind(self) -> ViolationKind {
        match self {
            Side::Input => ViolationKind::MissingInput,
            Side::Output => ViolationKind::MissingOutput,
        }
    }
}

struct FieldSpec<'a> {
    name: &'a str,
    data_type: DataType,
    required: bool,
    rules: &'a [String],
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ContractValidator {
    /// Report rules outside the grammar instead of letting them pass.
    pub strict_rules: bool,
}

impl ContractValidator {
    pub fn new(strict_rules: bool) -> Self {
        Self { strict_rules }
    }

    pub fn validate_inputs(&self, task: &Task, inputs: &Map<String, Value>) -> Vec<Violation> {
        let specs = task.contract.inputs.iter().map(|s| FieldSpec {
            name: &s.name,
            data_type: s.data_type,
            required: s.required,
            rules: &s.validation_rules,
        });
        self.check_fields(&task.id, Side::Input, specs, inputs)
    }

    /// Every declared output is required.
    pub fn validate_outputs(&self, task: &Task, outputs: &Map<String, Value>) -> Vec<Violation> {
        let specs = task.contract.outputs.iter().map(|s| FieldSpec {
            name: &s.name,
            data_type: s.data_type,
            required: true,
            rules: &s.validation_rules,
        });
        self.check_fields(&task.id, Side::Output, specs, outputs)
    }

    /// Structural check for tasks that may have been edited after construction.
    pub fn check_contract(&self, task: &Task) -> Vec<Violation> {
        match task.validate() {
            Ok(()) => Vec::new(),
            Err(err) => vec![Violation {
                task_id: task.id.clone(),
                field: String::new(),
                kind: ViolationKind::ContractIntegrity,
                message: err.to_string(),
            }],
        }
    }

    /// Validate every task of `state` against an empty input map.
    pub fn audit(&self, state: &PlanningState) -> BTreeMap<String, Vec<Violation>> {
        let empty = Map::new();
        state
            .tasks()
            .map(|task| {
                let mut found = self.check_contract(task);
                found.extend(self.validate_inputs(task, &empty));
                (task.id.clone(), found)
            })
            .collect()
    }

    pub fn is_execution_ready(report: &BTreeMap<String, Vec<Violation>>) -> bool {
        report.values().all(Vec::is_empty)
    }

    fn check_fields<'a>(
        &self,
        task_id: &str,
        side: Side,
        specs: impl Iterator<Item = FieldSpec<'a>>,
        values: &Map<String, Value>,
    ) -> Vec<Violation> {
        let mut found = Vec::new();
        let label = side.label();

        for spec in specs {
            let violation = |kind, message| Violation {
                task_id: task_id.to_string(),
                field: spec.name.to_string(),
                kind,
                message,
            };

            let Some(value) = values.get(spec.name) else {
                if spec.required {
                    found.push(violation(
                        side.missing_kind(),
                        format!("Required {} '{}' missing for task {task_id}", label.to_lowercase(), spec.name),
                    ));
                }
                continue;
            };

            if !matches_type(spec.data_type, value) {
                found.push(violation(
                    ViolationKind::WrongType,
                    format!("{label} '{}' has wrong type. Expected {}", spec.name, spec.data_type),
                ));
            }

            for text in spec.rules {
                let rule = Rule::parse(text);
                match rule.check(value) {
                    Some(true) => {}
                    Some(false) => found.push(violation(
                        ViolationKind::RuleFailed,
                        format!("{label} '{}' failed validation rule: {text}", spec.name),
                    )),
                    None if self.strict_rules => found.push(violation(
                        ViolationKind::UnsupportedRule,
                        format!("{label} '{}' has unsupported validation rule: {text}", spec.name),
                    )),
                    None => {
                        tracing::debug!(task_id, field = spec.name, rule = %text, "advisory rule skipped");
                    }
                }
            }
        }

        if !found.is_empty() {
            tracing::warn!(task_id, count = found.len(), side = label, "contract violations");
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Contract, InputSpec, OutputSpec};
    use serde_json::json;

    fn signup_task() -> Task {
        let mut contract = Contract::new("signup");
        contract.inputs = vec![
            InputSpec::new("email", DataType::Email),
            InputSpec::new("password", DataType::Password)
                .with_rules(["length > 8", "password length > 8"]),
            InputSpec::new("referrer", DataType::String).optional(),
        ];
        contract.outputs = vec![OutputSpec::new("user_id", DataType::Integer).with_rules(["positive"])];
        Task::new("signup", "Signup", 2, contract).unwrap()
    }

    fn map(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_missing_required_input_reported_once() {
        let task = signup_task();
        let found = ContractValidator::default()
            .validate_inputs(&task, &map(json!({"password": "correct horse"})));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].kind, ViolationKind::MissingInput);
        assert_eq!(found[0].to_string(), "Required input 'email' missing for task signup");
    }

    #[test]
    fn test_wrong_type_and_rule_failure() {
        let task = signup_task();
        let found = ContractValidator::default()
            .validate_inputs(&task, &map(json!({"email": 5, "password": "short"})));
        let messages: Vec<String> = found.iter().map(ToString::to_string).collect();
        assert_eq!(
            messages,
            vec![
                "Input 'email' has wrong type. Expected email",
                "Input 'password' failed validation rule: length > 8",
            ]
        );
    }

    #[test]
    fn test_strict_mode_reports_unrecognized_rules() {
        let task = signup_task();
        let inputs = map(json!({"email": "a@b.io", "password": "long enough pw"}));
        assert!(ContractValidator::new(false).validate_inputs(&task, &inputs).is_empty());

        let found = ContractValidator::new(true).validate_inputs(&task, &inputs);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].kind, ViolationKind::UnsupportedRule);
    }

    #[test]
    fn test_outputs_are_all_required() {
        let task = signup_task();
        let validator = ContractValidator::default();
        let found = validator.validate_outputs(&task, &Map::new());
        assert_eq!(found[0].to_string(), "Required output 'user_id' missing for task signup");

        let found = validator.validate_outputs(&task, &map(json!({"user_id": 0})));
        assert_eq!(found[0].to_string(), "Output 'user_id' failed validation rule: positive");
    }

    #[test]
    fn test_check_contract_flags_edited_task() {
        let mut task = signup_task();
        task.contract.task_id = "someone_else".into();
        let found = ContractValidator::default().check_contract(&task);
        assert_eq!(found[0].kind, ViolationKind::ContractIntegrity);
    }
}
