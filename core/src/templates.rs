//! Reusable task templates.

use std::collections::BTreeMap;
use std::path::Path;

use crate::error::StoreError;
use crate::model::{Contract, DataType, InputSpec, OutputSpec, Task, TaskStatus};

#[derive(Debug, Clone)]
pub struct TemplateCatalog {
    templates: BTreeMap<String, Task>,
}

impl Default for TemplateCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl TemplateCatalog {
    pub fn empty() -> Self {
        Self {
            templates: BTreeMap::new(),
        }
    }

    /// Catalog holding `data_processing` and `api_call`.
    pub fn builtin() -> Self {
        let mut catalog = Self::empty();
        catalog.templates.insert("data_processing".into(), data_processing());
        catalog.templates.insert("api_call".into(), api_call());
        catalog
    }

    /// Merge templates from a JSON object of template id -> task. Returns how many were added.
    pub fn load_file(&mut self, path: &Path) -> Result<usize, StoreError> {
        let raw = std::fs::read_to_string(path)?;
        let loaded: BTreeMap<String, Task> = serde_json::from_str(&raw)?;
        let count = loaded.len();
        for (id, task) in loaded {
            self.insert(id, task)?;
        }
        tracing::debug!(path = %path.display(), count, "templates loaded");
        Ok(count)
    }

    pub fn insert(&mut self, template_id: impl Into<String>, mut task: Task) -> Result<(), StoreError> {
        task.link_contract();
        task.validate()?;
        self.templates.insert(template_id.into(), task);
        Ok(())
    }

    pub fn get(&self, template_id: &str) -> Option<&Task> {
        self.templates.get(template_id)
    }

    pub fn ids(&self) -> Vec<&str> {
        self.templates.keys().map(String::as_str).collect()
    }

    /// Copy a template under a new id (generated when `new_id` is `None`),
    /// relinking its contract and resetting it to `pending`.
    pub fn instantiate(&self, template_id: &str, new_id: Option<&str>) -> Result<Task, StoreError> {
        let template = self
            .get(template_id)
            .ok_or_else(|| StoreError::NotFound(format!("template {template_id}")))?;

        let id = match new_id {
            Some(id) => id.to_string(),
            None => {
                let suffix = uuid::Uuid::new_v4().simple().to_string();
                format!("{template_id}_{}", &suffix[..8])
            }
        };

        let mut task = template.clone();
        task.id = id.clone();
        task.contract.task_id = id;
        task.status = TaskStatus::Pending;
        task.generated_code = None;
        task.validate()?;
        Ok(task)
    }
}

fn data_processing() -> Task {
    let id = "data_processing_template";
    let mut contract = Contract::new(id);
    contract.inputs = vec![InputSpec::new("input_data", DataType::Json)
        .with_rules(["not empty"])
        .with_description("Data to process")];
    contract.outputs =
        vec![OutputSpec::new("processed_data", DataType::Json).with_description("Processed data result")];
    contract.preconditions = vec!["Input data must be valid JSON".into()];
    contract.postconditions = vec!["Output contains processed data".into()];

    template_task(id, "Process Data", "Generic data processing task", contract)
}

fn api_call() -> Task {
    let id = "api_call_template";
    let mut contract = Contract::new(id);
    contract.inputs = vec![
        InputSpec::new("url", DataType::Url)
            .with_rules(["not empty", "starts with http"])
            .with_description("API endpoint URL"),
        InputSpec::new("method", DataType::String)
            .with_rules(["in GET,POST,PUT,DELETE"])
            .with_description("HTTP method"),
        InputSpec::new("headers", DataType::Json)
            .optional()
            .with_description("HTTP headers"),
        InputSpec::new("body", DataType::Json)
            .optional()
            .with_description("Request body"),
    ];
    contract.outputs = vec![
        OutputSpec::new("response", DataType::Json).with_description("API response"),
        OutputSpec::new("status_code", DataType::Integer).with_description("HTTP status code"),
    ];
    contract.preconditions = vec!["URL must be accessible".into()];
    contract.postconditions = vec!["Response contains API result".into()];

    template_task(id, "Call External API", "Make a request to an external API", contract)
}

fn template_task(id: &str, name: &str, description: &str, contract: Contract) -> Task {
    Task {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        duration_hours: 1,
        dependencies: Vec::new(),
        required_resources: Vec::new(),
        status: TaskStatus::Pending,
        contract,
        generated_code: None,
        execution_environment: "python".to_string(),
    }
}
