use pactflow_core::config::AppConfig;
use pactflow_core::error::CliError;
use pactflow_core::templates::TemplateCatalog;

use crate::commands::cli::{TemplateArgs, TemplateCommand};
use crate::commands::task::open_store;
use crate::utils::print_json;

pub fn handle_template(args: TemplateArgs, cfg: &AppConfig) -> Result<i32, CliError> {
    let mut catalog = TemplateCatalog::builtin();
    if let Some(path) = args.templates.as_deref() {
        let added = catalog.load_file(path)?;
        tracing::info!(path = %path.display(), added, "extra templates loaded");
    }

    match args.command {
        TemplateCommand::List => {
            for id in catalog.ids() {
                let name = catalog.get(id).map(|t| t.name.as_str()).unwrap_or_default();
                println!("{id}\t{name}");
            }
        }
        TemplateCommand::Show { id } => {
            let task = catalog
                .get(&id)
                .ok_or_else(|| CliError::Command(format!("unknown template: {id}")))?;
            print_json(task)?;
        }
        TemplateCommand::Instantiate {
            template,
            id,
            environment,
            save,
            store,
        } => {
            let mut task = catalog.instantiate(&template, id.as_deref())?;
            task.execution_environment =
                environment.unwrap_or_else(|| cfg.executor.default_environment.clone());
            if save {
                open_store(cfg, store.as_deref())?.upsert(task.clone())?;
                tracing::info!(task_id = %task.id, template = %template, "template instantiated");
            }
            print_json(&task)?;
        }
    }
    Ok(0)
}
