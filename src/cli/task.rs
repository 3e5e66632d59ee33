//! taskboard command implementations.

use std::path::{Path, PathBuf};

use crate::config::{Config, StorageBackend, CONFIG_FILE_NAME};
use crate::error::Result;
use crate::http;
use crate::output::{emit_success, task_line, urgency_label, HumanOutput, OutputOptions};
use crate::query::ListParams;
use crate::repository;
use crate::service::TaskService;
use crate::urgency::TaskView;
use crate::validate::TaskPayload;

/// Global flags shared by every command.
pub struct Context {
    pub store: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

impl Context {
    fn output(&self) -> OutputOptions {
        OutputOptions {
            json: self.json,
            quiet: self.quiet,
        }
    }

    /// An explicit `--config` must load; the implicit one falls back to defaults.
    fn load_config(&self) -> Result<Config> {
        match &self.config {
            Some(path) => Config::load(path),
            None => Ok(Config::load_or_default(Path::new(CONFIG_FILE_NAME))),
        }
    }

    fn open_service(&self, config: &mut Config) -> Result<TaskService> {
        if let Some(store) = &self.store {
            config.storage.backend = StorageBackend::File;
            config.storage.path = Some(store.clone());
        }
        let repository = repository::open(&config.storage)?;
        Ok(TaskService::new(repository))
    }

    fn service(&self) -> Result<TaskService> {
        let mut config = self.load_config()?;
        self.open_service(&mut config)
    }
}

pub struct ListOptions {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
}

pub struct AddOptions {
    pub heading: String,
    pub details: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub due: Option<String>,
}

pub struct EditOptions {
    pub id: String,
    pub heading: Option<String>,
    pub details: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub due: Option<String>,
    pub clear_due: bool,
}

pub struct ServeOptions {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub memory: bool,
}

pub async fn run_list(ctx: Context, options: ListOptions) -> Result<()> {
    let service = ctx.service()?;
    let params = ListParams {
        page: options.page.map(|page| page.to_string()),
        limit: options.limit.map(|limit| limit.to_string()),
        sort_by: options.sort_by,
        sort_order: options.sort_order,
        status: options.status,
        priority: options.priority,
    };
    let page = service.get_many(&params).await?.into_views(service.now());

    let pagination = page.pagination;
    let mut human = HumanOutput::new("Tasks");
    human.push_summary(
        "Page",
        format!("{} of {}", pagination.current_page, pagination.total_pages.max(1)),
    );
    human.push_summary("Total", pagination.total_items.to_string());
    for view in &page.tasks {
        human.push_detail(task_line(view));
    }
    if pagination.has_next_page {
        human.push_next_step(format!(
            "taskboard list --page {}",
            pagination.current_page + 1
        ));
    }

    emit_success(ctx.output(), "list", &page, Some(&human))
}

pub async fn run_add(ctx: Context, options: AddOptions) -> Result<()> {
    let service = ctx.service()?;
    let payload = TaskPayload {
        heading: Some(options.heading.into()),
        details: options.details.map(|details| Some(details.into())),
        status: options.status.map(Into::into),
        priority: options.priority.map(Into::into),
        due_date: options.due.map(|due| Some(due.into())),
    };
    let task = service.create(&payload).await?;
    tracing::debug!(id = %task.id, "task created");
    let view = TaskView::at(task, service.now());

    let mut human = HumanOutput::new("Task created");
    push_task_summary(&mut human, &view);
    human.push_next_step(format!("taskboard show {}", view.task.id));

    emit_success(ctx.output(), "add", &view, Some(&human))
}

pub async fn run_show(ctx: Context, id: String) -> Result<()> {
    let service = ctx.service()?;
    let task = service.get_one(&id).await?;
    let view = TaskView::at(task, service.now());

    let mut human = HumanOutput::new(format!("Task {}", view.task.id));
    push_task_summary(&mut human, &view);
    if let Some(details) = view.task.details.as_deref() {
        human.push_detail(details);
    }

    emit_success(ctx.output(), "show", &view, Some(&human))
}

pub async fn run_edit(ctx: Context, options: EditOptions) -> Result<()> {
    let service = ctx.service()?;
    let due_date = if options.clear_due {
        Some(None)
    } else {
        options.due.map(|due| Some(due.into()))
    };
    let payload = TaskPayload {
        heading: options.heading.map(Into::into),
        details: options.details.map(|details| Some(details.into())),
        status: options.status.map(Into::into),
        priority: options.priority.map(Into::into),
        due_date,
    };
    let task = service.update(&options.id, &payload).await?;
    let view = TaskView::at(task, service.now());

    let mut human = HumanOutput::new("Task updated");
    push_task_summary(&mut human, &view);

    emit_success(ctx.output(), "edit", &view, Some(&human))
}

pub async fn run_rm(ctx: Context, id: String) -> Result<()> {
    let service = ctx.service()?;
    let ack = service.delete(&id).await?;

    let mut human = HumanOutput::new(ack.message.clone());
    human.push_summary("ID", ack.id.to_string());

    emit_success(ctx.output(), "rm", &ack, Some(&human))
}

pub async fn run_serve(ctx: Context, options: ServeOptions) -> Result<()> {
    let mut config = ctx.load_config()?;
    if let Some(host) = options.host {
        config.server.host = host;
    }
    if let Some(port) = options.port {
        config.server.port = port;
    }
    if options.memory {
        config.storage.backend = StorageBackend::Memory;
    }
    config.validate()?;

    let service = if options.memory {
        TaskService::new(repository::open(&config.storage)?)
    } else {
        ctx.open_service(&mut config)?
    };
    tracing::info!(
        address = %config.server.bind_address(),
        backend = ?config.storage.backend,
        "starting task board server"
    );
    http::serve(&config.server, service).await
}

fn push_task_summary(human: &mut HumanOutput, view: &TaskView) {
    let task = &view.task;
    human.push_summary("ID", task.id.to_string());
    human.push_summary("Heading", task.heading.clone());
    human.push_summary("Status", task.status.to_string());
    human.push_summary("Priority", task.priority.to_string());
    human.push_summary("Created", task.creation_date.to_rfc3339());
    if let Some(due) = task.due_date {
        human.push_summary("Due", due.to_rfc3339());
    }
    if let Some(label) = urgency_label(view) {
        human.push_warning(label);
    }
}
