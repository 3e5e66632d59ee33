//! Command-line interface for taskboard
//!
//! This module defines the CLI structure using clap derive macros.
//! Command implementations live in [`task`].

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::error::Result;

mod task;

/// taskboard - a task board with due-date urgency
///
/// Create, list, edit and remove tasks from the terminal, or serve the
/// board over HTTP.
#[derive(Parser, Debug)]
#[command(name = "taskboard")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the JSON task store (overrides the config file)
    #[arg(long, global = true, env = "TASKBOARD_STORE")]
    pub store: Option<PathBuf>,

    /// Path to the configuration file (defaults to ./taskboard.toml)
    #[arg(long, global = true, env = "TASKBOARD_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List tasks, one page at a time
    List {
        /// Page number, starting at 1
        #[arg(long)]
        page: Option<u32>,

        /// Tasks per page (1-100)
        #[arg(long)]
        limit: Option<u32>,

        /// Sort field: heading, status, priority, creationDate, dueDate
        #[arg(long)]
        sort_by: Option<String>,

        /// Sort order: asc or desc
        #[arg(long)]
        sort_order: Option<String>,

        /// Only tasks with this status ("To Do", "In Progress", "Done")
        #[arg(long)]
        status: Option<String>,

        /// Only tasks with this priority (Low, Medium, High)
        #[arg(long)]
        priority: Option<String>,
    },

    /// Create a task
    Add {
        /// Task heading
        heading: String,

        /// Longer description
        #[arg(long)]
        details: Option<String>,

        /// Initial status (defaults to "To Do")
        #[arg(long)]
        status: Option<String>,

        /// Priority (defaults to Low)
        #[arg(long)]
        priority: Option<String>,

        /// Due date, e.g. 2026-06-30 or 2026-06-30T17:00:00Z
        #[arg(long)]
        due: Option<String>,
    },

    /// Show one task
    Show {
        /// Task ID
        id: String,
    },

    /// Change fields of a task; omitted fields are left as they are
    Edit {
        /// Task ID
        id: String,

        /// New heading
        #[arg(long)]
        heading: Option<String>,

        /// New details (an empty value clears them)
        #[arg(long)]
        details: Option<String>,

        /// New status
        #[arg(long)]
        status: Option<String>,

        /// New priority
        #[arg(long)]
        priority: Option<String>,

        /// New due date
        #[arg(long, conflicts_with = "clear_due")]
        due: Option<String>,

        /// Remove the due date
        #[arg(long)]
        clear_due: bool,
    },

    /// Delete a task permanently
    Rm {
        /// Task ID
        id: String,
    },

    /// Serve the board over HTTP
    Serve {
        /// Interface to bind (overrides server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind (overrides server.port)
        #[arg(long)]
        port: Option<u16>,

        /// Keep tasks in memory only
        #[arg(long)]
        memory: bool,
    },
}

impl Cli {
    /// Execute the CLI command
    pub fn run(self) -> Result<()> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;
        let context = task::Context {
            store: self.store,
            config: self.config,
            json: self.json,
            quiet: self.quiet,
        };

        runtime.block_on(async move {
            match self.command {
                Commands::List {
                    page,
                    limit,
                    sort_by,
                    sort_order,
                    status,
                    priority,
                } => {
                    task::run_list(
                        context,
                        task::ListOptions {
                            page,
                            limit,
                            sort_by,
                            sort_order,
                            status,
                            priority,
                        },
                    )
                    .await
                }
                Commands::Add {
                    heading,
                    details,
                    status,
                    priority,
                    due,
                } => {
                    task::run_add(
                        context,
                        task::AddOptions {
                            heading,
                            details,
                            status,
                            priority,
                            due,
                        },
                    )
                    .await
                }
                Commands::Show { id } => task::run_show(context, id).await,
                Commands::Edit {
                    id,
                    heading,
                    details,
                    status,
                    priority,
                    due,
                    clear_due,
                } => {
                    task::run_edit(
                        context,
                        task::EditOptions {
                            id,
                            heading,
                            details,
                            status,
                            priority,
                            due,
                            clear_due,
                        },
                    )
                    .await
                }
                Commands::Rm { id } => task::run_rm(context, id).await,
                Commands::Serve { host, port, memory } => {
                    task::run_serve(context, task::ServeOptions { host, port, memory }).await
                }
            }
        })
    }
}
