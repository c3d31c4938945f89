//! CLI Tooling
//!
//! Inspection commands over JSON snapshot files. The snapshots are loaded into
//! in-memory collections and driven through the same engine the application uses.

use crate::catalog::{CourseGroup, FilterConfig, Selection};
use crate::config::{ConfigLoader, EngineConfig};
use crate::engine::ArchiveEngine;
use crate::error::{ApiError, StorageError};
use crate::logging::{init_logging_with_file, LoggingConfig};
use crate::model::{decode_documents, decode_resources, Document, Resource};
use crate::sync::MemoryCollection;
use crate::tree::TreeStore;
use crate::types::{DOCUMENTS_COLLECTION, RESOURCES_COLLECTION, ROOT_ANCHOR};
use clap::{Parser, Subcommand};
use comfy_table::Table;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::info;

/// Archive - inspect archive document trees and resource catalogs
#[derive(Parser)]
#[command(name = "archive")]
#[command(about = "Browse archive snapshots and aggregate course resources")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// JSON array of document records
    #[arg(long)]
    pub documents: Option<PathBuf>,

    /// JSON array of resource records
    #[arg(long)]
    pub resources: Option<PathBuf>,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Output format (text or json)
    #[arg(long, default_value = "text")]
    pub format: String,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, file+stderr, both)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output includes "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List category roots, oldest first
    Roots,
    /// List a folder inside a category
    Ls {
        /// Category id
        category: String,
        /// Folder id below the category (defaults to the category itself)
        #[arg(long)]
        path: Option<String>,
    },
    /// Group approved resources by course
    Courses {
        /// Case-insensitive course code or name fragment
        #[arg(long, default_value = "")]
        search: String,
        /// Resource type, or ALL
        #[arg(long = "type", default_value = "ALL")]
        resource_type: String,
        /// Term label, or ALL
        #[arg(long, default_value = "ALL")]
        term: String,
        /// Saved resource id (repeatable)
        #[arg(long = "saved")]
        saved: Vec<String>,
        /// Only show saved resources
        #[arg(long)]
        saved_only: bool,
    },
    /// List available terms
    Terms,
}

impl Cli {
    /// Logging configuration with command-line overrides applied. `--log-file` is
    /// handed to `init_logging_with_file` separately so it outranks the environment.
    pub fn logging_config(&self, base: &LoggingConfig) -> LoggingConfig {
        let mut config = base.clone();
        if let Some(level) = &self.log_level {
            config.level = level.clone();
        }
        if let Some(format) = &self.log_format {
            config.format = format.clone();
        }
        if let Some(output) = &self.log_output {
            config.output = output.clone();
        }
        config
    }
}

/// Everything a command needs
pub struct CliContext {
    engine: ArchiveEngine,
    documents: Vec<Document>,
    runtime: tokio::runtime::Runtime,
    format: String,
}

impl CliContext {
    /// Load configuration, install logging, and load the snapshot files
    pub fn new(cli: &Cli) -> Result<Self, ApiError> {
        let config = match &cli.config {
            Some(path) => ConfigLoader::load_from_file(path)?,
            None => ConfigLoader::load()?,
        };
        init_logging_with_file(Some(&cli.logging_config(&config.logging)), cli.log_file.clone())?;

        let documents = match &cli.documents {
            Some(path) => decode_documents(read_json_array(path)?),
            None => Vec::new(),
        };
        let resources = match &cli.resources {
            Some(path) => decode_resources(read_json_array(path)?),
            None => Vec::new(),
        };
        info!(
            documents = documents.len(),
            resources = resources.len(),
            "Loaded snapshots"
        );

        Self::with_snapshots(config, documents, resources, &cli.format)
    }

    /// Build a context over in-memory snapshots, with the cache described by `config`
    pub fn with_snapshots(
        config: EngineConfig,
        documents: Vec<Document>,
        resources: Vec<Resource>,
        format: &str,
    ) -> Result<Self, ApiError> {
        if format != "text" && format != "json" {
            return Err(ApiError::ConfigError(format!(
                "Invalid output format: {} (must be 'text' or 'json')",
                format
            )));
        }
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| ApiError::StorageError(StorageError::IoError(e)))?;
        let engine = ArchiveEngine::from_config(
            config,
            MemoryCollection::with_records(DOCUMENTS_COLLECTION, documents.clone()),
            MemoryCollection::with_records(RESOURCES_COLLECTION, resources),
        )?;
        Ok(Self {
            engine,
            documents,
            runtime,
            format: format.to_string(),
        })
    }

    pub fn engine(&self) -> &ArchiveEngine {
        &self.engine
    }

    pub fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        match command {
            Commands::Roots => {
                self.runtime.block_on(self.engine.prime_roots())?;
                self.engine.open_roots();
                self.engine.pump();
                self.render_documents(&self.engine.root_categories())
            }
            Commands::Ls { category, path } => {
                self.engine.open_roots();
                self.engine.pump();
                self.engine.open_category(category)?;
                self.engine.pump();
                if let Some(path) = path {
                    self.walk_to(category, path)?;
                }
                self.render_listing(category)
            }
            Commands::Courses {
                search,
                resource_type,
                term,
                saved,
                saved_only,
            } => {
                self.load_catalog()?;
                let filter = FilterConfig::default()
                    .saved_only(*saved_only)
                    .search(search.clone())
                    .resource_type(Selection::from(resource_type.clone()))
                    .term(Selection::from(term.clone()));
                let saved: HashSet<String> = saved.iter().cloned().collect();
                self.render_courses(&self.engine.grouped_courses(&filter, &saved))
            }
            Commands::Terms => {
                self.load_catalog()?;
                let terms = self.engine.available_terms();
                if self.format == "json" {
                    return to_json(&terms);
                }
                Ok(terms.join("\n"))
            }
        }
    }

    fn load_catalog(&self) -> Result<(), ApiError> {
        self.runtime.block_on(self.engine.prime_catalog())?;
        self.engine.open_catalog();
        self.engine.pump();
        Ok(())
    }

    /// Descend folder by folder from the category root to `path`
    fn walk_to(&self, category: &str, path: &str) -> Result<(), ApiError> {
        let full = TreeStore::from_documents(self.documents.clone());
        let chain: Vec<String> = full
            .ancestors(path)?
            .into_iter()
            .map(|doc| doc.id.clone())
            .collect();
        let Some((top, rest)) = chain.split_first() else {
            return Err(ApiError::NodeNotFound(path.to_string()));
        };
        if top != category {
            return Err(ApiError::BrokenAncestry {
                id: path.to_string(),
                category: category.to_string(),
            });
        }
        for folder in rest {
            self.engine.descend(category, folder)?;
            self.engine.pump();
        }
        Ok(())
    }

    fn render_listing(&self, category: &str) -> Result<String, ApiError> {
        let children = self.engine.current_children(category)?;
        if self.format == "json" {
            return to_json(&children);
        }
        let trail: Vec<String> = self
            .engine
            .breadcrumb(category)?
            .into_iter()
            .map(|crumb| crumb.label)
            .collect();
        let mut output = format!("{}\n", trail.join(" / "));
        if children.is_empty() {
            output.push_str("(empty folder)");
            return Ok(output);
        }
        output.push_str(&document_table(&children).to_string());
        Ok(output)
    }

    fn render_documents(&self, documents: &[Document]) -> Result<String, ApiError> {
        if self.format == "json" {
            return to_json(&documents);
        }
        if documents.is_empty() {
            return Ok("No categories.".to_string());
        }
        Ok(document_table(documents).to_string())
    }

    fn render_courses(&self, groups: &[CourseGroup]) -> Result<String, ApiError> {
        if self.format == "json" {
            return to_json(&groups);
        }
        if groups.is_empty() {
            return Ok("No resources match the current filters.".to_string());
        }
        let mut table = Table::new();
        table.load_preset(comfy_table::presets::UTF8_FULL);
        table.set_header(vec!["Code", "Name", "Department", "Types", "Total"]);
        for group in groups {
            let types: Vec<String> = group
                .by_type
                .iter()
                .map(|(kind, items)| format!("{} ({})", kind, items.len()))
                .collect();
            table.add_row(vec![
                group.code.clone(),
                group.name.clone().unwrap_or_else(|| "-".to_string()),
                group.department.clone().unwrap_or_else(|| "-".to_string()),
                types.join(", "),
                group.total_count.to_string(),
            ]);
        }
        Ok(table.to_string())
    }
}

fn document_table(documents: &[Document]) -> Table {
    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.set_header(vec!["Id", "Title", "Kind", "Parent", "Created"]);
    for doc in documents {
        let created = doc
            .created_at
            .and_then(chrono::DateTime::<chrono::Utc>::from_timestamp_millis)
            .map(|ts| ts.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());
        let parent = if doc.parent_path == ROOT_ANCHOR {
            "-".to_string()
        } else {
            doc.parent_path.clone()
        };
        table.add_row(vec![
            doc.id.clone(),
            doc.title.clone(),
            doc.kind.name().to_string(),
            parent,
            created,
        ]);
    }
    table
}

fn read_json_array(path: &Path) -> Result<Vec<serde_json::Value>, ApiError> {
    let bytes = std::fs::read(path).map_err(StorageError::from)?;
    let values: Vec<serde_json::Value> = serde_json::from_slice(&bytes).map_err(StorageError::from)?;
    Ok(values)
}

fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<String, ApiError> {
    serde_json::to_string_pretty(value).map_err(|e| ApiError::StorageError(e.into()))
}
