use crate::{
    api::{
        models::{
            AssetUpdate, BaseModel, GalleryDraft, GalleryEntryDraft, GeneratorRequestPayload,
            GeneratorSettings, QueueSummary, RankingSettings, RankingTier, UserDraft,
            VersionUpdate,
        },
        AdminApiClient,
    },
    catalog::{
        apply_filters, AssetKind, AssetRecord, FilterState, OwnerFilter, PagedView, RevealWindow,
        SizeBucket, SortKey, Visibility, VisibilityFilter, DEFAULT_REVEAL_COOLDOWN,
    },
    config::AdminConfig,
    generator::{submission_gate, GeneratorDraft, GeneratorWizard},
    metadata::{self, MetadataRow, TagFrequencyGroup},
    storage::{is_base_model_ref, resolve_storage_url, CacheBust, StorageConfig, StorageRef},
    validation::ValidationErrors,
    views::{AdminView, StatusLine},
    AdminError, AdminResult,
};
use clap::{Parser, Subcommand, ValueEnum};
use serde::{de::DeserializeOwned, Serialize};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Administration toolkit for LoRA, image and gallery assets.
#[derive(Debug, Parser)]
#[command(name = "asset-meta-admin", version, about)]
pub struct Cli {
    /// Config file (defaults to asset-admin.yaml/.yml/.json in the working directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    Models,
    Images,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Flatten a metadata JSON file and show its tag-frequency histogram
    Inspect {
        file: PathBuf,
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
        /// Keep ss_tag_frequency rows in the flattened table
        #[arg(long)]
        include_tag_frequency: bool,
        /// Number of merged top tags to print
        #[arg(long, default_value_t = 20)]
        top: usize,
    },
    /// Filter and sort assets from the API or a saved JSON snapshot
    Browse {
        #[arg(long, value_enum, default_value_t = KindArg::Models)]
        kind: KindArg,
        /// Read assets from a JSON file instead of the API
        #[arg(long)]
        snapshot: Option<PathBuf>,
        #[arg(long, default_value = "")]
        query: String,
        #[arg(long)]
        owner: Option<String>,
        /// Tag id; repeat to require several tags
        #[arg(long = "tag")]
        tags: Vec<String>,
        /// Model-type tag id
        #[arg(long = "type")]
        type_tag: Option<String>,
        /// public, private or all
        #[arg(long, default_value = "all")]
        visibility: String,
        /// small, medium, large or unknown
        #[arg(long)]
        size: Option<String>,
        /// recent, alphabetical, size_desc or size_asc
        #[arg(long, default_value = "recent")]
        sort: String,
        /// Number of batches to reveal
        #[arg(long, default_value_t = 1)]
        pages: usize,
    },
    /// Manage user accounts
    #[command(subcommand)]
    Users(UserCommand),
    /// Inspect and edit model and image assets
    #[command(subcommand)]
    Assets(AssetCommand),
    /// Manage galleries and their entries
    #[command(subcommand)]
    Galleries(GalleryCommand),
    /// Show or change ranking weights and tiers
    #[command(subcommand)]
    Ranking(RankingCommand),
    /// Generator settings, queue and requests
    #[command(subcommand)]
    Generator(GeneratorCommand),
}

#[derive(Debug, Subcommand)]
pub enum UserCommand {
    List,
    /// Create a user from a YAML/JSON draft file
    Create {
        file: PathBuf,
        #[arg(long)]
        dry_run: bool,
    },
    /// Replace a user's fields from a YAML/JSON draft file
    Update {
        id: String,
        file: PathBuf,
        #[arg(long)]
        dry_run: bool,
    },
    Delete {
        id: String,
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Debug, Subcommand)]
pub enum AssetCommand {
    /// Show one model with its flattened metadata
    Show { id: String },
    /// Edit title, description or visibility of an asset
    Edit {
        #[arg(long, value_enum, default_value_t = KindArg::Models)]
        kind: KindArg,
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// public or private
        #[arg(long)]
        visibility: Option<String>,
        #[arg(long)]
        dry_run: bool,
    },
    Delete {
        #[arg(long, value_enum, default_value_t = KindArg::Models)]
        kind: KindArg,
        id: String,
        #[arg(long)]
        yes: bool,
    },
    /// List the versions of a model
    Versions { model_id: String },
    /// Relabel a model version or replace its metadata
    EditVersion {
        model_id: String,
        version_id: String,
        #[arg(long)]
        label: Option<String>,
        /// JSON file with the new metadata blob
        #[arg(long)]
        metadata: Option<PathBuf>,
        #[arg(long)]
        dry_run: bool,
    },
    DeleteVersion {
        model_id: String,
        version_id: String,
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Debug, Subcommand)]
pub enum GalleryCommand {
    List,
    /// Create a gallery from a YAML/JSON draft file
    Create {
        file: PathBuf,
        #[arg(long)]
        dry_run: bool,
    },
    Update {
        id: String,
        file: PathBuf,
        #[arg(long)]
        dry_run: bool,
    },
    Delete {
        id: String,
        #[arg(long)]
        yes: bool,
    },
    AddEntry {
        gallery_id: String,
        asset_id: String,
        #[arg(long)]
        position: Option<u32>,
        #[arg(long)]
        caption: Option<String>,
        #[arg(long)]
        dry_run: bool,
    },
    RemoveEntry {
        gallery_id: String,
        entry_id: String,
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Debug, Subcommand)]
pub enum RankingCommand {
    Show,
    /// Replace the ranking weights from a YAML/JSON file
    SetWeights {
        file: PathBuf,
        #[arg(long)]
        dry_run: bool,
    },
    /// Update one tier from a YAML/JSON file
    SetTier {
        file: PathBuf,
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(Debug, Subcommand)]
pub enum GeneratorCommand {
    /// Show the queue summary
    Queue,
    /// List submitted requests
    Requests,
    /// Show generator limits
    Settings,
    /// Replace generator limits from a YAML/JSON file
    SetSettings {
        file: PathBuf,
        #[arg(long)]
        dry_run: bool,
    },
    /// Validate and submit a request described in a YAML/JSON file
    Submit {
        file: PathBuf,
        /// Validate and print the payload without submitting
        #[arg(long)]
        dry_run: bool,
    },
}

pub(crate) async fn execute(command: Command, config: &AdminConfig) -> Result<(), String> {
    match command {
        Command::Inspect {
            file,
            format,
            include_tag_frequency,
            top,
        } => inspect_metadata_file(&file, format, include_tag_frequency, top),
        Command::Browse {
            kind,
            snapshot,
            query,
            owner,
            tags,
            type_tag,
            visibility,
            size,
            sort,
            pages,
        } => {
            let filters = build_filter_state(BrowseFilterArgs {
                query,
                owner,
                tags,
                type_tag,
                visibility: &visibility,
                size: size.as_deref(),
                sort: &sort,
            })?;
            browse_assets(config, kind, snapshot.as_deref(), filters, pages).await
        }
        Command::Users(command) => run_user_command(config, command).await,
        Command::Assets(command) => run_asset_command(config, command).await,
        Command::Galleries(command) => run_gallery_command(config, command).await,
        Command::Ranking(command) => run_ranking_command(config, command).await,
        Command::Generator(command) => run_generator_command(config, command).await,
    }
}

fn api_client(config: &AdminConfig) -> Result<AdminApiClient, String> {
    AdminApiClient::new(
        &config.api_base_url,
        config.api_token.as_deref(),
        config.request_timeout_seconds,
    )
    .map_err(|e| e.to_string())
}

fn read_json_file(path: &Path) -> Result<serde_json::Value, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|error| format!("Failed to read {}: {}", path.display(), error))?;
    serde_json::from_str(&content)
        .map_err(|error| format!("Failed to parse {} as JSON: {}", path.display(), error))
}

/// Reads a draft from `.json`, or YAML for any other extension.
fn read_draft_file<T: DeserializeOwned>(path: &Path) -> Result<T, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|error| format!("Failed to read {}: {}", path.display(), error))?;
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    match ext {
        "json" => serde_json::from_str(&content).map_err(|e| e.to_string()),
        _ => serde_yaml::from_str(&content).map_err(|e| e.to_string()), // yaml/yml
    }
}

include!("commands/inspect.rs");

include!("commands/browse.rs");

include!("commands/admin.rs");

include!("commands/assets.rs");

include!("commands/galleries.rs");

include!("commands/generator.rs");
