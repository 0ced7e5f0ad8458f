//! Runtime settings: built-in defaults, then the TOML config file, then CLI flags.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use podtail_k8s::StreamParams;
use podtail_logs::PipelineOptions;
use podtail_types::{
    DEFAULT_CHUNK_CAPACITY, DEFAULT_NAMESPACE, ExtractMode, FilterSpec, Framing,
    MAX_CHUNK_CAPACITY, TailError, TargetDescriptor,
};

use crate::cli::Args;

/// Environment variable naming a config file when `--config` is absent
pub const CONFIG_ENV: &str = "PODTAIL_CONFIG";

/// Contents of a config file
#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub service: Option<String>,
    pub namespace: Option<String>,
    pub log_filter: Option<String>,
    pub mode: Option<ExtractMode>,
    pub framing: Option<Framing>,
    pub container: Option<String>,
    pub context: Option<String>,
    pub tail_lines: Option<i64>,
    pub chunk_size: Option<usize>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

/// Everything the run needs, fixed for the process lifetime
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub target: TargetDescriptor,
    pub context: Option<String>,
    pub stream: StreamParams,
    pub pipeline: PipelineOptions,
}

impl Settings {
    /// Build settings from CLI flags and the config file they point at
    pub fn from_args(args: &Args) -> Result<Self, TailError> {
        let file = match config_path(args) {
            Some(path) => {
                FileConfig::load(&path).map_err(|e| TailError::config(format!("{:#}", e)))?
            }
            None => FileConfig::default(),
        };
        Self::merge(args, file)
    }

    /// CLI flags override file values, file values override defaults
    pub fn merge(args: &Args, file: FileConfig) -> Result<Self, TailError> {
        let service = args.service.clone().or(file.service).unwrap_or_default();
        if service.is_empty() {
            return Err(TailError::config("--service is required and must not be empty"));
        }

        let namespace = args
            .namespace
            .clone()
            .or(file.namespace)
            .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string());

        let chunk_capacity = args
            .chunk_size
            .or(file.chunk_size)
            .unwrap_or(DEFAULT_CHUNK_CAPACITY);
        if chunk_capacity == 0 || chunk_capacity > MAX_CHUNK_CAPACITY {
            return Err(TailError::config(format!(
                "chunk size must be between 1 and {} bytes, got {}",
                MAX_CHUNK_CAPACITY, chunk_capacity
            )));
        }

        let tail_lines = args.tail_lines.or(file.tail_lines);
        if let Some(n) = tail_lines {
            if n < 0 {
                return Err(TailError::config(format!(
                    "tail lines must not be negative, got {}",
                    n
                )));
            }
        }

        Ok(Self {
            target: TargetDescriptor::new(namespace, service),
            context: args.context.clone().or(file.context),
            stream: StreamParams {
                container: args.container.clone().or(file.container),
                tail_lines,
            },
            pipeline: PipelineOptions {
                mode: args.mode.or(file.mode).unwrap_or_default(),
                framing: args.framing.or(file.framing).unwrap_or_default(),
                filter: FilterSpec::new(args.log_filter.clone().or(file.log_filter).unwrap_or_default()),
                chunk_capacity,
            },
        })
    }
}

fn config_path(args: &Args) -> Option<PathBuf> {
    args.config
        .clone()
        .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from))
}
