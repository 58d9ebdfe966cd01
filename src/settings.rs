use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::PipelineError;

/// Files looked up in the working directory when CONFIG_PATH is unset
const DEFAULT_CONFIG_FILES: [&str; 3] = [
    "image-translate.yaml",
    "image-translate.yml",
    "image-translate.json",
];

/// How stage-to-stage messages travel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    /// Cloud storage and pub/sub over HTTP, stages driven by push requests
    #[default]
    Http,
    /// In-process broker and blob store
    Local,
}

impl std::fmt::Display for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Http => write!(f, "http"),
            Self::Local => write!(f, "local"),
        }
    }
}

/// Static process configuration, loaded once at start-up
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub translate_api_key: String,

    #[serde(default = "default_to_lang")]
    pub to_lang: Vec<String>,

    #[serde(default = "default_translate_topic")]
    pub translate_topic: String,

    #[serde(default = "default_result_topic")]
    pub result_topic: String,

    #[serde(default)]
    pub result_bucket: String,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub transport: Transport,

    #[serde(default)]
    pub project_id: String,

    /// Bearer token for storage and pub/sub requests
    #[serde(default)]
    pub access_token: String,

    #[serde(default = "default_vision_endpoint")]
    pub vision_endpoint: String,

    #[serde(default = "default_translate_endpoint")]
    pub translate_endpoint: String,

    #[serde(default = "default_storage_endpoint")]
    pub storage_endpoint: String,

    #[serde(default = "default_pubsub_endpoint")]
    pub pubsub_endpoint: String,

    #[serde(default = "default_local_max_attempts")]
    pub local_max_attempts: u32,
}

fn default_to_lang() -> Vec<String> {
    ["en", "fr", "es", "ja", "ru"].iter().map(|s| s.to_string()).collect()
}

fn default_translate_topic() -> String {
    "translate".to_string()
}

fn default_result_topic() -> String {
    "result".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_vision_endpoint() -> String {
    "https://vision.googleapis.com".to_string()
}

fn default_translate_endpoint() -> String {
    "https://translation.googleapis.com".to_string()
}

fn default_storage_endpoint() -> String {
    "https://storage.googleapis.com".to_string()
}

fn default_pubsub_endpoint() -> String {
    "https://pubsub.googleapis.com".to_string()
}

fn default_local_max_attempts() -> u32 {
    5
}

impl Settings {
    /// Load settings from the optional config file and the process environment
    pub fn load() -> Result<Self> {
        let path = std::env::var("CONFIG_PATH").ok().or_else(|| {
            DEFAULT_CONFIG_FILES
                .iter()
                .find(|p| Path::new(p).exists())
                .map(|p| p.to_string())
        });

        let file = match path.as_deref() {
            Some(path) => {
                debug!("Reading configuration file: {}", path);
                Some((read_config_file(path)?, format_for(path)))
            }
            None => None,
        };

        let env: HashMap<String, String> = std::env::vars().collect();
        Self::from_layers(file, env)
    }

    /// Build settings from file content and an environment map; the environment wins
    pub fn from_layers(
        file: Option<(String, FileFormat)>,
        env: HashMap<String, String>,
    ) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some((content, format)) = file {
            builder = builder.add_source(File::from_str(&content, format));
        }
        builder = builder.add_source(
            Environment::default()
                .source(Some(env))
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("to_lang"),
        );

        let mut settings: Settings = builder
            .build()
            .context("Failed to assemble configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        settings.to_lang = normalize_languages(&settings.to_lang);
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.to_lang.is_empty() {
            return Err(PipelineError::Config("TO_LANG must name at least one language".into()));
        }
        if self.translate_topic.trim().is_empty() || self.result_topic.trim().is_empty() {
            return Err(PipelineError::Config("topic names must not be empty".into()));
        }
        if self.result_bucket.trim().is_empty() {
            return Err(PipelineError::Config("RESULT_BUCKET is required".into()));
        }
        if self.transport == Transport::Http {
            if self.translate_api_key.is_empty() {
                return Err(PipelineError::Config("TRANSLATE_API_KEY is required".into()));
            }
            if self.project_id.is_empty() {
                return Err(PipelineError::Config("PROJECT_ID is required for the http transport".into()));
            }
        }
        Ok(())
    }
}

/// Trim, lowercase and de-duplicate language codes, keeping first-seen order
pub fn normalize_languages(langs: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(langs.len());
    for lang in langs {
        let lang = lang.trim().to_lowercase();
        if !lang.is_empty() && !out.contains(&lang) {
            out.push(lang);
        }
    }
    out
}

fn format_for(path: &str) -> FileFormat {
    if path.to_lowercase().ends_with(".json") {
        FileFormat::Json
    } else {
        FileFormat::Yaml
    }
}

/// Read a config file, dropping a UTF-8 BOM and expanding `${VAR}` references
fn read_config_file(path: &str) -> Result<String> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read config file {}", path))?;
    let (content, _) = encoding_rs::UTF_8.decode_with_bom_removal(&bytes);
    substitute_env(&content)
}

fn substitute_env(content: &str) -> Result<String> {
    let pattern = Regex::new(r"\$\{(\w+)\}")?;
    let replaced = pattern.replace_all(content, |caps: &regex::Captures| {
        std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
    });
    Ok(replaced.into_owned())
}
