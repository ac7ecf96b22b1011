use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Result, ViewerError};
use crate::group::{GroupOptions, GroupingPolicy};
use crate::record::FieldNames;
use crate::schema::{KeySchema, TransactionColumns};

pub const DEFAULT_CONFIG: &str = "assignview.toml";
pub const DEFAULT_STORE_DIR: &str = ".assignview";

#[derive(Debug, Default, Deserialize)]
pub struct ViewerConfig {
    #[serde(default)]
    pub grouping: GroupingSection,
    #[serde(default)]
    pub fields: FieldNames,
    #[serde(default)]
    pub store: StoreSection,
    #[serde(default)]
    pub key_elements: Vec<TransactionColumns>,
}

#[derive(Debug, Default, Deserialize)]
pub struct GroupingSection {
    pub policy: Option<GroupingPolicy>,
    pub strict: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StoreSection {
    pub dir: Option<PathBuf>,
}

impl ViewerConfig {
    /// Reads `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path).map_err(|source| ViewerError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| ViewerError::Config(e.to_string()))
    }

    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_env_with(|name| env::var(name).ok())
    }

    /// Applies `ASSIGNVIEW_POLICY`, `ASSIGNVIEW_STRICT` and
    /// `ASSIGNVIEW_STORE_DIR` as read through `var`.
    pub fn apply_env_with<F>(&mut self, var: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = var("ASSIGNVIEW_POLICY") {
            let policy = GroupingPolicy::parse(&raw).ok_or_else(|| {
                ViewerError::Config(format!("unknown grouping policy '{raw}'"))
            })?;
            self.grouping.policy = Some(policy);
        }
        if let Some(raw) = var("ASSIGNVIEW_STRICT") {
            self.grouping.strict = Some(parse_bool(&raw));
        }
        if let Some(raw) = var("ASSIGNVIEW_STORE_DIR") {
            self.store.dir = Some(PathBuf::from(raw));
        }
        Ok(())
    }

    pub fn group_options(&self) -> GroupOptions {
        GroupOptions {
            policy: self.grouping.policy.unwrap_or_default(),
            strict: self.grouping.strict.unwrap_or(false),
            fields: self.fields.clone(),
        }
    }

    pub fn key_schema(&self) -> KeySchema {
        KeySchema::builtin().with_overrides(self.key_elements.iter().cloned())
    }

    pub fn store_dir(&self) -> PathBuf {
        self.store
            .dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE_DIR))
    }
}

fn parse_bool(raw: &str) -> bool {
    matches!(
        raw.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
