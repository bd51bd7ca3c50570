//! Operator settings (config.json).
//!
//! JSON shape (every key optional):
//! {
//!   "autoDetectBuild": true,
//!   "build": "sly2-ntsc",       // used when autoDetectBuild is false
//!   "nodesDisplay": "name",     // name | id-hex | address | state | id
//!   "baseAddress": 536870912,
//!   "processName": "pcsx2",
//!   "tasksDir": ".",
//!   "refreshMs": 500,
//!   "settleMs": 400
//! }

use crate::build::Build;
use crate::memory::process::DEFAULT_BASE_ADDRESS;

use anyhow::{Context, bail};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// What to print inside each node of the rendered graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeDisplay {
    #[default]
    Name,
    IdHex,
    Address,
    State,
    Id,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub auto_detect_build: bool,
    pub build: Option<Build>,
    pub nodes_display: NodeDisplay,
    pub base_address: usize,
    pub process_name: String,
    pub tasks_dir: PathBuf,
    pub refresh_ms: u64,
    pub settle_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            auto_detect_build: true,
            build: None,
            nodes_display: NodeDisplay::Name,
            base_address: DEFAULT_BASE_ADDRESS,
            process_name: "pcsx2".to_string(),
            tasks_dir: PathBuf::from("."),
            refresh_ms: 500,
            settle_ms: 400,
        }
    }
}

impl Settings {
    /// Load settings; a missing file yields the defaults.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read settings file {}", path.display()))?;
        let settings: Settings = serde_json::from_str(&text)
            .with_context(|| format!("parse settings file {}", path.display()))?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if !self.auto_detect_build && self.build.is_none() {
            bail!("autoDetectBuild is false but no build is configured");
        }
        if self.refresh_ms == 0 {
            bail!("refreshMs must be greater than 0");
        }
        Ok(())
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}
