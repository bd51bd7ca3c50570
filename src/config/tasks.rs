//! Per-build task metadata (tasks-<build index>.json).
//!
//! JSON shape:
//! {
//!   "1": {                         // world id ("N/A" for unassigned)
//!     "2301": {                    // task id, decimal
//!       "name": "Tower Tumble",
//!       "desc": "Climb the clock tower",
//!       "type": "Task"             // "Chalktalk" nodes render as octagons
//!     }
//!   }
//! }

use crate::build::{Build, World};

use anyhow::Context;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TaskInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub desc: String,
    #[serde(default, rename = "type")]
    pub kind: String,
}

/// world -> task id -> metadata.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct TaskTable {
    worlds: HashMap<String, HashMap<String, TaskInfo>>,
}

impl TaskTable {
    pub fn parse(text: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn lookup(&self, world: World, id: u32) -> Option<&TaskInfo> {
        self.worlds.get(&world.to_string())?.get(&id.to_string())
    }

    pub fn len(&self) -> usize {
        self.worlds.values().map(HashMap::len).sum()
    }
}

/// Lazily loaded metadata tables, one per build.
pub struct TaskCatalog {
    dir: PathBuf,
    tables: HashMap<Build, TaskTable>,
}

impl TaskCatalog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            tables: HashMap::new(),
        }
    }

    /// Table for `build`, loading it on first use. Missing or malformed files
    /// yield an empty table; nodes then fall back to address labels.
    pub fn table_for(&mut self, build: Build) -> &TaskTable {
        let dir = &self.dir;
        self.tables.entry(build).or_insert_with(|| {
            let path = dir.join(format!("tasks-{}.json", build.index()));
            match load_table(&path) {
                Ok(table) => {
                    debug!(build = %build, tasks = table.len(), "loaded task metadata");
                    table
                }
                Err(e) => {
                    warn!(build = %build, "no task metadata: {:#}", e);
                    TaskTable::default()
                }
            }
        })
    }
}

fn load_table(path: &Path) -> anyhow::Result<TaskTable> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read task metadata {}", path.display()))?;
    TaskTable::parse(&text).with_context(|| format!("parse task metadata {}", path.display()))
}
