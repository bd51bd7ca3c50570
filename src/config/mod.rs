//! Config layer: JSON inputs read from disk.
//!
//! This module is separate from memory access and rendering.
//! It owns:
//! - Settings (config.json)
//! - Task metadata tables (tasks-<build>.json)

pub mod settings;
pub mod tasks;

pub use settings::{NodeDisplay, Settings};
pub use tasks::{TaskCatalog, TaskInfo, TaskTable};
