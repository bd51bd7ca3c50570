//! Explicit context threaded through every engine call.

use crate::build::{Build, Field, Schema, World, offset_for};
use crate::config::{NodeDisplay, TaskTable};
use crate::error::DagResult;
use crate::memory::MemoryPort;

/// Everything the engine needs to interpret task-node memory for one pass:
/// the memory port, the active build and its layout, the current world and
/// the metadata table used for labels.
pub struct Session<'a> {
    pub memory: &'a dyn MemoryPort,
    pub build: Build,
    pub schema: Schema,
    pub world: World,
    pub tasks: &'a TaskTable,
    pub display: NodeDisplay,
}

impl<'a> Session<'a> {
    /// Fails with `UnknownSchema` if the build has no layout row.
    pub fn new(
        memory: &'a dyn MemoryPort,
        build: Build,
        world: World,
        tasks: &'a TaskTable,
        display: NodeDisplay,
    ) -> DagResult<Self> {
        Ok(Self {
            memory,
            build,
            schema: build.schema()?,
            world,
            tasks,
            display,
        })
    }

    pub fn read_field(&self, node: u32, field: Field) -> DagResult<u32> {
        self.memory
            .read_u32(node.wrapping_add(offset_for(self.schema, field)))
    }

    pub fn write_field(&self, node: u32, field: Field, value: u32) -> DagResult<()> {
        self.memory
            .write_u32(node.wrapping_add(offset_for(self.schema, field)), value)
    }
}
