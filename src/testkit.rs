//! Synthetic task DAGs laid out in fake guest memory.

use crate::build::{Build, Field, Schema, World, offset_for};
use crate::config::{NodeDisplay, TaskTable};
use crate::error::DagResult;
use crate::memory::{MemoryPort, SnapshotMemory};
use crate::node::{NO_CHECKPOINT, State};
use crate::session::Session;

use std::cell::Cell;

/// Large enough for the per-build head/world pointers.
const MEMORY_SIZE: usize = 0x48_0000;
const CHILDREN_ARRAY: u32 = 0x100;
const PARENTS_ARRAY: u32 = 0x180;

/// Snapshot memory that counts writes.
pub struct CountingMemory {
    inner: SnapshotMemory,
    writes: Cell<usize>,
}

impl MemoryPort for CountingMemory {
    fn read_bytes(&self, address: u32, buf: &mut [u8]) -> DagResult<()> {
        self.inner.read_bytes(address, buf)
    }

    fn write_bytes(&self, address: u32, data: &[u8]) -> DagResult<()> {
        self.writes.set(self.writes.get() + 1);
        self.inner.write_bytes(address, data)
    }
}

#[derive(Debug, Clone)]
pub struct TaskNode {
    address: u32,
    id: u32,
    state: u32,
    job: u32,
    checkpoint: u32,
    children: Vec<u32>,
    parents: Vec<u32>,
}

impl TaskNode {
    pub fn new(address: u32, id: u32) -> Self {
        Self {
            address,
            id,
            state: State::Unavailable.raw(),
            job: 0,
            checkpoint: NO_CHECKPOINT,
            children: Vec::new(),
            parents: Vec::new(),
        }
    }

    pub fn state(self, state: State) -> Self {
        self.raw_state(state.raw())
    }

    pub fn raw_state(mut self, raw: u32) -> Self {
        self.state = raw;
        self
    }

    pub fn job(mut self, job: u32) -> Self {
        self.job = job;
        self
    }

    pub fn checkpoint(mut self, checkpoint: u32) -> Self {
        self.checkpoint = checkpoint;
        self
    }

    pub fn children(mut self, children: &[u32]) -> Self {
        self.children = children.to_vec();
        self
    }

    pub fn parents(mut self, parents: &[u32]) -> Self {
        self.parents = parents.to_vec();
        self
    }
}

pub struct FakeDag {
    pub memory: CountingMemory,
    pub build: Build,
    pub schema: Schema,
    pub tasks: TaskTable,
    pub display: NodeDisplay,
}

impl FakeDag {
    pub fn sly2() -> Self {
        Self::for_build(Build::Sly2Ntsc)
    }

    pub fn sly3() -> Self {
        Self::for_build(Build::Sly3Ntsc)
    }

    fn for_build(build: Build) -> Self {
        Self {
            memory: CountingMemory {
                inner: SnapshotMemory::zeroed(MEMORY_SIZE),
                writes: Cell::new(0),
            },
            build,
            schema: build.schema().unwrap(),
            tasks: TaskTable::default(),
            display: NodeDisplay::Id,
        }
    }

    pub fn with_tasks(mut self, json: &str) -> Self {
        self.tasks = TaskTable::parse(json).unwrap();
        self
    }

    pub fn with_display(mut self, display: NodeDisplay) -> Self {
        self.display = display;
        self
    }

    pub fn session(&self) -> Session<'_> {
        Session::new(
            &self.memory,
            self.build,
            World::Episode(1),
            &self.tasks,
            self.display,
        )
        .unwrap()
    }

    fn field(&self, node: u32, field: Field) -> u32 {
        node + offset_for(self.schema, field)
    }

    /// Write one node; its link arrays live right after the struct.
    pub fn place(&self, node: TaskNode) {
        assert!(node.children.len() <= 32 && node.parents.len() <= 32);
        let m = &self.memory.inner;
        let a = node.address;
        m.write_u32(self.field(a, Field::Id), node.id).unwrap();
        m.write_u32(self.field(a, Field::State), node.state).unwrap();
        m.write_u32(self.field(a, Field::Job), node.job).unwrap();
        m.write_u32(self.field(a, Field::Checkpoint), node.checkpoint)
            .unwrap();

        m.write_u32(self.field(a, Field::NumChildren), node.children.len() as u32)
            .unwrap();
        m.write_u32(self.field(a, Field::ChildrenArray), a + CHILDREN_ARRAY)
            .unwrap();
        for (i, child) in node.children.iter().enumerate() {
            m.write_u32(a + CHILDREN_ARRAY + 4 * i as u32, *child).unwrap();
        }

        m.write_u32(self.field(a, Field::NumParents), node.parents.len() as u32)
            .unwrap();
        m.write_u32(self.field(a, Field::ParentsArray), a + PARENTS_ARRAY)
            .unwrap();
        for (i, parent) in node.parents.iter().enumerate() {
            m.write_u32(a + PARENTS_ARRAY + 4 * i as u32, *parent).unwrap();
        }
    }

    /// Place `nodes`, deriving child and parent arrays from `edges`
    /// (parent address, child address).
    pub fn wire(&self, nodes: Vec<TaskNode>, edges: &[(u32, u32)]) {
        for mut node in nodes {
            node.children = edges
                .iter()
                .filter(|(p, _)| *p == node.address)
                .map(|(_, c)| *c)
                .collect();
            node.parents = edges
                .iter()
                .filter(|(_, c)| *c == node.address)
                .map(|(p, _)| *p)
                .collect();
            self.place(node);
        }
    }

    pub fn set_child_count(&self, node: u32, count: u32) {
        self.memory
            .inner
            .write_u32(self.field(node, Field::NumChildren), count)
            .unwrap();
    }

    pub fn state_of(&self, node: u32) -> u32 {
        self.memory
            .inner
            .read_u32(self.field(node, Field::State))
            .unwrap()
    }

    pub fn set_state(&self, node: u32, state: State) {
        self.memory
            .inner
            .write_u32(self.field(node, Field::State), state.raw())
            .unwrap();
    }

    /// Raw write that bypasses the write counter.
    pub fn poke(&self, address: u32, value: u32) {
        self.memory.inner.write_u32(address, value).unwrap();
    }

    pub fn poke_bytes(&self, address: u32, bytes: &[u8]) {
        self.memory.inner.write_bytes(address, bytes).unwrap();
    }

    /// Writes made through the port since the last call.
    pub fn take_writes(&self) -> usize {
        self.memory.writes.replace(0)
    }
}
