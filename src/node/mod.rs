//! Task-node accessor.
//!
//! A `Node` is only an address into guest memory. Every field is read through
//! the session's memory port on access, so values always reflect what the
//! game currently holds.

pub mod state;
pub mod style;

pub use state::State;

use crate::build::Field;
use crate::error::{DagError, DagResult};
use crate::session::Session;

/// Checkpoint value for nodes that are not save points.
pub const NO_CHECKPOINT: u32 = 0xffff_ffff;

/// Largest child/parent count accepted before a node is considered corrupt.
pub const MAX_EDGES: u32 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Node {
    pub address: u32,
}

impl Node {
    pub fn new(address: u32) -> Self {
        Self { address }
    }

    pub fn id(self, s: &Session) -> DagResult<u32> {
        s.read_field(self.address, Field::Id)
    }

    /// Raw state word, unvalidated.
    pub fn raw_state(self, s: &Session) -> DagResult<u32> {
        s.read_field(self.address, Field::State)
    }

    pub fn state(self, s: &Session) -> DagResult<State> {
        let raw = self.raw_state(s)?;
        State::from_raw(raw).ok_or_else(|| DagError::CorruptNode {
            address: self.address,
            detail: format!("state {} out of range", raw),
        })
    }

    pub fn set_state(self, s: &Session, state: State) -> DagResult<()> {
        s.write_field(self.address, Field::State, state.raw())
    }

    /// Address of the owning job, 0 when the node belongs to none.
    pub fn job(self, s: &Session) -> DagResult<u32> {
        s.read_field(self.address, Field::Job)
    }

    pub fn checkpoint(self, s: &Session) -> DagResult<u32> {
        s.read_field(self.address, Field::Checkpoint)
    }

    pub fn is_checkpoint(self, s: &Session) -> DagResult<bool> {
        Ok(self.checkpoint(s)? != NO_CHECKPOINT)
    }

    pub fn children(self, s: &Session) -> DagResult<Vec<Node>> {
        self.read_links(s, Field::NumChildren, Field::ChildrenArray)
    }

    pub fn parents(self, s: &Session) -> DagResult<Vec<Node>> {
        self.read_links(s, Field::NumParents, Field::ParentsArray)
    }

    pub fn num_parents(self, s: &Session) -> DagResult<u32> {
        s.read_field(self.address, Field::NumParents)
    }

    fn read_links(self, s: &Session, count: Field, array: Field) -> DagResult<Vec<Node>> {
        let len = s.read_field(self.address, count)?;
        if len > MAX_EDGES {
            return Err(DagError::CorruptNode {
                address: self.address,
                detail: format!("{:?} is {}", count, len),
            });
        }
        let base = s.read_field(self.address, array)?;
        (0..len)
            .map(|i| s.memory.read_u32(base.wrapping_add(i * 4)).map(Node::new))
            .collect()
    }
}
