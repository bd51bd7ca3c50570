//! Forced state changes that keep the DAG consistent.
//!
//! Forcing a node cascades to its parents (so that the node's new state is
//! reachable) and to its children (so that nothing downstream is ahead of
//! it). Each node id is processed at most once per request.

pub mod request;

pub use request::ForceRequest;

use crate::error::DagResult;
use crate::node::{Node, State};
use crate::session::Session;

use std::collections::HashMap;
use tracing::trace;

/// Node id -> state requested for it during the current cascade.
pub type Visited = HashMap<u32, u32>;

/// Force `node` to `target` with a fresh cascade.
pub fn force(s: &Session, node: Node, target: u32) -> DagResult<()> {
    let mut visited = Visited::new();
    force_state(s, node, target, &mut visited)
}

/// Force `node` to the raw state `target`, cascading through parents and
/// children. Out-of-range targets are ignored.
pub fn force_state(s: &Session, node: Node, target: u32, visited: &mut Visited) -> DagResult<()> {
    let id = node.id(s)?;
    if visited.contains_key(&id) {
        return Ok(());
    }
    visited.insert(id, target);

    let Some(mut state) = State::from_raw(target) else {
        return Ok(());
    };
    if node.raw_state(s)? == state.raw() {
        return Ok(());
    }

    let job = node.job(s)?;
    // Nodes outside a job have no partial completion.
    if state == State::Complete && job == 0 {
        state = State::Final;
    }
    if node.raw_state(s)? == state.raw() {
        return Ok(());
    }
    trace!(node = %format!("{:#x}", node.address), id, %state, "forcing");

    for parent in node.parents(s)? {
        let next = parent_target(s, parent, state, job)?;
        force_state(s, parent, next, visited)?;
    }

    node.set_state(s, state)?;

    for child in node.children(s)? {
        match state {
            State::Unavailable | State::Available => {
                force_state(s, child, State::Unavailable.raw(), visited)?;
            }
            State::Complete => {
                // One decision per grandchild, no short-circuit: the first
                // call marks the child visited, so later grandchildren
                // cannot override it.
                for grandchild in child.children(s)? {
                    let seen = State::from_raw(grandchild.raw_state(s)?);
                    force_state(s, child, child_target(seen).raw(), visited)?;
                }
            }
            State::Final => {
                let next = if child.job(s)? == job {
                    State::Final
                } else {
                    State::Available
                };
                force_state(s, child, next.raw(), visited)?;
            }
        }
    }
    Ok(())
}

/// State a parent must hold for its child to become `state`.
fn parent_target(s: &Session, parent: Node, state: State, job: u32) -> DagResult<u32> {
    if state == State::Unavailable {
        let current = parent.raw_state(s)?;
        return Ok(match State::from_raw(current) {
            // Re-asserted unchanged; only marks the parent visited.
            Some(State::Unavailable | State::Available) => current,
            _ => State::Available.raw(),
        });
    }

    let parent_job = parent.job(s)?;
    let next = if parent_job == 0 || parent_job != job {
        // Ungrouped, or the last node of another job.
        State::Final
    } else if state == State::Available {
        State::Complete
    } else {
        state
    };
    Ok(next.raw())
}

/// State for the child of a node forced Complete, given one of the child's
/// own children. A grandchild that has started means the child is done;
/// otherwise the child is the next available step.
fn child_target(grandchild: Option<State>) -> State {
    match grandchild {
        Some(State::Available | State::Complete) => State::Complete,
        _ => State::Available,
    }
}
