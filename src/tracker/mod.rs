//! Refresh loop state: ties build detection, discovery, rendering and
//! operator requests together for one target.
//!
//! The tracker holds no locks; the caller drives `tick` and `handle` from a
//! single thread so refreshes and forced-state requests never overlap.

use crate::build::{self, Build, World};
use crate::config::{Settings, TaskCatalog};
use crate::error::{DagError, DagResult};
use crate::graph::Graph;
use crate::memory::MemoryPort;
use crate::node::Node;
use crate::propagate::{self, ForceRequest};
use crate::render::render_dot;
use crate::session::Session;

use anyhow::bail;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Operator requests accepted between ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    Force(ForceRequest),
    Reset,
    /// Rebuild from the live head immediately.
    Refresh,
}

impl Request {
    /// `reset`, `refresh` or `<address>=<state>`.
    pub fn parse(line: &str) -> anyhow::Result<Self> {
        match line.trim() {
            "reset" => Ok(Request::Reset),
            "refresh" => Ok(Request::Refresh),
            "" => bail!("empty request"),
            other => Ok(Request::Force(ForceRequest::parse(other)?)),
        }
    }
}

/// A head change waiting for the settle delay to pass.
#[derive(Debug, Clone, Copy)]
struct Pending {
    head: u32,
    due: Instant,
}

pub struct Tracker {
    settings: Settings,
    catalog: TaskCatalog,
    graph: Graph,
    pending: Option<Pending>,
    build: Option<Build>,
}

impl Tracker {
    pub fn new(settings: Settings) -> Self {
        let catalog = TaskCatalog::new(settings.tasks_dir.clone());
        Self {
            settings,
            catalog,
            graph: Graph::new(),
            pending: None,
            build: None,
        }
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    fn locate(&mut self, memory: &dyn MemoryPort) -> DagResult<(Build, World)> {
        let build = if self.settings.auto_detect_build {
            build::detect_build(memory)?
        } else {
            self.settings
                .build
                .ok_or_else(|| DagError::NoGameDetected("no build configured".to_string()))?
        };
        if self.build != Some(build) {
            info!(build = %build, "game build selected");
            // A different game invalidates the old snapshot.
            self.graph.clear();
            self.pending = None;
            self.build = Some(build);
        }
        let world = build::read_world(memory, build)?;
        Ok((build, world))
    }

    /// One refresh step. Returns the DOT text to display, or `None` when the
    /// game has no active DAG.
    ///
    /// A new head is only discovered once it has been stable for the settle
    /// delay and the game is not loading. A failed discovery is logged and
    /// the previous snapshot stays in place.
    pub fn tick(&mut self, memory: &dyn MemoryPort, now: Instant) -> DagResult<Option<String>> {
        let (build, world) = self.locate(memory)?;
        let head = build::read_head(memory, build, world)?;
        if head == 0 {
            return Ok(None);
        }

        let tasks = self.catalog.table_for(build);
        let s = Session::new(memory, build, world, tasks, self.settings.nodes_display)?;

        if self.graph.head != Some(head) {
            if build::is_loading(memory, build)? {
                self.pending = None;
            } else {
                let due = match self.pending {
                    Some(p) if p.head == head => p.due,
                    _ => {
                        let due = now + self.settings.settle_delay();
                        self.pending = Some(Pending { head, due });
                        due
                    }
                };
                if now >= due {
                    self.pending = None;
                    if let Err(e) = self.graph.populate(&s, head) {
                        warn!(head = %format!("{:#x}", head), "error populating dag: {}", e);
                    }
                }
            }
        }

        if self.graph.is_empty() {
            return Ok(None);
        }
        render_dot(&self.graph, &s).map(Some)
    }

    pub fn handle(&mut self, memory: &dyn MemoryPort, request: Request) -> DagResult<()> {
        let (build, world) = self.locate(memory)?;
        let tasks = self.catalog.table_for(build);
        let s = Session::new(memory, build, world, tasks, self.settings.nodes_display)?;

        match request {
            Request::Force(req) => {
                info!(
                    node = %format!("{:#x}", req.node),
                    state = req.state,
                    "forcing node state"
                );
                propagate::force(&s, Node::new(req.node), req.state)
            }
            Request::Reset => {
                debug!(nodes = self.graph.node_count(), "resetting dag");
                self.graph.reset(&s)
            }
            Request::Refresh => {
                let head = build::read_head(memory, build, world)?;
                if head == 0 {
                    return Err(DagError::NoGameDetected("no active dag".to_string()));
                }
                self.pending = None;
                self.graph.populate(&s, head)
            }
        }
    }

    /// Discover from the live head right now and render.
    pub fn snapshot(&mut self, memory: &dyn MemoryPort) -> DagResult<String> {
        self.handle(memory, Request::Refresh)?;
        let (build, world) = self.locate(memory)?;
        let tasks = self.catalog.table_for(build);
        let s = Session::new(memory, build, world, tasks, self.settings.nodes_display)?;
        render_dot(&self.graph, &s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::State;
    use crate::testkit::{FakeDag, TaskNode};
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    const HEAD_POINTER: u32 = 0x3e0b04;
    const WORLD: u32 = 0x3d4a60;
    const LOADING: u32 = 0x3d4830;

    fn booted_sly2() -> FakeDag {
        let dag = FakeDag::sly2();
        dag.poke(0x92ce0, 1);
        dag.poke_bytes(0x15395, b"SCUS_973.16;1\0");
        dag.poke(WORLD, 1);
        dag.wire(
            vec![
                TaskNode::new(0x1000, 1).state(State::Available),
                TaskNode::new(0x2000, 2),
            ],
            &[(0x1000, 0x2000)],
        );
        dag
    }

    fn tracker() -> Tracker {
        Tracker::new(Settings {
            tasks_dir: "/nonexistent/dagviz".into(),
            ..Settings::default()
        })
    }

    #[test]
    fn request_lines() {
        assert_eq!(Request::parse("reset").unwrap(), Request::Reset);
        assert_eq!(Request::parse(" refresh\n").unwrap(), Request::Refresh);
        assert_eq!(
            Request::parse("1000=2").unwrap(),
            Request::Force(ForceRequest::new(0x1000, 2))
        );
        assert!(Request::parse("").is_err());
        assert!(Request::parse("bogus").is_err());
    }

    #[test]
    fn no_head_means_no_graph() {
        let dag = booted_sly2();
        let mut t = tracker();
        assert_eq!(t.tick(&dag.memory, Instant::now()).unwrap(), None);
    }

    #[test]
    fn unbooted_game_is_reported() {
        let dag = FakeDag::sly2();
        let mut t = tracker();
        assert!(matches!(
            t.tick(&dag.memory, Instant::now()),
            Err(DagError::NoGameDetected(_))
        ));
    }

    #[test]
    fn new_head_is_discovered_after_settle_delay() {
        let dag = booted_sly2();
        dag.poke(HEAD_POINTER, 0x1000);
        let mut t = tracker();
        let start = Instant::now();

        assert_eq!(t.tick(&dag.memory, start).unwrap(), None);
        assert!(t.graph().is_empty());

        let later = start + Duration::from_millis(400);
        let dot = t.tick(&dag.memory, later).unwrap().unwrap();
        assert!(dot.contains("\"1000\" -> \"2000\""));
        assert_eq!(t.graph().node_count(), 2);
    }

    #[test]
    fn loading_postpones_discovery() {
        let dag = booted_sly2();
        dag.poke(HEAD_POINTER, 0x1000);
        dag.poke(LOADING, 1);
        let mut t = tracker();
        let start = Instant::now();
        t.tick(&dag.memory, start).unwrap();
        t.tick(&dag.memory, start + Duration::from_secs(1)).unwrap();
        assert!(t.graph().is_empty());

        dag.poke(LOADING, 0);
        let resumed = start + Duration::from_secs(2);
        t.tick(&dag.memory, resumed).unwrap();
        assert!(t.graph().is_empty());
        t.tick(&dag.memory, resumed + Duration::from_millis(400)).unwrap();
        assert_eq!(t.graph().node_count(), 2);
    }

    #[test]
    fn failed_rebuild_keeps_previous_graph() {
        let dag = booted_sly2();
        dag.poke(HEAD_POINTER, 0x1000);
        let mut t = tracker();
        t.handle(&dag.memory, Request::Refresh).unwrap();
        assert_eq!(t.graph().node_count(), 2);

        dag.place(TaskNode::new(0x3000, 3));
        dag.set_child_count(0x3000, 0x10_0000);
        dag.poke(HEAD_POINTER, 0x3000);
        let start = Instant::now();
        t.tick(&dag.memory, start).unwrap();
        let dot = t
            .tick(&dag.memory, start + Duration::from_millis(500))
            .unwrap()
            .unwrap();
        assert_eq!(t.graph().head, Some(0x1000));
        assert!(dot.contains("\"1000\" -> \"2000\""));
    }

    #[test]
    fn force_and_reset_requests() {
        let dag = booted_sly2();
        dag.poke(HEAD_POINTER, 0x1000);
        let mut t = tracker();
        t.snapshot(&dag.memory).unwrap();

        t.handle(&dag.memory, Request::Force(ForceRequest::new(0x2000, 3)))
            .unwrap();
        assert_eq!(dag.state_of(0x1000), State::Final.raw());
        assert_eq!(dag.state_of(0x2000), State::Final.raw());

        t.handle(&dag.memory, Request::Reset).unwrap();
        assert_eq!(dag.state_of(0x1000), State::Available.raw());
        assert_eq!(dag.state_of(0x2000), State::Unavailable.raw());
    }

    #[test]
    fn manual_build_skips_detection() {
        let dag = FakeDag::sly2();
        dag.poke(WORLD, 1);
        let mut t = Tracker::new(Settings {
            auto_detect_build: false,
            build: Some(Build::Sly2Ntsc),
            tasks_dir: "/nonexistent/dagviz".into(),
            ..Settings::default()
        });
        assert_eq!(t.tick(&dag.memory, Instant::now()).unwrap(), None);
    }
}
