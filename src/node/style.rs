//! Presentation data for a node: metadata lookups and DOT attributes.

use crate::config::{NodeDisplay, TaskInfo};
use crate::error::DagResult;
use crate::node::Node;
use crate::session::Session;

/// Task type rendered as an octagon.
const CHALKTALK: &str = "Chalktalk";

impl Node {
    fn info<'s>(self, s: &Session<'s>) -> DagResult<Option<&'s TaskInfo>> {
        Ok(s.tasks.lookup(s.world, self.id(s)?))
    }

    pub fn name(self, s: &Session) -> DagResult<String> {
        Ok(match self.info(s)? {
            Some(info) => info.name.clone(),
            None => format!("0x{:x}", self.address),
        })
    }

    pub fn description(self, s: &Session) -> DagResult<String> {
        Ok(match self.info(s)? {
            Some(info) => info.desc.clone(),
            None => format!("Node at address 0x{:x}", self.address),
        })
    }

    pub fn kind(self, s: &Session) -> DagResult<String> {
        Ok(match self.info(s)? {
            Some(info) => info.kind.clone(),
            None => "Task".to_string(),
        })
    }

    pub fn label(self, s: &Session) -> DagResult<String> {
        Ok(match s.display {
            NodeDisplay::Name => self.name(s)?,
            NodeDisplay::IdHex => format!("0x{:x}", self.id(s)?),
            NodeDisplay::Address => format!("0x{:x}", self.address),
            NodeDisplay::State => self.raw_state(s)?.to_string(),
            NodeDisplay::Id => self.id(s)?.to_string(),
        })
    }

    /// DOT attribute list, e.g. `[label="..." ... width=1 height=0.5]`.
    pub fn style(self, s: &Session) -> DagResult<String> {
        let label = escape(&self.label(s)?);
        let tooltip = escape(&self.description(s)?);
        let state = self.state(s)?;
        let shape = if self.is_checkpoint(s)? {
            "diamond"
        } else if self.kind(s)? == CHALKTALK {
            "octagon"
        } else {
            "oval"
        };
        Ok(format!(
            "[label=\"{}\" tooltip=\"{}\" fillcolor=\"{}\" color=\"{}\" shape=\"{}\" width=1 height=0.5]",
            label,
            tooltip,
            state.fill_color(),
            state.border_color(),
            shape
        ))
    }
}

fn escape(text: &str) -> String {
    text.replace('"', "\\\"")
}
