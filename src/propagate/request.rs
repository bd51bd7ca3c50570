//! Operator forced-state requests: `(node address in hex, desired state)`.

use anyhow::{Context, bail};
use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForceRequest {
    pub node: u32,
    /// Raw target; values outside 0..=3 are accepted and ignored downstream.
    pub state: u32,
}

impl ForceRequest {
    pub fn new(node: u32, state: u32) -> Self {
        Self { node, state }
    }

    /// Parse a node address such as `3f1a20` or `0x3F1A20`.
    pub fn parse_node(text: &str) -> anyhow::Result<u32> {
        let re = Regex::new(r"^\s*(?:0[xX])?([0-9a-fA-F]{1,8})\s*$")?;
        let Some(caps) = re.captures(text) else {
            bail!("node address must be hex: {:?}", text);
        };
        let digits = caps.get(1).map_or("", |m| m.as_str());
        u32::from_str_radix(digits, 16).with_context(|| format!("bad node address {}", text))
    }

    /// Parse `<address>=<state>`, e.g. `0x3f1a20=2`.
    pub fn parse(text: &str) -> anyhow::Result<Self> {
        let (node, state) = text
            .split_once('=')
            .with_context(|| format!("expected <address>=<state>: {:?}", text))?;
        let state = state
            .trim()
            .parse::<u32>()
            .with_context(|| format!("bad state in {:?}", text))?;
        Ok(Self::new(Self::parse_node(node)?, state))
    }
}
