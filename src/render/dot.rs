//! Graphviz DOT rendering of a graph snapshot.
//!
//! Node attributes are re-read on every render so the output tracks live
//! state changes between discovery passes. Rendering never writes memory.

use crate::error::DagResult;
use crate::graph::{Cluster, Graph};
use crate::session::Session;

const HEADER: [&str; 4] = [
    "digraph {",
    r##"graph [style="bold, rounded" bgcolor="#ffffff00" fontname="courier"]"##,
    r#"node [style="filled, bold, rounded" fontname="calibri" fontcolor="black" shape="oval"]"#,
    r##"fillcolor="#ffffff00""##,
];

pub fn render_dot(graph: &Graph, s: &Session) -> DagResult<String> {
    let mut dots: Vec<String> = HEADER.iter().map(|l| l.to_string()).collect();

    for cluster in graph.clusters.values() {
        dots.push(render_cluster(cluster, s)?);
    }

    dots.push(format!("{}}}", graph.edge_text));
    Ok(dots.join("\n"))
}

fn render_cluster(cluster: &Cluster, s: &Session) -> DagResult<String> {
    let mut dots = Vec::with_capacity(cluster.nodes.len() + 2);

    // Ungrouped nodes must not be drawn inside a box.
    if cluster.job == 0 {
        dots.push(format!("\tsubgraph {:x} {{", cluster.job));
    } else {
        dots.push(format!("\tsubgraph cluster{:x} {{", cluster.job));
    }

    for entry in &cluster.nodes {
        dots.push(format!(
            "\t\t\"{:x}\" {}",
            entry.node.address,
            entry.node.style(s)?
        ));
    }

    dots.push("\t}\n".to_string());
    Ok(dots.join("\n"))
}
