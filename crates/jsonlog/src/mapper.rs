// jsonlog/mapper.rs
// Connection graph rendering - companion artifact next to analysis.json

use std::collections::HashMap;
use std::path::Path;

use thug_core::JsonLogError;

use crate::document::Report;
use crate::storage::{ContentStore, FsContentStore};

pub const GRAPH_FILE: &str = "graph.dot";

/// Turns a finished report into a visual artifact inside `dir`
pub trait GraphRenderer {
    fn render(&self, report: &Report, dir: &Path) -> Result<(), JsonLogError>;
}

/// Renders nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NullRenderer;

impl GraphRenderer for NullRenderer {
    fn render(&self, _report: &Report, _dir: &Path) -> Result<(), JsonLogError> {
        Ok(())
    }
}

/// Graphviz DOT rendering of the connection graph.
/// Nodes are distinct URLs, edges are connections labelled by method.
#[derive(Debug, Clone, Copy, Default)]
pub struct DotMapper;

impl DotMapper {
    pub fn to_dot(report: &Report) -> String {
        let mut nodes = Nodes::default();
        if let Some(url) = report.url.as_deref() {
            nodes.id(url);
        }

        let edges: Vec<(usize, usize, &str, bool)> = report
            .connections
            .iter()
            .map(|c| {
                (
                    nodes.id(&c.source),
                    nodes.id(&c.destination),
                    c.method.as_str(),
                    c.flags.exploit,
                )
            })
            .collect();

        let mut dot = String::from("digraph analysis {\n");
        dot.push_str("    rankdir=LR;\n");
        dot.push_str("    node [shape=box, fontsize=10];\n");

        for (id, url) in nodes.order.iter().enumerate() {
            let root = report.url.as_deref() == Some(*url);
            dot.push_str(&format!(
                "    n{} [label=\"{}\"{}];\n",
                id,
                Self::escape(url),
                if root { ", style=bold" } else { "" }
            ));
        }

        for (src, dst, method, exploit) in edges {
            dot.push_str(&format!(
                "    n{} -> n{} [label=\"{}\"{}];\n",
                src,
                dst,
                Self::escape(method),
                if exploit { ", color=red" } else { "" }
            ));
        }

        dot.push_str("}\n");
        dot
    }

    fn escape(s: &str) -> String {
        s.replace('\\', "\\\\").replace('"', "\\\"")
    }
}

/// URL -> node id, in first-seen order
#[derive(Default)]
struct Nodes<'a> {
    ids: HashMap<&'a str, usize>,
    order: Vec<&'a str>,
}

impl<'a> Nodes<'a> {
    fn id(&mut self, url: &'a str) -> usize {
        if let Some(id) = self.ids.get(url) {
            return *id;
        }
        self.order.push(url);
        self.ids.insert(url, self.order.len() - 1);
        self.order.len() - 1
    }
}

impl GraphRenderer for DotMapper {
    fn render(&self, report: &Report, dir: &Path) -> Result<(), JsonLogError> {
        let dot = Self::to_dot(report);
        let path = FsContentStore.store_content(dir, GRAPH_FILE, dot.as_bytes())?;
        tracing::debug!("connection graph written to {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{ConnectionEntry, ConnectionFlags};
    use thug_core::RunOptions;

    fn connection(src: &str, dst: &str, method: &str, flags: ConnectionFlags) -> ConnectionEntry {
        ConnectionEntry {
            source: src.to_string(),
            destination: dst.to_string(),
            method: method.to_string(),
            flags,
        }
    }

    #[test]
    fn test_dot_nodes_are_deduplicated() {
        let mut report = Report::new("test", &RunOptions::default());
        report.url = Some("http://a/".to_string());
        report
            .connections
            .push(connection("http://a/", "http://b/", "iframe", ConnectionFlags::default()));
        report
            .connections
            .push(connection("http://b/", "http://a/", "href", ConnectionFlags::exploit()));

        let dot = DotMapper::to_dot(&report);

        assert_eq!(dot.matches("[label=\"http://").count(), 2);
        assert!(dot.contains("n0 [label=\"http://a/\", style=bold];"));
        assert!(dot.contains("n0 -> n1 [label=\"iframe\"];"));
        assert!(dot.contains("n1 -> n0 [label=\"href\", color=red];"));
    }

    #[test]
    fn test_dot_escapes_quotes() {
        let mut report = Report::new("test", &RunOptions::default());
        report.connections.push(connection(
            "http://a/?q=\"x\"",
            "http://b/",
            "window.open",
            ConnectionFlags::default(),
        ));

        let dot = DotMapper::to_dot(&report);
        assert!(dot.contains(r#"label="http://a/?q=\"x\"""#));
    }
}
