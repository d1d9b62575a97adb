//! Undirected weighted graph built from a correlation matrix.

use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use tracing::debug;

use crate::core::matrix::CorrelationMatrix;
use crate::error::{Result, VizError};

/// One undirected edge as `(first, second, weight)` with `first < second`
/// in node order.
pub type WeightedEdge = (usize, usize, f64);

/// Nodes are variable labels in column order, edges carry the correlation.
#[derive(Debug, Clone)]
pub struct CorrelationGraph {
    graph: UnGraph<String, f64>,
}

impl CorrelationGraph {
    /// Validate `matrix`, then add every column as a node and one edge per
    /// distinct pair with a present weight.
    pub fn from_matrix(matrix: &CorrelationMatrix) -> Result<Self> {
        matrix.validate()?;

        let n = matrix.len();
        let mut graph = UnGraph::with_capacity(n, n * n.saturating_sub(1) / 2);
        let nodes: Vec<NodeIndex> = matrix
            .labels()
            .iter()
            .map(|label| graph.add_node(label.clone()))
            .collect();

        for i in 0..n {
            for j in (i + 1)..n {
                if let Some(weight) = matrix.get(i, j) {
                    graph.add_edge(nodes[i], nodes[j], weight);
                }
            }
        }

        debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "built correlation graph"
        );
        Ok(Self { graph })
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Node labels in insertion (column) order.
    pub fn node_labels(&self) -> Vec<&str> {
        self.graph.node_weights().map(String::as_str).collect()
    }

    pub fn node_index(&self, label: &str) -> Option<usize> {
        self.graph
            .node_indices()
            .find(|&idx| self.graph[idx] == label)
            .map(NodeIndex::index)
    }

    /// All edges, each pair reported once with the lower node index first.
    pub fn edges(&self) -> Vec<WeightedEdge> {
        self.graph
            .edge_references()
            .map(|e| {
                let (a, b) = (e.source().index(), e.target().index());
                (a.min(b), a.max(b), *e.weight())
            })
            .collect()
    }

    /// Weight of the edge between two nodes, if present.
    pub fn edge_weight(&self, a: usize, b: usize) -> Option<f64> {
        let edge = self
            .graph
            .find_edge(NodeIndex::new(a), NodeIndex::new(b))?;
        self.graph.edge_weight(edge).copied()
    }

    pub fn degree(&self, node: usize) -> usize {
        self.graph.edges(NodeIndex::new(node)).count()
    }

    pub fn self_loop_count(&self) -> usize {
        self.graph
            .edge_references()
            .filter(|e| e.source() == e.target())
            .count()
    }

    /// Mean absolute weight over the node's incident edges.
    pub fn avg_edge_weight(&self, node: usize) -> Result<f64> {
        let idx = NodeIndex::new(node);
        let label = self
            .graph
            .node_weight(idx)
            .ok_or_else(|| VizError::InvalidValue(format!("node index {node} out of range")))?;

        let weights: Vec<f64> = self.graph.edges(idx).map(|e| e.weight().abs()).collect();
        if weights.is_empty() {
            return Err(VizError::NoIncidentEdges(label.clone()));
        }
        Ok(weights.iter().sum::<f64>() / weights.len() as f64)
    }
}
