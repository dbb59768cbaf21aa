//! Probability graph: symptom and condition nodes joined by weighted edges.
//!
//! Nodes live in an arena addressed by `NodeId`. Edges run symptom →
//! condition and are fixed at construction; only symptom values and
//! condition probabilities change afterwards.

use crate::catalog::Catalog;
use crate::error::{EngineError, Result};
use crate::evidence::{SymptomEvidence, SymptomValue};
use crate::patient::PatientContext;
use crate::posterior::Posterior;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Stable index into the node arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub usize);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymptomNode {
    pub id: String,
    pub label: String,
    pub value: SymptomValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionNode {
    pub id: String,
    pub label: String,
    pub probability: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Node {
    Symptom(SymptomNode),
    Condition(ConditionNode),
}

impl Node {
    pub fn id(&self) -> &str {
        match self {
            Node::Symptom(s) => &s.id,
            Node::Condition(c) => &c.id,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Node::Symptom(s) => &s.label,
            Node::Condition(c) => &c.label,
        }
    }

    pub fn is_symptom(&self) -> bool {
        matches!(self, Node::Symptom(_))
    }

    pub fn is_condition(&self) -> bool {
        matches!(self, Node::Condition(_))
    }

    /// True for a symptom node with a known value
    pub fn is_observed(&self) -> bool {
        match self {
            Node::Symptom(s) => s.value.is_known(),
            Node::Condition(_) => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub from: NodeId,
    pub to: NodeId,
    pub weight: f64,
}

/// Edge with node ids resolved to strings, for output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeSnapshot {
    pub from: String,
    pub to: String,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub nodes: Vec<Node>,
    pub edges: Vec<EdgeSnapshot>,
}

/// Collects nodes and edges; `build` checks integrity.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    nodes: Vec<Node>,
    edges: Vec<(String, String, f64)>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn symptom(mut self, id: &str, label: &str) -> Self {
        self.nodes.push(Node::Symptom(SymptomNode {
            id: id.to_string(),
            label: label.to_string(),
            value: SymptomValue::Unknown,
        }));
        self
    }

    pub fn condition(mut self, id: &str, label: &str) -> Self {
        self.nodes.push(Node::Condition(ConditionNode {
            id: id.to_string(),
            label: label.to_string(),
            probability: 0.0,
        }));
        self
    }

    pub fn edge(mut self, from: &str, to: &str, weight: f64) -> Self {
        self.edges.push((from.to_string(), to.to_string(), weight));
        self
    }

    pub fn build(self) -> Result<ProbabilityGraph> {
        let fail = |msg: String| Err(EngineError::GraphIntegrity(msg));

        let mut index = HashMap::with_capacity(self.nodes.len());
        for (i, node) in self.nodes.iter().enumerate() {
            if index.insert(node.id().to_string(), NodeId(i)).is_some() {
                return fail(format!("duplicate node '{}'", node.id()));
            }
        }

        let mut edges = Vec::with_capacity(self.edges.len());
        let mut incoming = vec![Vec::new(); self.nodes.len()];
        let mut outgoing = vec![Vec::new(); self.nodes.len()];
        for (from, to, weight) in &self.edges {
            let (Some(&u), Some(&v)) = (index.get(from), index.get(to)) else {
                return fail(format!("edge {} -> {} references an undefined node", from, to));
            };
            if !self.nodes[u.0].is_symptom() || !self.nodes[v.0].is_condition() {
                return fail(format!("edge {} -> {} must run symptom to condition", from, to));
            }
            if !(*weight > 0.0 && *weight <= 1.0) {
                return fail(format!("edge {} -> {} has weight {} outside (0, 1]", from, to, weight));
            }
            incoming[v.0].push(edges.len());
            outgoing[u.0].push(edges.len());
            edges.push(Edge {
                from: u,
                to: v,
                weight: *weight,
            });
        }

        let mut nodes = self.nodes;
        let condition_count = nodes.iter().filter(|n| n.is_condition()).count();
        for (i, node) in nodes.iter_mut().enumerate() {
            if let Node::Condition(c) = node {
                if incoming[i].is_empty() {
                    return fail(format!("condition '{}' has no incoming edge", c.id));
                }
                c.probability = 1.0 / condition_count as f64;
            }
        }

        Ok(ProbabilityGraph {
            nodes,
            edges,
            index,
            incoming,
            outgoing,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ProbabilityGraph {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    index: HashMap<String, NodeId>,
    incoming: Vec<Vec<usize>>,
    outgoing: Vec<Vec<usize>>,
}

impl ProbabilityGraph {
    /// Build from the catalog: symptoms first, then conditions, then each
    /// condition's edges in table order.
    pub fn from_catalog(catalog: &Catalog) -> Result<Self> {
        let mut builder = GraphBuilder::new();
        for symptom in &catalog.symptoms {
            builder = builder.symptom(&symptom.id, &symptom.label);
        }
        for condition in &catalog.conditions {
            builder = builder.condition(&condition.id, &condition.label);
        }
        for condition in &catalog.conditions {
            for edge in &condition.edges {
                builder = builder.edge(&edge.symptom, &condition.id, edge.weight);
            }
        }
        builder.build()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn find(&self, id: &str) -> Option<NodeId> {
        self.index.get(id).copied()
    }

    pub fn outgoing(&self, id: NodeId) -> impl Iterator<Item = &Edge> {
        self.outgoing[id.0].iter().map(|&e| &self.edges[e])
    }

    pub fn incoming(&self, id: NodeId) -> impl Iterator<Item = &Edge> {
        self.incoming[id.0].iter().map(|&e| &self.edges[e])
    }

    /// Record a value for an unobserved symptom node
    pub fn observe(&mut self, id: &str, value: SymptomValue) -> Result<()> {
        let node_id = self
            .find(id)
            .ok_or_else(|| EngineError::UnknownNode(id.to_string()))?;
        match &mut self.nodes[node_id.0] {
            Node::Symptom(s) if s.value.is_known() => Err(EngineError::AlreadyObserved(id.to_string())),
            Node::Symptom(s) => {
                s.value = value;
                Ok(())
            }
            Node::Condition(_) => Err(EngineError::UnknownNode(format!("{} is not a symptom", id))),
        }
    }

    /// Set every symptom value from the evidence. Symptoms the catalog does
    /// not describe stay unknown.
    pub fn populate(&mut self, catalog: &Catalog, evidence: &SymptomEvidence, patient: &PatientContext) {
        for node in &mut self.nodes {
            if let Node::Symptom(s) = node {
                s.value = match catalog.symptom(&s.id) {
                    Some(def) => evidence.observed_value(def.probe, &s.id, patient),
                    None => SymptomValue::Unknown,
                };
            }
        }
    }

    /// Write posterior probabilities into the condition nodes
    pub fn apply_posterior(&mut self, posterior: &Posterior) {
        for (id, probability) in posterior.iter() {
            if let Some(node_id) = self.index.get(id) {
                if let Node::Condition(c) = &mut self.nodes[node_id.0] {
                    c.probability = probability;
                }
            }
        }
    }

    /// Observed symptom nodes in arena order
    pub fn observed_symptoms(&self) -> Vec<NodeId> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.is_observed())
            .map(|(i, _)| NodeId(i))
            .collect()
    }

    pub fn probability(&self, condition: &str) -> Option<f64> {
        match self.find(condition).map(|id| self.node(id)) {
            Some(Node::Condition(c)) => Some(c.probability),
            _ => None,
        }
    }

    pub fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot {
            nodes: self.nodes.clone(),
            edges: self
                .edges
                .iter()
                .map(|e| EdgeSnapshot {
                    from: self.node(e.from).id().to_string(),
                    to: self.node(e.to).id().to_string(),
                    weight: e.weight,
                })
                .collect(),
        }
    }
}
