//! Semantic network indexing and the correctness predicates built on it.
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::constants::DEFAULT_CORRECT_IDS;
use crate::data::{NetworkEdge, NetworkNode, SemanticNetwork};

/// Decides whether a semantic id counts as a historically correct answer.
///
/// Implementations never see blank ids; [`is_correct_choice`] rejects those
/// before the predicate runs.
pub trait CorrectnessPredicate {
    fn is_correct(&self, semantic_id: &str) -> bool;
}

impl<F> CorrectnessPredicate for F
where
    F: Fn(&str) -> bool,
{
    fn is_correct(&self, semantic_id: &str) -> bool {
        self(semantic_id)
    }
}

/// Apply `predicate` to a raw semantic id, treating blank ids as incorrect.
///
/// Non-blank ids reach the predicate untouched, so `" sakamoto "` is not
/// `"sakamoto"`.
pub fn is_correct_choice<P>(predicate: &P, semantic_id: &str) -> bool
where
    P: CorrectnessPredicate + ?Sized,
{
    !semantic_id.trim().is_empty() && predicate.is_correct(semantic_id)
}

/// Fixed set of accepted semantic ids.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CorrectnessSet {
    ids: HashSet<String>,
}

impl CorrectnessSet {
    #[must_use]
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ids: ids.into_iter().map(Into::into).collect(),
        }
    }

    /// The built-in allow-list of Meiji-era answers.
    #[must_use]
    pub fn default_allow_list() -> Self {
        Self::new(DEFAULT_CORRECT_IDS)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }
}

impl CorrectnessPredicate for CorrectnessSet {
    fn is_correct(&self, semantic_id: &str) -> bool {
        self.contains(semantic_id)
    }
}

/// Selects correct answers from the network: node types and edge relations
/// whose members count as correct.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GraphRule {
    #[serde(default)]
    pub types: Vec<String>,
    #[serde(default)]
    pub relations: Vec<String>,
}

impl GraphRule {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty() && self.relations.is_empty()
    }
}

/// Outgoing relation from a network node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Neighbor<'a> {
    pub target: &'a str,
    pub relation: &'a str,
}

/// Indexed semantic network.
#[derive(Debug, Clone, Default)]
pub struct SemanticGraph {
    nodes: HashMap<String, NetworkNode>,
    outgoing: HashMap<String, Vec<NetworkEdge>>,
    edge_count: usize,
}

impl SemanticGraph {
    #[must_use]
    pub fn new(network: SemanticNetwork) -> Self {
        let edge_count = network.edges.len();
        let nodes = network
            .nodes
            .into_iter()
            .map(|node| (node.id.clone(), node))
            .collect::<HashMap<_, _>>();
        let mut outgoing: HashMap<String, Vec<NetworkEdge>> = HashMap::new();
        for edge in network.edges {
            if !nodes.contains_key(&edge.source) || !nodes.contains_key(&edge.target) {
                log::warn!(
                    "semantic edge {} -[{}]-> {} references an unknown node",
                    edge.source,
                    edge.relation,
                    edge.target
                );
            }
            outgoing.entry(edge.source.clone()).or_default().push(edge);
        }
        Self {
            nodes,
            outgoing,
            edge_count,
        }
    }

    #[must_use]
    pub fn node(&self, id: &str) -> Option<&NetworkNode> {
        self.nodes.get(id)
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub const fn edge_count(&self) -> usize {
        self.edge_count
    }

    pub fn neighbors<'a>(&'a self, id: &str) -> impl Iterator<Item = Neighbor<'a>> + 'a {
        self.outgoing
            .get(id)
            .into_iter()
            .flatten()
            .map(|edge| Neighbor {
                target: edge.target.as_str(),
                relation: edge.relation.as_str(),
            })
    }

    pub fn nodes_of_type<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a NetworkNode> + 'a {
        self.nodes.values().filter(move |node| node.kind == kind)
    }

    /// Collapse `rule` into a concrete set of correct ids.
    #[must_use]
    pub fn correct_set(&self, rule: &GraphRule) -> CorrectnessSet {
        let by_type = self
            .nodes
            .values()
            .filter(|node| rule.types.iter().any(|kind| *kind == node.kind))
            .map(|node| node.id.clone());
        let by_relation = self
            .outgoing
            .values()
            .flatten()
            .filter(|edge| rule.relations.iter().any(|rel| *rel == edge.relation))
            .map(|edge| edge.target.clone());
        CorrectnessSet::new(by_type.chain(by_relation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn network() -> SemanticNetwork {
        SemanticNetwork::from_json(
            r#"{
                "nodes": [
                    { "id": "sakamoto", "label": "Sakamoto Ryoma", "type": "person" },
                    { "id": "satsucho", "label": "Satsuma-Choshu Alliance", "type": "event" },
                    { "id": "shogunate", "label": "Tokugawa Shogunate", "type": "institution" },
                    { "id": "restoration", "label": "Meiji Restoration", "type": "event" }
                ],
                "edges": [
                    { "source": "sakamoto", "target": "satsucho", "relation": "mediated" },
                    { "source": "satsucho", "target": "restoration", "relation": "led_to" },
                    { "source": "restoration", "target": "shogunate", "relation": "abolished" }
                ]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn blank_ids_are_never_correct() {
        let accept_all = |_: &str| true;
        assert!(!is_correct_choice(&accept_all, ""));
        assert!(!is_correct_choice(&accept_all, "   "));
        assert!(is_correct_choice(&accept_all, "anything"));
    }

    #[test]
    fn default_allow_list_matches_known_answers() {
        let set = CorrectnessSet::default_allow_list();
        assert_eq!(set.len(), 8);
        for id in DEFAULT_CORRECT_IDS {
            assert!(is_correct_choice(&set, id), "{id} should be correct");
        }
        assert!(!is_correct_choice(&set, "shogunate"));
        assert!(!is_correct_choice(&set, "Sakamoto"));
        assert!(!is_correct_choice(&set, " sakamoto "));
        assert!(!is_correct_choice(&set, "sakamoto\n"));
    }

    #[test]
    fn graph_indexes_neighbors_and_types() {
        let graph = SemanticGraph::new(network());
        assert_eq!(graph.node_count(), 4);
        assert_eq!(graph.edge_count(), 3);
        let neighbors: Vec<_> = graph.neighbors("sakamoto").collect();
        assert_eq!(
            neighbors,
            [Neighbor {
                target: "satsucho",
                relation: "mediated"
            }]
        );
        assert_eq!(graph.neighbors("unknown").count(), 0);
        assert_eq!(graph.nodes_of_type("event").count(), 2);
        assert_eq!(graph.node("shogunate").unwrap().label, "Tokugawa Shogunate");
    }

    #[test]
    fn graph_rule_collects_types_and_relation_targets() {
        let graph = SemanticGraph::new(network());
        let set = graph.correct_set(&GraphRule {
            types: vec!["person".to_string()],
            relations: vec!["led_to".to_string()],
        });
        assert!(set.contains("sakamoto"));
        assert!(set.contains("restoration"));
        assert!(!set.contains("satsucho"));
        assert!(!set.contains("shogunate"));
    }
}
