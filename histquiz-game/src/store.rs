//! Indexed, immutable view over loaded scenario nodes.
use std::collections::HashMap;
use thiserror::Error;

use crate::data::{DataError, ScenarioData, ScenarioNode};

/// A node id was requested that the store does not hold.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown scenario node '{0}'")]
pub struct UnknownNode(pub String);

/// A choice points at a node id the store does not hold.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("choice {choice_index} of node '{node_id}' points to missing node '{target}'")]
pub struct ReferenceError {
    pub node_id: String,
    pub choice_index: usize,
    pub target: String,
}

/// Scenario nodes keyed by id, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct ScenarioStore {
    nodes: Vec<ScenarioNode>,
    index: HashMap<String, usize>,
}

impl ScenarioStore {
    /// Parse and index raw scenario JSON.
    ///
    /// # Errors
    ///
    /// Returns a [`DataError`] when the JSON is malformed or node ids are
    /// blank or repeated.
    pub fn load(raw: &str) -> Result<Self, DataError> {
        Self::from_data(ScenarioData::from_json(raw)?)
    }

    /// Index already-parsed scenario data.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::EmptyId`] or [`DataError::DuplicateNode`].
    pub fn from_data(data: ScenarioData) -> Result<Self, DataError> {
        let mut index = HashMap::with_capacity(data.nodes.len());
        for (position, node) in data.nodes.iter().enumerate() {
            if node.id.trim().is_empty() {
                return Err(DataError::EmptyId { index: position });
            }
            if index.insert(node.id.clone(), position).is_some() {
                return Err(DataError::DuplicateNode {
                    id: node.id.clone(),
                });
            }
        }
        log::debug!("scenario store indexed {} nodes", data.nodes.len());
        Ok(Self {
            nodes: data.nodes,
            index,
        })
    }

    /// Look up a node by id.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownNode`] if `id` is not present.
    pub fn get(&self, id: &str) -> Result<&ScenarioNode, UnknownNode> {
        self.index
            .get(id)
            .and_then(|&position| self.nodes.get(position))
            .ok_or_else(|| UnknownNode(id.to_string()))
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Node ids in declaration order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(|node| node.id.as_str())
    }

    #[must_use]
    pub fn nodes(&self) -> &[ScenarioNode] {
        &self.nodes
    }

    /// Every choice whose successor is missing, in declaration order.
    #[must_use]
    pub fn dangling_references(&self) -> Vec<ReferenceError> {
        self.nodes
            .iter()
            .flat_map(|node| {
                node.choices
                    .iter()
                    .enumerate()
                    .filter_map(move |(choice_index, choice)| {
                        let target = choice.next()?;
                        (!self.contains(target)).then(|| ReferenceError {
                            node_id: node.id.clone(),
                            choice_index,
                            target: target.to_string(),
                        })
                    })
            })
            .collect()
    }

    /// Eager referential-integrity pass.
    ///
    /// # Errors
    ///
    /// Returns the first dangling reference found.
    pub fn validate_references(&self) -> Result<(), ReferenceError> {
        match self.dangling_references().into_iter().next() {
            Some(err) => {
                log::warn!("{err}");
                Err(err)
            }
            None => Ok(()),
        }
    }
}
