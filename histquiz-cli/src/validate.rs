//! Static checks over loaded quiz data.
use histquiz_game::{
    CorrectnessSet, EngineConfig, QuizData, ScenarioNode, is_correct_choice,
};
use serde::Serialize;
use std::collections::{HashSet, VecDeque};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Error => "error",
            Self::Warning => "warning",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub severity: Severity,
    pub code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
    pub message: String,
}

impl Issue {
    fn error(code: &'static str, node_id: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code,
            node_id: node_id.map(str::to_string),
            message: message.into(),
        }
    }

    fn warning(code: &'static str, node_id: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::error(code, node_id, message)
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub source: String,
    pub node_count: usize,
    pub network_node_count: Option<usize>,
    pub accepted_ids: usize,
    pub issues: Vec<Issue>,
}

impl ValidationReport {
    /// Report for data that could not be loaded at all.
    pub fn load_failure(source: impl Into<String>, error: &anyhow::Error) -> Self {
        Self {
            source: source.into(),
            node_count: 0,
            network_node_count: None,
            accepted_ids: 0,
            issues: vec![Issue::error("malformed-data", None, format!("{error:#}"))],
        }
    }

    pub fn errors(&self) -> impl Iterator<Item = &Issue> {
        self.issues
            .iter()
            .filter(|issue| issue.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Issue> {
        self.issues
            .iter()
            .filter(|issue| issue.severity == Severity::Warning)
    }

    #[must_use]
    pub fn passed(&self) -> bool {
        self.errors().next().is_none()
    }
}

/// Run every data check against `data` as `config` would play it.
pub fn validate_data(source: impl Into<String>, data: &QuizData, config: &EngineConfig) -> ValidationReport {
    let store = &data.store;
    let graph = data.graph.as_deref();
    let mut issues = Vec::new();

    if let Err(err) = config.validate() {
        issues.push(Issue::error("config", None, err.to_string()));
    }
    let predicate = match config.correctness.build(graph) {
        Ok(set) => Some(set),
        Err(err) => {
            issues.push(Issue::error("config", None, err.to_string()));
            None
        }
    };

    let start = config.start_node_id.as_str();
    if !store.contains(start) {
        issues.push(Issue::error(
            "missing-start",
            None,
            format!("start node '{start}' is not in the scenario"),
        ));
    }

    for err in store.dangling_references() {
        issues.push(Issue::error(
            "dangling-reference",
            Some(&err.node_id),
            err.to_string(),
        ));
    }

    if store.contains(start) {
        let reachable = reachable_from(data, start);
        for id in store.ids().filter(|id| !reachable.contains(*id)) {
            issues.push(Issue::warning(
                "unreachable",
                Some(id),
                format!("node '{id}' cannot be reached from '{start}'"),
            ));
        }
    }

    for node in store.nodes() {
        check_node(node, predicate.as_ref(), &mut issues);
        if let Some(graph) = graph {
            for choice in &node.choices {
                if let Some(id) = choice.semantic_id()
                    && !graph.contains(id)
                {
                    issues.push(Issue::warning(
                        "unknown-semantic-id",
                        Some(&node.id),
                        format!("choice '{}' is tagged '{id}', which the network does not define", choice.text),
                    ));
                }
            }
        }
    }

    log::debug!("validation found {} issues", issues.len());
    ValidationReport {
        source: source.into(),
        node_count: store.len(),
        network_node_count: graph.map(|graph| graph.node_count()),
        accepted_ids: predicate.as_ref().map_or(0, CorrectnessSet::len),
        issues,
    }
}

fn check_node(node: &ScenarioNode, predicate: Option<&CorrectnessSet>, issues: &mut Vec<Issue>) {
    if node.choices.is_empty() {
        issues.push(Issue::error(
            "no-choices",
            Some(&node.id),
            format!("node '{}' offers no choices", node.id),
        ));
        return;
    }

    if let Some(predicate) = predicate
        && !node
            .choices
            .iter()
            .any(|choice| is_correct_choice(predicate, &choice.semantic_node_id))
    {
        issues.push(Issue::error(
            "no-correct-choice",
            Some(&node.id),
            format!("node '{}' has no correct choice, so every path through it ends the game", node.id),
        ));
    }

    let mut seen = HashSet::new();
    for choice in &node.choices {
        if !seen.insert(choice.text.trim()) {
            issues.push(Issue::warning(
                "duplicate-choice-text",
                Some(&node.id),
                format!("choice text '{}' appears more than once", choice.text),
            ));
        }
    }
}

fn reachable_from<'a>(data: &'a QuizData, start: &'a str) -> HashSet<&'a str> {
    let mut seen = HashSet::from([start]);
    let mut queue = VecDeque::from([start]);
    while let Some(id) = queue.pop_front() {
        let Ok(node) = data.store.get(id) else {
            continue;
        };
        for next in node.choices.iter().filter_map(|choice| choice.next()) {
            if data.store.contains(next) && seen.insert(next) {
                queue.push_back(next);
            }
        }
    }
    seen
}
