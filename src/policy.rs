use crate::catalog::TableDescriptor;
use crate::graph::RelationshipGraph;
use crate::model::ColumnRef;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which editor a graph belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GraphScope {
    #[default]
    Schema,
    Federation,
}

impl GraphScope {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "schema" => Some(Self::Schema),
            "federation" | "federated" => Some(Self::Federation),
            _ => None,
        }
    }

    /// Build the policy enforcing this scope.
    pub fn policy(self) -> Box<dyn ConnectionPolicy> {
        match self {
            Self::Schema => Box::new(SchemaPolicy),
            Self::Federation => Box::new(FederationPolicy),
        }
    }
}

impl fmt::Display for GraphScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Schema => f.write_str("schema"),
            Self::Federation => f.write_str("federation"),
        }
    }
}

/// An edge whose endpoints have already been resolved against the graph.
#[derive(Debug, Clone, Copy)]
pub struct ProposedEdge<'a> {
    pub source: &'a ColumnRef,
    pub target: &'a ColumnRef,
    pub source_table: &'a TableDescriptor,
    pub target_table: &'a TableDescriptor,
}

impl ProposedEdge<'_> {
    pub fn crosses_connections(&self) -> bool {
        self.source_table.connection_id != self.target_table.connection_id
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Allow,
    Reject(String),
}

impl Verdict {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Verdict::Allow)
    }
}

/// Decides which proposed relationships a graph admits.
pub trait ConnectionPolicy: fmt::Debug {
    fn scope(&self) -> GraphScope;

    /// Decide whether `edge` may enter `graph`. Must not depend on anything
    /// but its arguments.
    fn evaluate(&self, edge: &ProposedEdge<'_>, graph: &RelationshipGraph) -> Verdict;
}

/// Same-connection joins only.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaPolicy;

impl ConnectionPolicy for SchemaPolicy {
    fn scope(&self) -> GraphScope {
        GraphScope::Schema
    }

    fn evaluate(&self, edge: &ProposedEdge<'_>, _graph: &RelationshipGraph) -> Verdict {
        if edge.crosses_connections() {
            return Verdict::Reject(format!(
                "Schema relationships must stay within one connection ({} is on {}, {} is on {})",
                edge.source_table.name,
                edge.source_table.connection_id,
                edge.target_table.name,
                edge.target_table.connection_id,
            ));
        }
        if edge.source == edge.target {
            return Verdict::Reject(format!("Column {} cannot join itself", edge.source));
        }
        Verdict::Allow
    }
}

/// Cross-connection joins only.
#[derive(Debug, Clone, Copy, Default)]
pub struct FederationPolicy;

impl ConnectionPolicy for FederationPolicy {
    fn scope(&self) -> GraphScope {
        GraphScope::Federation
    }

    fn evaluate(&self, edge: &ProposedEdge<'_>, _graph: &RelationshipGraph) -> Verdict {
        if edge.crosses_connections() {
            Verdict::Allow
        } else {
            Verdict::Reject("Federation is for cross-database relationships only".to_string())
        }
    }
}
