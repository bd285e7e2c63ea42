use crate::graph::{GraphError, RelationshipGraph};
use crate::model::{Cardinality, ColumnRef, JoinType, Provenance, RelationshipDraft, RelationshipId};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

pub type SuggestionId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionState {
    Pending,
    Accepted,
    Rejected,
}

impl fmt::Display for SuggestionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => f.write_str("pending"),
            Self::Accepted => f.write_str("accepted"),
            Self::Rejected => f.write_str("rejected"),
        }
    }
}

/// Optional relationship shape proposed by the analyzer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipHint {
    #[serde(default)]
    pub cardinality: Option<Cardinality>,
    #[serde(default)]
    pub join_type: Option<JoinType>,
}

/// One item of the external suggestion feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionInput {
    pub source_ref: String,
    pub target_ref: String,
    pub confidence: f64,
    #[serde(default)]
    pub warning: Option<String>,
    #[serde(default)]
    pub hint: Option<RelationshipHint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub id: SuggestionId,
    pub source: ColumnRef,
    pub target: ColumnRef,
    pub confidence: f64,
    pub warning: Option<String>,
    pub hint: Option<RelationshipHint>,
    pub state: SuggestionState,
    /// Set once accepted
    pub relationship_id: Option<RelationshipId>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedSuggestion {
    /// Position in the submitted batch
    pub index: usize,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestReport {
    pub ids: Vec<SuggestionId>,
    pub skipped: Vec<SkippedSuggestion>,
}

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("Unknown suggestion: {0}")]
    UnknownSuggestion(SuggestionId),
    #[error("Suggestion {id} is already {state}")]
    AlreadyJudged { id: SuggestionId, state: SuggestionState },
    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// Pending, accepted and rejected suggestions. A suggestion leaves `pending`
/// exactly once; nothing is accepted or rejected automatically.
#[derive(Debug, Clone)]
pub struct SuggestionLedger {
    pending: Vec<Suggestion>,
    accepted: Vec<Suggestion>,
    rejected: Vec<Suggestion>,
    /// Ids in the order they left `pending`
    judged: Vec<SuggestionId>,
    next_seq: u64,
    default_cardinality: Cardinality,
    default_join_type: JoinType,
}

impl Default for SuggestionLedger {
    fn default() -> Self {
        Self::with_defaults(Cardinality::OneToMany, JoinType::Full)
    }
}

impl SuggestionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ledger whose accepted suggestions fall back to the given shape.
    pub fn with_defaults(cardinality: Cardinality, join_type: JoinType) -> Self {
        Self {
            pending: Vec::new(),
            accepted: Vec::new(),
            rejected: Vec::new(),
            judged: Vec::new(),
            next_seq: 1,
            default_cardinality: cardinality,
            default_join_type: join_type,
        }
    }

    /// Append a batch to `pending`. Malformed items are skipped and reported;
    /// candidates already judged are not deduplicated.
    pub fn ingest(&mut self, batch: Vec<SuggestionInput>) -> IngestReport {
        let mut report = IngestReport::default();

        for (index, input) in batch.into_iter().enumerate() {
            match Self::validate(&input) {
                Ok((source, target)) => {
                    let id = format!("sug-{}", self.next_seq);
                    self.next_seq += 1;
                    self.pending.push(Suggestion {
                        id: id.clone(),
                        source,
                        target,
                        confidence: input.confidence,
                        warning: input.warning,
                        hint: input.hint,
                        state: SuggestionState::Pending,
                        relationship_id: None,
                    });
                    report.ids.push(id);
                }
                Err(reason) => {
                    tracing::warn!(index, %reason, "suggestion skipped");
                    report.skipped.push(SkippedSuggestion { index, reason });
                }
            }
        }

        tracing::info!(
            ingested = report.ids.len(),
            skipped = report.skipped.len(),
            "suggestion batch ingested"
        );
        report
    }

    fn validate(input: &SuggestionInput) -> Result<(ColumnRef, ColumnRef), String> {
        let source: ColumnRef = input.source_ref.parse().map_err(|e| format!("{e}"))?;
        let target: ColumnRef = input.target_ref.parse().map_err(|e| format!("{e}"))?;
        if !input.confidence.is_finite() || !(0.0..=1.0).contains(&input.confidence) {
            return Err(format!("Confidence {} outside [0, 1]", input.confidence));
        }
        Ok((source, target))
    }

    /// Promote a pending suggestion into `graph`.
    ///
    /// If the graph refuses the relationship the suggestion stays pending and
    /// the graph error is returned.
    pub fn accept(
        &mut self,
        id: &str,
        graph: &mut RelationshipGraph,
    ) -> Result<RelationshipId, LedgerError> {
        let idx = self.pending_index(id)?;
        let suggestion = &self.pending[idx];
        let hint = suggestion.hint.unwrap_or_default();

        let draft = RelationshipDraft::new(suggestion.source.clone(), suggestion.target.clone())
            .cardinality(hint.cardinality.unwrap_or(self.default_cardinality))
            .join_type(hint.join_type.unwrap_or(self.default_join_type))
            .provenance(Provenance::Suggested);
        let relationship_id = graph.add_relationship(draft)?;

        let mut suggestion = self.pending.remove(idx);
        suggestion.state = SuggestionState::Accepted;
        suggestion.relationship_id = Some(relationship_id.clone());
        tracing::info!(
            suggestion = %id,
            relationship = %relationship_id,
            confidence = suggestion.confidence,
            "suggestion accepted"
        );
        self.judged.push(suggestion.id.clone());
        self.accepted.push(suggestion);
        Ok(relationship_id)
    }

    pub fn reject(&mut self, id: &str) -> Result<(), LedgerError> {
        let idx = self.pending_index(id)?;
        let mut suggestion = self.pending.remove(idx);
        suggestion.state = SuggestionState::Rejected;
        tracing::info!(suggestion = %id, "suggestion rejected");
        self.judged.push(suggestion.id.clone());
        self.rejected.push(suggestion);
        Ok(())
    }

    fn pending_index(&self, id: &str) -> Result<usize, LedgerError> {
        if let Some(idx) = self.pending.iter().position(|s| s.id == id) {
            return Ok(idx);
        }
        match self.get(id) {
            Some(s) => Err(LedgerError::AlreadyJudged {
                id: id.to_string(),
                state: s.state,
            }),
            None => Err(LedgerError::UnknownSuggestion(id.to_string())),
        }
    }

    pub fn pending(&self) -> &[Suggestion] {
        &self.pending
    }

    pub fn accepted(&self) -> &[Suggestion] {
        &self.accepted
    }

    pub fn rejected(&self) -> &[Suggestion] {
        &self.rejected
    }

    pub fn get(&self, id: &str) -> Option<&Suggestion> {
        self.pending
            .iter()
            .chain(&self.accepted)
            .chain(&self.rejected)
            .find(|s| s.id == id)
    }

    /// Pending suggestions, most confident first; ties keep arrival order.
    pub fn pending_by_confidence(&self) -> Vec<&Suggestion> {
        let mut out: Vec<&Suggestion> = self.pending.iter().collect();
        out.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(Ordering::Equal)
        });
        out
    }

    /// Latest verdict on the same candidate pair, if any was judged.
    ///
    /// The ledger itself never filters re-delivered candidates; callers may.
    pub fn previous_verdict(&self, source: &ColumnRef, target: &ColumnRef) -> Option<SuggestionState> {
        self.judged
            .iter()
            .rev()
            .filter_map(|id| self.get(id))
            .find(|s| &s.source == source && &s.target == target)
            .map(|s| s.state)
    }
}
