use crate::calc::{AnnualResults, SequenceResults, TermResults};
use crate::config::EngineConfig;
use crate::model::{ResultView, Sequence, Snapshot};
use crate::report::ResultSetRef;
use serde::Deserialize;
use std::collections::BTreeMap;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// Result sets from the last explicit recompute. Replaced wholesale, never
/// patched.
#[derive(Debug, Default)]
pub struct ResultCache {
    pub sequences: BTreeMap<Sequence, SequenceResults>,
    pub terms: Option<Vec<TermResults>>,
    pub annual: Option<AnnualResults>,
}

impl ResultCache {
    pub fn view(&self, view: ResultView) -> Option<ResultSetRef<'_>> {
        match view {
            ResultView::Sequence(seq) => self.sequences.get(&seq).map(ResultSetRef::Sequence),
            ResultView::Term(term) => self
                .terms
                .as_ref()
                .and_then(|ts| ts.iter().find(|t| t.term == term))
                .map(ResultSetRef::Term),
            ResultView::Annual => self.annual.as_ref().map(ResultSetRef::Annual),
        }
    }
}

pub struct AppState {
    pub config: EngineConfig,
    pub snapshot: Option<Snapshot>,
    pub results: ResultCache,
}

impl AppState {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            snapshot: None,
            results: ResultCache::default(),
        }
    }
}
