use serde::{Deserialize, Serialize};

use crate::db::StoreError;
use crate::features::FeatureState;
use crate::models::{Score, ScoreFilter};

/// Scores matching every set field
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListScoresQuery {
    #[serde(default)]
    pub student_id: Option<String>,
    #[serde(default)]
    pub uploaded_by: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListScoresResponse {
    pub results: Vec<Score>,
    pub total: usize,
}

impl From<ListScoresQuery> for ScoreFilter {
    fn from(query: ListScoresQuery) -> Self {
        let non_blank = |v: Option<String>| {
            v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
        };
        ScoreFilter {
            student_id: non_blank(query.student_id),
            uploaded_by: non_blank(query.uploaded_by),
        }
    }
}

#[tracing::instrument(skip(state))]
pub async fn handle(
    state: &FeatureState,
    query: ListScoresQuery,
) -> Result<ListScoresResponse, StoreError> {
    let results = state.store.list_scores(&query.into()).await?;
    Ok(ListScoresResponse {
        total: results.len(),
        results,
    })
}
