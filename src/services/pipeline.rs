// Pipeline service: loads the board (deals without lost ones, plus
// contacts for owner names) and renders its columns.

use serde::Serialize;

use crate::gateway::RecordGateway;
use crate::pipeline::{BoardColumn, PipelineBoard};

pub const EMPTY_PIPELINE: &str = "No deals yet";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineData {
    pub columns: Vec<BoardColumn>,
    pub deal_count: usize,
}

impl PipelineData {
    pub fn from_board(board: &PipelineBoard) -> Self {
        Self {
            columns: board.columns(),
            deal_count: board.deals().len(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum PipelineResult {
    Success { data: PipelineData },
    Empty { message: String },
    Error { message: String },
}

/// Fetch deals and contacts concurrently and build a fresh board.
pub async fn load_board(gateway: &dyn RecordGateway) -> Result<PipelineBoard, crate::error::CrmError> {
    let (deals, contacts) = tokio::try_join!(
        super::deals::fetch_all(gateway),
        super::contacts::fetch_all(gateway),
    )?;
    Ok(PipelineBoard::new(deals, &contacts))
}

pub async fn load_pipeline(gateway: &dyn RecordGateway) -> PipelineResult {
    match load_board(gateway).await {
        Ok(board) if board.is_empty() => PipelineResult::Empty {
            message: EMPTY_PIPELINE.to_string(),
        },
        Ok(board) => PipelineResult::Success {
            data: PipelineData::from_board(&board),
        },
        Err(e) => {
            log::error!("Failed to load pipeline data: {}", e);
            PipelineResult::Error {
                message: e.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::memory::{MemoryGateway, Op};
    use crate::gateway::RecordKind;
    use crate::types::DealStage;
    use serde_json::json;

    #[tokio::test]
    async fn test_pipeline_states() {
        let gw = MemoryGateway::new();
        assert!(matches!(load_pipeline(&gw).await, PipelineResult::Empty { .. }));

        gw.seed(RecordKind::Deal, json!({ "Id": 1, "stage_c": "closed-lost" }));
        assert!(matches!(load_pipeline(&gw).await, PipelineResult::Empty { .. }));

        gw.seed(RecordKind::Deal, json!({ "Id": 2, "stage_c": "proposal", "value_c": 75 }));
        match load_pipeline(&gw).await {
            PipelineResult::Success { data } => {
                assert_eq!(data.deal_count, 1);
                let proposal = data
                    .columns
                    .iter()
                    .find(|c| c.stage == DealStage::Proposal)
                    .unwrap();
                assert_eq!(proposal.value, 75.0);
                assert_eq!(proposal.cards[0].contact_name, "Unknown");
            }
            other => panic!("expected success, got {:?}", other),
        }

        gw.fail(Op::List, RecordKind::Contact);
        assert!(matches!(load_pipeline(&gw).await, PipelineResult::Error { .. }));
    }
}
