//! Pipeline board and the drag-and-drop stage transition flow.
//!
//! A gesture moves through `Idle -> Dragging -> Committing -> Idle`. Only
//! a drop onto a different board column issues a remote update, and that
//! update carries the stage field alone. The local deal list changes only
//! after the record service confirms, and in place (no reload).
//!
//! While a commit is in flight every new drag-start or drop is rejected
//! with `CrmError::CommitInFlight`.

use std::collections::HashMap;

use serde::Serialize;

use crate::error::CrmError;
use crate::gateway::RecordGateway;
use crate::metrics::stage_column_totals;
use crate::notification::Notifier;
use crate::services::deals;
use crate::types::{Contact, Deal, DealStage, RecordId, UNKNOWN_NAME};

pub const STAGE_UPDATED: &str = "Deal stage updated";
pub const STAGE_UPDATE_FAILED: &str = "Failed to update deal stage";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum DragState {
    #[default]
    Idle,
    #[serde(rename_all = "camelCase")]
    Dragging { deal_id: RecordId, from: DealStage },
    #[serde(rename_all = "camelCase")]
    Committing {
        deal_id: RecordId,
        from: DealStage,
        to: DealStage,
    },
}

/// A stage change accepted by `begin_drop` and awaiting the remote update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingMove {
    pub deal_id: RecordId,
    pub from: DealStage,
    pub to: DealStage,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DropOutcome {
    /// Same column, outside any column, or no drag in progress.
    Unchanged,
    Moved { deal_id: RecordId, to: DealStage },
    Failed { deal_id: RecordId, message: String },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardCard {
    pub deal: Deal,
    pub contact_name: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardColumn {
    pub stage: DealStage,
    pub label: &'static str,
    pub count: usize,
    pub value: f64,
    pub cards: Vec<BoardCard>,
}

#[derive(Debug, Clone, Default)]
pub struct PipelineBoard {
    deals: Vec<Deal>,
    contact_names: HashMap<RecordId, String>,
    drag: DragState,
}

impl PipelineBoard {
    /// Lost deals never appear on the board.
    pub fn new(deals: Vec<Deal>, contacts: &[Contact]) -> Self {
        let deals = deals.into_iter().filter(|d| !d.stage.is_lost()).collect();
        let contact_names = contacts
            .iter()
            .map(|c| (c.id, c.display_name()))
            .collect();
        Self {
            deals,
            contact_names,
            drag: DragState::Idle,
        }
    }

    pub fn deals(&self) -> &[Deal] {
        &self.deals
    }

    pub fn deal(&self, id: RecordId) -> Option<&Deal> {
        self.deals.iter().find(|d| d.id == id)
    }

    pub fn drag_state(&self) -> DragState {
        self.drag
    }

    pub fn is_empty(&self) -> bool {
        self.deals.is_empty()
    }

    /// Drop a deal after a confirmed delete.
    pub fn remove(&mut self, id: RecordId) -> bool {
        let before = self.deals.len();
        self.deals.retain(|d| d.id != id);
        self.deals.len() != before
    }

    /// Insert or replace a deal after a confirmed save. A deal saved as
    /// lost leaves the board.
    pub fn upsert(&mut self, deal: Deal) {
        if deal.stage.is_lost() {
            self.remove(deal.id);
            return;
        }
        match self.deals.iter_mut().find(|d| d.id == deal.id) {
            Some(existing) => *existing = deal,
            None => self.deals.push(deal),
        }
    }

    /// Owner name from the loaded contacts, then the expanded reference.
    pub fn contact_name(&self, deal: &Deal) -> String {
        let Some(reference) = deal.contact.as_ref() else {
            return UNKNOWN_NAME.to_string();
        };
        self.contact_names
            .get(&reference.id)
            .filter(|n| !n.is_empty())
            .cloned()
            .or_else(|| reference.name.clone().filter(|n| !n.is_empty()))
            .unwrap_or_else(|| UNKNOWN_NAME.to_string())
    }

    pub fn columns(&self) -> Vec<BoardColumn> {
        stage_column_totals(&self.deals)
            .into_iter()
            .map(|total| BoardColumn {
                stage: total.stage,
                label: total.stage.label(),
                count: total.count,
                value: total.value,
                cards: self
                    .deals
                    .iter()
                    .filter(|d| d.stage == total.stage)
                    .map(|d| BoardCard {
                        contact_name: self.contact_name(d),
                        deal: d.clone(),
                    })
                    .collect(),
            })
            .collect()
    }

    pub fn drag_start(&mut self, deal_id: RecordId) -> Result<(), CrmError> {
        if let DragState::Committing { deal_id, .. } = self.drag {
            return Err(CrmError::CommitInFlight(deal_id));
        }
        let from = self
            .deal(deal_id)
            .map(|d| d.stage)
            .ok_or(CrmError::NotOnBoard(deal_id))?;
        self.drag = DragState::Dragging { deal_id, from };
        Ok(())
    }

    /// Drag ended without a drop. Has no effect on an in-flight commit.
    pub fn drag_end(&mut self) {
        if let DragState::Dragging { .. } = self.drag {
            self.drag = DragState::Idle;
        }
    }

    /// Resolve a drop. `None` means the pointer was outside every column.
    ///
    /// Returns the move to commit, or `None` when the drop changes nothing.
    pub fn begin_drop(&mut self, target: Option<DealStage>) -> Result<Option<PendingMove>, CrmError> {
        match self.drag {
            DragState::Committing { deal_id, .. } => Err(CrmError::CommitInFlight(deal_id)),
            DragState::Idle => Ok(None),
            DragState::Dragging { deal_id, from } => {
                let to = match target {
                    Some(stage) if stage.is_board_stage() && stage != from => stage,
                    _ => {
                        self.drag = DragState::Idle;
                        return Ok(None);
                    }
                };
                self.drag = DragState::Committing { deal_id, from, to };
                Ok(Some(PendingMove { deal_id, from, to }))
            }
        }
    }

    /// Apply the remote result of a pending move and return to `Idle`.
    pub fn complete(
        &mut self,
        pending: PendingMove,
        result: Result<(), CrmError>,
        notifier: &dyn Notifier,
    ) -> DropOutcome {
        self.drag = DragState::Idle;
        match result {
            Ok(()) => {
                if let Some(deal) = self.deals.iter_mut().find(|d| d.id == pending.deal_id) {
                    deal.stage = pending.to;
                }
                log::info!(
                    "Deal {} moved {} -> {}",
                    pending.deal_id,
                    pending.from,
                    pending.to
                );
                notifier.success(STAGE_UPDATED);
                DropOutcome::Moved {
                    deal_id: pending.deal_id,
                    to: pending.to,
                }
            }
            Err(e) => {
                log::error!("Failed to move deal {} to {}: {}", pending.deal_id, pending.to, e);
                notifier.error(STAGE_UPDATE_FAILED);
                DropOutcome::Failed {
                    deal_id: pending.deal_id,
                    message: e.to_string(),
                }
            }
        }
    }

    /// Full drop: resolve the target, send the stage-only update, reconcile.
    ///
    /// An update that comes back without the saved record counts as failed.
    pub async fn drop_on(
        &mut self,
        target: Option<DealStage>,
        gateway: &dyn RecordGateway,
        notifier: &dyn Notifier,
    ) -> Result<DropOutcome, CrmError> {
        let Some(pending) = self.begin_drop(target)? else {
            return Ok(DropOutcome::Unchanged);
        };
        let result = deals::update_stage(gateway, pending.deal_id, pending.to)
            .await
            .map(|_| ());
        Ok(self.complete(pending, result, notifier))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::memory::{GatewayCall, MemoryGateway, Op};
    use crate::gateway::{ListQuery, RecordKind};
    use crate::notification::{MemoryNotifier, NoticeLevel};
    use crate::types::{Fields, Reference};
    use async_trait::async_trait;
    use serde_json::{json, Value};

    /// Accepts every write but never hands back the written record,
    /// like an envelope whose per-record results all failed.
    struct NoRecordGateway;

    #[async_trait]
    impl RecordGateway for NoRecordGateway {
        fn backend_tag(&self) -> &'static str {
            "no-record"
        }

        async fn list(&self, _kind: RecordKind, _query: &ListQuery) -> Result<Vec<Value>, CrmError> {
            Ok(Vec::new())
        }

        async fn get_by_id(&self, kind: RecordKind, id: RecordId) -> Result<Value, CrmError> {
            Err(CrmError::NotFound { kind, id })
        }

        async fn create(&self, _kind: RecordKind, _fields: Fields) -> Result<Option<Value>, CrmError> {
            Ok(None)
        }

        async fn update(
            &self,
            _kind: RecordKind,
            _id: RecordId,
            _fields: Fields,
        ) -> Result<Option<Value>, CrmError> {
            Ok(None)
        }

        async fn delete(&self, _kind: RecordKind, _id: RecordId) -> Result<(), CrmError> {
            Ok(())
        }

        async fn invoke_function(&self, _name: &str, _payload: Value) -> Result<Value, CrmError> {
            Ok(Value::Null)
        }
    }

    fn deal(id: RecordId, stage: DealStage, value: f64) -> Deal {
        Deal {
            id,
            title: format!("Deal {}", id),
            stage,
            value,
            contact: Some(Reference::new(1)),
            ..Default::default()
        }
    }

    fn board() -> PipelineBoard {
        let contacts = vec![Contact {
            id: 1,
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            ..Default::default()
        }];
        PipelineBoard::new(
            vec![
                deal(1, DealStage::Lead, 100.0),
                deal(2, DealStage::ClosedWon, 200.0),
                deal(3, DealStage::ClosedLost, 50.0),
            ],
            &contacts,
        )
    }

    fn gateway() -> MemoryGateway {
        let gw = MemoryGateway::new();
        for (id, stage) in [(1, "lead"), (2, "closed-won")] {
            gw.seed(RecordKind::Deal, json!({ "Id": id, "stage_c": stage }));
        }
        gw
    }

    #[test]
    fn test_lost_deals_excluded_and_columns_ordered() {
        let board = board();
        assert_eq!(board.deals().len(), 2);
        let columns = board.columns();
        assert_eq!(columns.len(), 5);
        assert_eq!(columns[0].stage, DealStage::Lead);
        assert_eq!(columns[0].count, 1);
        assert_eq!(columns[0].cards[0].contact_name, "Ada Lovelace");
        assert_eq!(columns[4].value, 200.0);
    }

    #[tokio::test]
    async fn test_move_updates_local_stage_without_reload() {
        let mut board = board();
        let gw = gateway();
        let notifier = MemoryNotifier::new();

        board.drag_start(1).unwrap();
        let outcome = board
            .drop_on(Some(DealStage::Qualified), &gw, notifier.as_ref())
            .await
            .unwrap();

        assert_eq!(
            outcome,
            DropOutcome::Moved {
                deal_id: 1,
                to: DealStage::Qualified
            }
        );
        assert_eq!(board.deal(1).unwrap().stage, DealStage::Qualified);
        assert_eq!(board.drag_state(), DragState::Idle);
        assert_eq!(gw.count(Op::List), 0);

        let calls = gw.calls();
        assert_eq!(calls.len(), 1);
        let GatewayCall { op, id, fields, .. } = &calls[0];
        assert_eq!(*op, Op::Update);
        assert_eq!(*id, Some(1));
        let fields = fields.as_ref().unwrap();
        assert_eq!(fields["stage_c"], json!("qualified"));
        assert!(fields.keys().all(|k| k == "Id" || k == "stage_c"));

        assert_eq!(notifier.messages(), vec![STAGE_UPDATED.to_string()]);
    }

    #[tokio::test]
    async fn test_same_stage_drop_is_a_no_op() {
        let mut board = board();
        let gw = gateway();
        let notifier = MemoryNotifier::new();

        board.drag_start(1).unwrap();
        let outcome = board
            .drop_on(Some(DealStage::Lead), &gw, notifier.as_ref())
            .await
            .unwrap();
        assert_eq!(outcome, DropOutcome::Unchanged);
        assert!(gw.calls().is_empty());
        assert!(notifier.notices().is_empty());
        assert_eq!(board.drag_state(), DragState::Idle);
    }

    #[tokio::test]
    async fn test_drop_outside_or_on_lost_is_a_no_op() {
        let mut board = board();
        let gw = gateway();
        let notifier = MemoryNotifier::new();

        for target in [None, Some(DealStage::ClosedLost)] {
            board.drag_start(1).unwrap();
            let outcome = board.drop_on(target, &gw, notifier.as_ref()).await.unwrap();
            assert_eq!(outcome, DropOutcome::Unchanged);
        }
        assert!(gw.calls().is_empty());
        assert_eq!(board.deal(1).unwrap().stage, DealStage::Lead);
    }

    #[tokio::test]
    async fn test_remote_failure_leaves_stage_unchanged() {
        let mut board = board();
        let gw = gateway();
        gw.fail(Op::Update, RecordKind::Deal);
        let notifier = MemoryNotifier::new();

        board.drag_start(1).unwrap();
        let outcome = board
            .drop_on(Some(DealStage::Proposal), &gw, notifier.as_ref())
            .await
            .unwrap();

        assert!(matches!(outcome, DropOutcome::Failed { deal_id: 1, .. }));
        assert_eq!(board.deal(1).unwrap().stage, DealStage::Lead);
        let last = notifier.last().unwrap();
        assert_eq!(last.level, NoticeLevel::Error);
        assert_eq!(last.message, STAGE_UPDATE_FAILED);
        assert_eq!(board.drag_state(), DragState::Idle);
    }

    #[tokio::test]
    async fn test_update_without_returned_record_is_a_failure() {
        let mut board = board();
        let notifier = MemoryNotifier::new();

        board.drag_start(1).unwrap();
        let outcome = board
            .drop_on(Some(DealStage::Qualified), &NoRecordGateway, notifier.as_ref())
            .await
            .unwrap();

        assert!(matches!(outcome, DropOutcome::Failed { deal_id: 1, .. }));
        assert_eq!(board.deal(1).unwrap().stage, DealStage::Lead);
        assert_eq!(notifier.messages(), vec![STAGE_UPDATE_FAILED.to_string()]);
        assert_eq!(board.drag_state(), DragState::Idle);
    }

    #[test]
    fn test_upsert_replaces_adds_and_drops_lost() {
        let mut board = board();
        let mut moved = deal(1, DealStage::Proposal, 120.0);
        moved.title = "Renamed".into();
        board.upsert(moved);
        assert_eq!(board.deal(1).unwrap().stage, DealStage::Proposal);
        assert_eq!(board.deals().len(), 2);

        board.upsert(deal(7, DealStage::Lead, 10.0));
        assert_eq!(board.deals().len(), 3);

        board.upsert(deal(7, DealStage::ClosedLost, 10.0));
        assert!(board.deal(7).is_none());
    }

    #[test]
    fn test_second_drag_rejected_while_committing() {
        let mut board = board();
        board.drag_start(1).unwrap();
        let pending = board
            .begin_drop(Some(DealStage::Negotiation))
            .unwrap()
            .unwrap();

        assert!(matches!(board.drag_start(2), Err(CrmError::CommitInFlight(1))));
        assert!(matches!(
            board.begin_drop(Some(DealStage::Proposal)),
            Err(CrmError::CommitInFlight(1))
        ));
        board.drag_end();
        assert!(matches!(board.drag_state(), DragState::Committing { .. }));

        let notifier = MemoryNotifier::new();
        board.complete(pending, Ok(()), notifier.as_ref());
        assert_eq!(board.deal(1).unwrap().stage, DealStage::Negotiation);
        assert!(board.drag_start(2).is_ok());
    }

    #[test]
    fn test_drag_start_unknown_deal_and_drag_end() {
        let mut board = board();
        assert!(matches!(board.drag_start(3), Err(CrmError::NotOnBoard(3))));
        assert_eq!(board.drag_state(), DragState::Idle);

        board.drag_start(2).unwrap();
        assert_eq!(
            board.drag_state(),
            DragState::Dragging {
                deal_id: 2,
                from: DealStage::ClosedWon
            }
        );
        board.drag_end();
        assert_eq!(board.drag_state(), DragState::Idle);
    }

    #[test]
    fn test_unknown_contact_name() {
        let board = PipelineBoard::new(vec![], &[]);
        let mut d = deal(9, DealStage::Lead, 1.0);
        assert_eq!(board.contact_name(&d), "Unknown");
        d.contact = Some(Reference {
            id: 5,
            name: Some("Alan Turing".into()),
        });
        assert_eq!(board.contact_name(&d), "Alan Turing");
        d.contact = None;
        assert_eq!(board.contact_name(&d), "Unknown");
    }
}
