// Deal service: reads, the deal form flow, stage updates and deletion.

use super::{
    delete_flow, fetch_list, fetch_one, finish_save, list_or_empty, returned, DeleteMessages,
    DeleteOutcome, LocalList, SaveResult,
};
use crate::error::CrmError;
use crate::gateway::{ListQuery, RecordGateway, RecordKind};
use crate::notification::{Confirm, Notifier};
use crate::pipeline::PipelineBoard;
use crate::types::{Contact, Deal, DealInput, DealPatch, DealStage, RecordId};
use crate::validation::validate_deal;

const KIND: RecordKind = RecordKind::Deal;

const DELETE_MESSAGES: DeleteMessages = DeleteMessages {
    prompt: "Are you sure you want to delete this deal?",
    success: "Deal deleted successfully",
    failure: "Failed to delete deal",
};

pub async fn get_all(gateway: &dyn RecordGateway) -> Vec<Deal> {
    list_or_empty(gateway, KIND, &ListQuery::all(KIND)).await
}

pub async fn fetch_all(gateway: &dyn RecordGateway) -> Result<Vec<Deal>, CrmError> {
    fetch_list(gateway, KIND, &ListQuery::all(KIND)).await
}

pub async fn get_by_id(gateway: &dyn RecordGateway, id: RecordId) -> Result<Deal, CrmError> {
    fetch_one(gateway, KIND, id).await
}

/// Deals owned by one contact. Empty on failure.
pub async fn get_by_contact(gateway: &dyn RecordGateway, contact_id: RecordId) -> Vec<Deal> {
    let query = ListQuery::all(KIND).where_eq("contact_id_c", contact_id);
    list_or_empty(gateway, KIND, &query).await
}

pub async fn create(gateway: &dyn RecordGateway, input: &DealInput) -> Result<Deal, CrmError> {
    validate_deal(input).map_err(CrmError::Validation)?;
    let created = gateway.create(KIND, input.to_create_fields()).await?;
    returned(KIND, created)
}

pub async fn update(
    gateway: &dyn RecordGateway,
    id: RecordId,
    patch: &DealPatch,
) -> Result<Deal, CrmError> {
    let updated = gateway.update(KIND, id, patch.to_update_fields(id)).await?;
    returned(KIND, updated)
}

/// Single-field stage update.
pub async fn update_stage(
    gateway: &dyn RecordGateway,
    id: RecordId,
    stage: DealStage,
) -> Result<Deal, CrmError> {
    update(gateway, id, &DealPatch::stage_only(stage)).await
}

pub async fn delete(gateway: &dyn RecordGateway, id: RecordId) -> Result<(), CrmError> {
    gateway.delete(KIND, id).await
}

/// Deal form submit. The saved deal is written onto `board`.
pub async fn save(
    gateway: &dyn RecordGateway,
    notifier: &dyn Notifier,
    board: &mut PipelineBoard,
    id: Option<RecordId>,
    input: DealInput,
) -> SaveResult<Deal> {
    let (result, success) = match id {
        None => (create(gateway, &input).await, "Deal created successfully"),
        Some(id) => {
            let result = match validate_deal(&input) {
                Err(errors) => Err(CrmError::Validation(errors)),
                Ok(()) => update(gateway, id, &DealPatch::from(input)).await,
            };
            (result, "Deal updated successfully")
        }
    };
    finish_save(result, board, notifier, success, "Failed to save deal")
}

/// Owner choices for the deal form.
pub async fn contact_options(gateway: &dyn RecordGateway, notifier: &dyn Notifier) -> Vec<Contact> {
    match super::contacts::fetch_all(gateway).await {
        Ok(contacts) => contacts,
        Err(e) => {
            log::error!("Error loading contacts for deal form: {}", e);
            notifier.error("Failed to load contacts");
            Vec::new()
        }
    }
}

impl LocalList<Deal> for PipelineBoard {
    fn upsert_record(&mut self, deal: Deal) {
        self.upsert(deal)
    }

    fn remove_record(&mut self, id: RecordId) -> bool {
        self.remove(id)
    }
}

pub async fn delete_from_board(
    gateway: &dyn RecordGateway,
    confirm: &dyn Confirm,
    notifier: &dyn Notifier,
    board: &mut PipelineBoard,
    id: RecordId,
) -> DeleteOutcome {
    delete_flow(gateway, confirm, notifier, board, KIND, id, &DELETE_MESSAGES).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::memory::{MemoryGateway, Op};
    use crate::notification::{AutoConfirm, MemoryNotifier};
    use serde_json::json;

    fn gateway() -> MemoryGateway {
        let gw = MemoryGateway::new();
        gw.seed(RecordKind::Contact, json!({ "Id": 1, "Name": "Ada Lovelace" }));
        gw.seed(
            KIND,
            json!({ "Id": 5, "title_c": "Engine", "contact_id_c": 1, "value_c": 1000, "stage_c": "proposal", "probability_c": 60 }),
        );
        gw
    }

    fn input() -> DealInput {
        DealInput {
            title: "Difference Engine".into(),
            contact_id: Some(1),
            value: 2500.0,
            expected_close: "2025-06-30".into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_defaults_and_reference() {
        let gw = gateway();
        let deal = create(&gw, &input()).await.unwrap();
        assert_eq!(deal.title, "Difference Engine");
        assert_eq!(deal.name, "Difference Engine");
        assert_eq!(deal.stage, DealStage::Lead);
        assert_eq!(deal.probability, 20);
        assert_eq!(deal.contact.unwrap().name.as_deref(), Some("Ada Lovelace"));
    }

    #[tokio::test]
    async fn test_invalid_deal_blocks_remote_call() {
        let gw = gateway();
        let notifier = MemoryNotifier::new();
        let mut board = PipelineBoard::default();
        let mut bad = input();
        bad.value = 0.0;
        bad.contact_id = None;
        let result = save(&gw, notifier.as_ref(), &mut board, None, bad).await;
        match result {
            SaveResult::Invalid { errors } => {
                assert!(errors.get("value").is_some());
                assert!(errors.get("contactId").is_some());
            }
            other => panic!("expected invalid, got {:?}", other),
        }
        assert!(gw.calls().is_empty());
        assert!(board.is_empty());
    }

    #[tokio::test]
    async fn test_update_stage_sends_stage_only() {
        let gw = gateway();
        let deal = update_stage(&gw, 5, DealStage::Negotiation).await.unwrap();
        assert_eq!(deal.stage, DealStage::Negotiation);
        assert_eq!(deal.value, 1000.0);
        let calls = gw.calls();
        let sent = calls[0].fields.as_ref().unwrap();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent["stage_c"], json!("negotiation"));
    }

    #[tokio::test]
    async fn test_get_by_contact() {
        let gw = gateway();
        assert_eq!(get_by_contact(&gw, 1).await.len(), 1);
        assert!(get_by_contact(&gw, 2).await.is_empty());
        gw.fail(Op::List, KIND);
        assert!(get_by_contact(&gw, 1).await.is_empty());
    }

    #[tokio::test]
    async fn test_save_update_notice_and_probability_clamp() {
        let gw = gateway();
        let notifier = MemoryNotifier::new();
        let mut board = PipelineBoard::new(fetch_all(&gw).await.unwrap(), &[]);
        let mut edit = input();
        edit.probability = 150;
        let saved = save(&gw, notifier.as_ref(), &mut board, Some(5), edit).await;
        assert_eq!(saved.record().unwrap().probability, 100);
        assert_eq!(notifier.last().unwrap().message, "Deal updated successfully");
        assert_eq!(board.deal(5).unwrap().title, "Difference Engine");
        assert_eq!(board.deal(5).unwrap().stage, DealStage::Lead);

        let created = save(&gw, notifier.as_ref(), &mut board, None, input()).await;
        let created_id = created.record().unwrap().id;
        assert!(board.deal(created_id).is_some());
        assert_eq!(board.deals().len(), 2);
    }

    #[tokio::test]
    async fn test_contact_options_failure_notifies() {
        let gw = gateway();
        let notifier = MemoryNotifier::new();
        assert_eq!(contact_options(&gw, notifier.as_ref()).await.len(), 1);
        gw.fail(Op::List, RecordKind::Contact);
        assert!(contact_options(&gw, notifier.as_ref()).await.is_empty());
        assert_eq!(notifier.last().unwrap().message, "Failed to load contacts");
    }

    #[tokio::test]
    async fn test_delete_from_board() {
        let gw = gateway();
        let notifier = MemoryNotifier::new();
        let deals = fetch_all(&gw).await.unwrap();
        let mut board = PipelineBoard::new(deals, &[]);

        let outcome = delete_from_board(&gw, &AutoConfirm(true), notifier.as_ref(), &mut board, 5).await;
        assert_eq!(outcome, DeleteOutcome::Deleted);
        assert!(board.is_empty());
        assert_eq!(notifier.last().unwrap().message, "Deal deleted successfully");
    }
}
