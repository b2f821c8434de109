// Company service: reads, search, the company form flow and deletion.

use super::{
    delete_flow, fetch_list, fetch_one, finish_save, list_or_empty, returned, DeleteMessages,
    DeleteOutcome, SaveResult,
};
use crate::error::CrmError;
use crate::filter::ListView;
use crate::gateway::fields::{COMPANY_SEARCH_COLUMNS, COMPANY_SEARCH_FIELDS};
use crate::gateway::{ListQuery, RecordGateway, RecordKind};
use crate::notification::{Confirm, Notifier};
use crate::types::{Company, CompanyInput, CompanyPatch, RecordId};
use crate::validation::validate_company;

const KIND: RecordKind = RecordKind::Company;

const DELETE_MESSAGES: DeleteMessages = DeleteMessages {
    prompt: "Are you sure you want to delete this company?",
    success: "Company deleted successfully",
    failure: "Failed to delete company",
};

pub async fn get_all(gateway: &dyn RecordGateway) -> Vec<Company> {
    list_or_empty(gateway, KIND, &ListQuery::all(KIND)).await
}

pub async fn fetch_all(gateway: &dyn RecordGateway) -> Result<Vec<Company>, CrmError> {
    fetch_list(gateway, KIND, &ListQuery::all(KIND)).await
}

pub async fn get_by_id(gateway: &dyn RecordGateway, id: RecordId) -> Result<Company, CrmError> {
    fetch_one(gateway, KIND, id).await
}

/// Server-side search over name, industry, city and state. Empty on failure.
pub async fn search(gateway: &dyn RecordGateway, query: &str) -> Vec<Company> {
    if query.trim().is_empty() {
        return get_all(gateway).await;
    }
    let q = ListQuery::all(KIND)
        .with_fields(COMPANY_SEARCH_FIELDS)
        .any_contains(COMPANY_SEARCH_COLUMNS, query.trim());
    list_or_empty(gateway, KIND, &q).await
}

pub async fn create(gateway: &dyn RecordGateway, input: &CompanyInput) -> Result<Company, CrmError> {
    validate_company(input).map_err(CrmError::Validation)?;
    let created = gateway.create(KIND, input.to_create_fields()).await?;
    returned(KIND, created)
}

pub async fn update(
    gateway: &dyn RecordGateway,
    id: RecordId,
    patch: &CompanyPatch,
) -> Result<Company, CrmError> {
    let updated = gateway.update(KIND, id, patch.to_update_fields(id)).await?;
    returned(KIND, updated)
}

pub async fn delete(gateway: &dyn RecordGateway, id: RecordId) -> Result<(), CrmError> {
    gateway.delete(KIND, id).await
}

/// Company form submit. The saved company is written into `view`.
pub async fn save(
    gateway: &dyn RecordGateway,
    notifier: &dyn Notifier,
    view: &mut ListView<Company>,
    id: Option<RecordId>,
    input: CompanyInput,
) -> SaveResult<Company> {
    let (result, success) = match id {
        None => (create(gateway, &input).await, "Company created successfully"),
        Some(id) => {
            let result = match validate_company(&input) {
                Err(errors) => Err(CrmError::Validation(errors)),
                Ok(()) => update(gateway, id, &CompanyPatch::from(input)).await,
            };
            (result, "Company updated successfully")
        }
    };
    finish_save(result, view, notifier, success, "Failed to save company")
}

pub async fn load_view(gateway: &dyn RecordGateway) -> Result<ListView<Company>, CrmError> {
    Ok(ListView::new(fetch_all(gateway).await?))
}

pub async fn delete_from_view(
    gateway: &dyn RecordGateway,
    confirm: &dyn Confirm,
    notifier: &dyn Notifier,
    view: &mut ListView<Company>,
    id: RecordId,
) -> DeleteOutcome {
    delete_flow(gateway, confirm, notifier, view, KIND, id, &DELETE_MESSAGES).await
}
