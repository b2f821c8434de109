// Contact service: reads, search, the contact form flow and deletion.

use serde::Serialize;

use super::{
    delete_flow, fetch_list, fetch_one, finish_save, list_or_empty, returned, DeleteMessages,
    DeleteOutcome, SaveResult,
};
use crate::error::CrmError;
use crate::events::{CrmEvent, EventBus};
use crate::filter::ListView;
use crate::gateway::fields::{CONTACT_SEARCH_COLUMNS, CONTACT_SEARCH_FIELDS};
use crate::gateway::{ListQuery, RecordGateway, RecordKind};
use crate::notification::{Confirm, Notifier};
use crate::types::{Activity, Contact, ContactInput, ContactPatch, Deal, RecordId};
use crate::validation::validate_contact;

const KIND: RecordKind = RecordKind::Contact;

const DELETE_MESSAGES: DeleteMessages = DeleteMessages {
    prompt: "Are you sure you want to delete this contact?",
    success: "Contact deleted successfully",
    failure: "Failed to delete contact",
};

/// All contacts; empty on failure.
pub async fn get_all(gateway: &dyn RecordGateway) -> Vec<Contact> {
    list_or_empty(gateway, KIND, &ListQuery::all(KIND)).await
}

/// All contacts, for view loaders that show an error state.
pub async fn fetch_all(gateway: &dyn RecordGateway) -> Result<Vec<Contact>, CrmError> {
    fetch_list(gateway, KIND, &ListQuery::all(KIND)).await
}

pub async fn get_by_id(gateway: &dyn RecordGateway, id: RecordId) -> Result<Contact, CrmError> {
    fetch_one(gateway, KIND, id).await
}

/// Server-side search over name, email and company. Empty on failure.
pub async fn search(gateway: &dyn RecordGateway, query: &str) -> Vec<Contact> {
    if query.trim().is_empty() {
        return get_all(gateway).await;
    }
    let q = ListQuery::all(KIND)
        .with_fields(CONTACT_SEARCH_FIELDS)
        .any_contains(CONTACT_SEARCH_COLUMNS, query.trim());
    list_or_empty(gateway, KIND, &q).await
}

pub async fn create(
    gateway: &dyn RecordGateway,
    events: &EventBus,
    input: &ContactInput,
) -> Result<Contact, CrmError> {
    validate_contact(input).map_err(CrmError::Validation)?;
    let created = gateway.create(KIND, input.to_create_fields()).await?;
    let contact: Contact = returned(KIND, created)?;
    log::info!("Created contact {}", contact.id);
    events.emit(CrmEvent::contact_created(&contact));
    Ok(contact)
}

pub async fn update(
    gateway: &dyn RecordGateway,
    id: RecordId,
    patch: &ContactPatch,
) -> Result<Contact, CrmError> {
    let updated = gateway.update(KIND, id, patch.to_update_fields(id)).await?;
    returned(KIND, updated)
}

pub async fn delete(gateway: &dyn RecordGateway, id: RecordId) -> Result<(), CrmError> {
    gateway.delete(KIND, id).await
}

/// Contact form submit: create when `id` is `None`, else full update.
/// The saved contact is written into `view`.
pub async fn save(
    gateway: &dyn RecordGateway,
    events: &EventBus,
    notifier: &dyn Notifier,
    view: &mut ListView<Contact>,
    id: Option<RecordId>,
    input: ContactInput,
) -> SaveResult<Contact> {
    let (result, success) = match id {
        None => (
            create(gateway, events, &input).await,
            "Contact created successfully",
        ),
        Some(id) => {
            let result = match validate_contact(&input) {
                Err(errors) => Err(CrmError::Validation(errors)),
                Ok(()) => update(gateway, id, &ContactPatch::from(input)).await,
            };
            (result, "Contact updated successfully")
        }
    };
    finish_save(result, view, notifier, success, "Failed to save contact")
}

/// Contacts page: the full list behind a filterable view.
pub async fn load_view(gateway: &dyn RecordGateway) -> Result<ListView<Contact>, CrmError> {
    Ok(ListView::new(fetch_all(gateway).await?))
}

pub async fn delete_from_view(
    gateway: &dyn RecordGateway,
    confirm: &dyn Confirm,
    notifier: &dyn Notifier,
    view: &mut ListView<Contact>,
    id: RecordId,
) -> DeleteOutcome {
    delete_flow(gateway, confirm, notifier, view, KIND, id, &DELETE_MESSAGES).await
}

/// Contact detail panel: the contact with its deals and activity history.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactDetail {
    pub contact: Contact,
    pub deals: Vec<Deal>,
    pub activities: Vec<Activity>,
}

pub async fn load_detail(
    gateway: &dyn RecordGateway,
    contact: Contact,
) -> ContactDetail {
    let (deals, activities) = tokio::join!(
        super::deals::get_by_contact(gateway, contact.id),
        super::activities::get_by_contact(gateway, contact.id),
    );
    ContactDetail {
        contact,
        deals,
        activities,
    }
}
