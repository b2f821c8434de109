// Services layer: typed record services over the gateway, view loaders,
// and the create/update/delete flows driven by the presentation layer.

pub mod activities;
pub mod companies;
pub mod contacts;
pub mod dashboard;
pub mod deals;
pub mod pipeline;

use serde::de::DeserializeOwned;

use crate::error::CrmError;
use crate::filter::{ListView, Searchable};
use crate::gateway::{decode_record, decode_records, ListQuery, RecordGateway, RecordKind};
use crate::notification::{Confirm, Notifier};
use crate::types::{Record, RecordId};
use crate::validation::FieldErrors;

/// Load every matching record, propagating failures.
pub(crate) async fn fetch_list<T: DeserializeOwned>(
    gateway: &dyn RecordGateway,
    kind: RecordKind,
    query: &ListQuery,
) -> Result<Vec<T>, CrmError> {
    let values = gateway.list(kind, query).await?;
    Ok(decode_records(kind, values))
}

/// Load every matching record; a failure is logged and reads as empty.
pub(crate) async fn list_or_empty<T: DeserializeOwned>(
    gateway: &dyn RecordGateway,
    kind: RecordKind,
    query: &ListQuery,
) -> Vec<T> {
    match fetch_list(gateway, kind, query).await {
        Ok(records) => records,
        Err(e) => {
            log::error!("Error fetching {} records: {}", kind, e);
            Vec::new()
        }
    }
}

pub(crate) async fn fetch_one<T: DeserializeOwned>(
    gateway: &dyn RecordGateway,
    kind: RecordKind,
    id: RecordId,
) -> Result<T, CrmError> {
    let value = gateway.get_by_id(kind, id).await?;
    decode_record(value)
}

/// Decode the record a create/update returned.
pub(crate) fn returned<T: DeserializeOwned>(
    kind: RecordKind,
    value: Option<serde_json::Value>,
) -> Result<T, CrmError> {
    match value {
        Some(v) => decode_record(v),
        None => Err(CrmError::NoRecordReturned(kind)),
    }
}

/// Result of a form submission.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SaveResult<T> {
    Saved { record: T },
    Invalid { errors: FieldErrors },
    Failed { message: String },
}

impl<T> SaveResult<T> {
    pub fn record(&self) -> Option<&T> {
        match self {
            Self::Saved { record } => Some(record),
            _ => None,
        }
    }
}

/// Reduce a save attempt to a `SaveResult`, notifying either way. A saved
/// record is written into `list`.
pub(crate) fn finish_save<T: Clone>(
    result: Result<T, CrmError>,
    list: &mut dyn LocalList<T>,
    notifier: &dyn Notifier,
    success: &str,
    fallback: &str,
) -> SaveResult<T> {
    match result {
        Ok(record) => {
            list.upsert_record(record.clone());
            notifier.success(success);
            SaveResult::Saved { record }
        }
        Err(CrmError::Validation(errors)) => SaveResult::Invalid { errors },
        Err(e) => {
            log::error!("{}: {}", fallback, e);
            let message = match &e {
                CrmError::Remote(m) if !m.trim().is_empty() => m.clone(),
                _ => fallback.to_string(),
            };
            notifier.error(&message);
            SaveResult::Failed { message }
        }
    }
}

/// The page-local copy of a record list. Confirmed saves land in it and
/// confirmed deletes leave it, without a reload.
pub trait LocalList<T> {
    fn upsert_record(&mut self, record: T);

    fn remove_record(&mut self, id: RecordId) -> bool;
}

impl<T: Searchable + Record + Clone> LocalList<T> for ListView<T> {
    fn upsert_record(&mut self, record: T) {
        self.upsert(record)
    }

    fn remove_record(&mut self, id: RecordId) -> bool {
        self.remove(id)
    }
}

/// Wording of a delete flow for one record kind.
pub(crate) struct DeleteMessages {
    pub prompt: &'static str,
    pub success: &'static str,
    pub failure: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeleteOutcome {
    Deleted,
    Declined,
    Failed,
}

/// Confirm, delete remotely, then drop the record from `list`.
///
/// Declining does nothing. A failed delete leaves `list` untouched.
pub(crate) async fn delete_flow<T>(
    gateway: &dyn RecordGateway,
    confirm: &dyn Confirm,
    notifier: &dyn Notifier,
    list: &mut dyn LocalList<T>,
    kind: RecordKind,
    id: RecordId,
    messages: &DeleteMessages,
) -> DeleteOutcome {
    if !confirm.confirm(messages.prompt) {
        return DeleteOutcome::Declined;
    }
    match gateway.delete(kind, id).await {
        Ok(()) => {
            list.remove_record(id);
            notifier.success(messages.success);
            DeleteOutcome::Deleted
        }
        Err(e) => {
            log::error!("Error deleting {} {}: {}", kind, id, e);
            notifier.error(messages.failure);
            DeleteOutcome::Failed
        }
    }
}
