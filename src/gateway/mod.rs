//! Record gateway: the seam between the CRM core and the hosted record service.
//!
//! Services talk to a `RecordGateway` trait object handed to them by the
//! application state. Two implementations ship:
//! - `client::RemoteGateway`: JSON over HTTPS to the hosted service
//! - `memory::MemoryGateway`: in-process tables, used by tests and demo mode

pub mod client;
pub mod fields;
pub mod memory;

use std::fmt;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::CrmError;
use crate::types::{Fields, RecordId};

pub use fields::FieldSpec;

// ---------------------------------------------------------------------------
// Record kinds
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Contact,
    Company,
    Deal,
    Activity,
}

impl RecordKind {
    pub const ALL: [RecordKind; 4] = [Self::Contact, Self::Company, Self::Deal, Self::Activity];

    /// Table name in the record service.
    pub fn table(&self) -> &'static str {
        match self {
            Self::Contact => "contact_c",
            Self::Company => "company_c",
            Self::Deal => "deal_c",
            Self::Activity => "activity_c",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Contact => "contact",
            Self::Company => "company",
            Self::Deal => "deal",
            Self::Activity => "activity",
        }
    }

    /// Fixed field list requested for this kind.
    pub fn fields(&self) -> &'static [FieldSpec] {
        match self {
            Self::Contact => fields::CONTACT_FIELDS,
            Self::Company => fields::COMPANY_FIELDS,
            Self::Deal => fields::DEAL_FIELDS,
            Self::Activity => fields::ACTIVITY_FIELDS,
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    EqualTo,
    /// Case-insensitive substring match.
    Contains,
}

impl Operator {
    fn as_str(&self) -> &'static str {
        match self {
            Self::EqualTo => "EqualTo",
            Self::Contains => "Contains",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub field: String,
    pub operator: Operator,
    pub values: Vec<Value>,
}

/// Conditions joined with OR.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WhereGroup {
    pub any_of: Vec<Condition>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub field: String,
    pub descending: bool,
}

/// Parameters for a `list` call: requested fields, AND-ed equality
/// conditions, AND-ed OR-groups, and ordering.
#[derive(Debug, Clone, PartialEq)]
pub struct ListQuery {
    pub fields: &'static [FieldSpec],
    pub conditions: Vec<Condition>,
    pub groups: Vec<WhereGroup>,
    pub order_by: Vec<OrderBy>,
}

impl ListQuery {
    /// Every record of `kind` with its standard field list.
    pub fn all(kind: RecordKind) -> Self {
        Self {
            fields: kind.fields(),
            conditions: Vec::new(),
            groups: Vec::new(),
            order_by: Vec::new(),
        }
    }

    pub fn with_fields(mut self, fields: &'static [FieldSpec]) -> Self {
        self.fields = fields;
        self
    }

    pub fn where_eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.conditions.push(Condition {
            field: field.to_string(),
            operator: Operator::EqualTo,
            values: vec![value.into()],
        });
        self
    }

    /// Match records where any of `fields` contains `needle`.
    pub fn any_contains(mut self, fields: &[&str], needle: &str) -> Self {
        let needle = needle.to_lowercase();
        self.groups.push(WhereGroup {
            any_of: fields
                .iter()
                .map(|f| Condition {
                    field: f.to_string(),
                    operator: Operator::Contains,
                    values: vec![json!(needle)],
                })
                .collect(),
        });
        self
    }

    pub fn order_desc(mut self, field: &str) -> Self {
        self.order_by.push(OrderBy {
            field: field.to_string(),
            descending: true,
        });
        self
    }

    /// Request parameters in the record service's fetch format.
    pub fn to_params(&self) -> Value {
        let mut params = json!({
            "fields": fields::field_params(self.fields),
        });
        if !self.conditions.is_empty() {
            params["where"] = Value::Array(
                self.conditions
                    .iter()
                    .map(|c| {
                        json!({
                            "FieldName": c.field,
                            "Operator": c.operator.as_str(),
                            "Values": c.values,
                        })
                    })
                    .collect(),
            );
        }
        if !self.groups.is_empty() {
            params["whereGroups"] = Value::Array(
                self.groups
                    .iter()
                    .map(|g| {
                        json!({
                            "operator": "OR",
                            "subGroups": g.any_of.iter().map(|c| json!({
                                "conditions": [{
                                    "fieldName": c.field,
                                    "operator": c.operator.as_str(),
                                    "values": c.values,
                                }],
                                "operator": "",
                            })).collect::<Vec<_>>(),
                        })
                    })
                    .collect(),
            );
        }
        if !self.order_by.is_empty() {
            params["orderBy"] = Value::Array(
                self.order_by
                    .iter()
                    .map(|o| {
                        json!({
                            "fieldName": o.field,
                            "sorttype": if o.descending { "DESC" } else { "ASC" },
                        })
                    })
                    .collect(),
            );
        }
        params
    }
}

// ---------------------------------------------------------------------------
// Gateway trait
// ---------------------------------------------------------------------------

/// Remote record operations for the four record kinds.
#[async_trait]
pub trait RecordGateway: Send + Sync {
    fn backend_tag(&self) -> &'static str;

    async fn list(&self, kind: RecordKind, query: &ListQuery) -> Result<Vec<Value>, CrmError>;

    /// Errors with `CrmError::NotFound` when no such record exists.
    async fn get_by_id(&self, kind: RecordKind, id: RecordId) -> Result<Value, CrmError>;

    async fn create(&self, kind: RecordKind, fields: Fields) -> Result<Option<Value>, CrmError>;

    async fn update(
        &self,
        kind: RecordKind,
        id: RecordId,
        fields: Fields,
    ) -> Result<Option<Value>, CrmError>;

    /// Fails if the record service reports any per-record failure.
    async fn delete(&self, kind: RecordKind, id: RecordId) -> Result<(), CrmError>;

    /// Call a named server-side function.
    async fn invoke_function(&self, name: &str, payload: Value) -> Result<Value, CrmError>;
}

/// Decode raw records, skipping (and logging) any that are not objects.
pub fn decode_records<T: DeserializeOwned>(kind: RecordKind, values: Vec<Value>) -> Vec<T> {
    values
        .into_iter()
        .filter_map(|v| match serde_json::from_value::<T>(v) {
            Ok(record) => Some(record),
            Err(e) => {
                log::warn!("Skipping unreadable {} record: {}", kind, e);
                None
            }
        })
        .collect()
}

pub fn decode_record<T: DeserializeOwned>(value: Value) -> Result<T, CrmError> {
    Ok(serde_json::from_value(value)?)
}
