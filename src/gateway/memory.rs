//! In-process record store implementing `RecordGateway`.
//!
//! Backs the test suite and the demo-data mode. Evaluates list queries
//! the way the hosted service does (equality, OR-groups of case-insensitive
//! `Contains`, ordering, reference-name expansion), records every call,
//! and can be told to fail specific operations.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicI64, Ordering as AtomicOrdering};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};

use super::{Condition, ListQuery, Operator, RecordGateway, RecordKind};
use crate::error::CrmError;
use crate::types::{Fields, RecordId};

/// Gateway operation, used for call logs and failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    List,
    Get,
    Create,
    Update,
    Delete,
    Invoke,
}

/// One recorded gateway call.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayCall {
    pub op: Op,
    pub kind: Option<RecordKind>,
    pub id: Option<RecordId>,
    pub fields: Option<Fields>,
    pub function: Option<String>,
}

#[derive(Default)]
pub struct MemoryGateway {
    tables: Mutex<HashMap<RecordKind, BTreeMap<RecordId, Fields>>>,
    next_id: AtomicI64,
    calls: Mutex<Vec<GatewayCall>>,
    failing: Mutex<HashSet<(Op, Option<RecordKind>)>>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self {
            next_id: AtomicI64::new(1),
            ..Default::default()
        }
    }

    /// Insert a record as-is, keeping its `Id` (assigning one if absent).
    pub fn seed(&self, kind: RecordKind, record: Value) -> RecordId {
        let mut fields = match record {
            Value::Object(map) => map,
            _ => Fields::new(),
        };
        let id = match fields.get("Id").and_then(Value::as_i64) {
            Some(id) => {
                self.next_id.fetch_max(id + 1, AtomicOrdering::SeqCst);
                id
            }
            None => self.allocate_id(),
        };
        fields.insert("Id".to_string(), json!(id));
        self.tables.lock().entry(kind).or_default().insert(id, fields);
        id
    }

    /// Make every `op` on `kind` fail with a remote error.
    pub fn fail(&self, op: Op, kind: RecordKind) {
        self.failing.lock().insert((op, Some(kind)));
    }

    /// Make server-side function calls fail.
    pub fn fail_functions(&self) {
        self.failing.lock().insert((Op::Invoke, None));
    }

    pub fn clear_failures(&self) {
        self.failing.lock().clear();
    }

    pub fn calls(&self) -> Vec<GatewayCall> {
        self.calls.lock().clone()
    }

    pub fn count(&self, op: Op) -> usize {
        self.calls.lock().iter().filter(|c| c.op == op).count()
    }

    /// Raw stored record, for assertions.
    pub fn stored(&self, kind: RecordKind, id: RecordId) -> Option<Fields> {
        self.tables.lock().get(&kind)?.get(&id).cloned()
    }

    pub fn len(&self, kind: RecordKind) -> usize {
        self.tables.lock().get(&kind).map(BTreeMap::len).unwrap_or(0)
    }

    pub fn is_empty(&self, kind: RecordKind) -> bool {
        self.len(kind) == 0
    }

    fn allocate_id(&self) -> RecordId {
        self.next_id.fetch_add(1, AtomicOrdering::SeqCst).max(1)
    }

    fn record_call(&self, call: GatewayCall) {
        self.calls.lock().push(call);
    }

    fn check_failure(&self, op: Op, kind: Option<RecordKind>) -> Result<(), CrmError> {
        if self.failing.lock().contains(&(op, kind)) {
            let target = kind.map(|k| k.as_str()).unwrap_or("function");
            return Err(CrmError::Remote(format!(
                "simulated {:?} failure for {}",
                op, target
            )));
        }
        Ok(())
    }

    /// Replace reference Ids with `{ Id, Name }` objects, as the service does.
    fn expand(&self, kind: RecordKind, mut record: Fields) -> Value {
        let tables = self.tables.lock();
        for spec in kind.fields() {
            let Some(target) = spec.reference else {
                continue;
            };
            let Some(id) = record.get(spec.name).and_then(reference_id) else {
                continue;
            };
            let name = tables
                .get(&target)
                .and_then(|t| t.get(&id))
                .and_then(|r| r.get("Name"))
                .cloned()
                .unwrap_or(Value::Null);
            record.insert(spec.name.to_string(), json!({ "Id": id, "Name": name }));
        }
        Value::Object(record)
    }
}

fn reference_id(value: &Value) -> Option<RecordId> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::Object(map) => map.get("Id").and_then(Value::as_i64),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn field_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.to_lowercase(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Object(map)) => map
            .get("Name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_lowercase(),
        _ => String::new(),
    }
}

fn matches(record: &Fields, condition: &Condition) -> bool {
    let value = record.get(&condition.field);
    match condition.operator {
        Operator::EqualTo => condition.values.iter().any(|expected| match value {
            Some(actual) if reference_id(actual).is_some() && expected.is_number() => {
                reference_id(actual) == expected.as_i64()
            }
            Some(actual) => actual == expected,
            None => expected.is_null(),
        }),
        Operator::Contains => {
            let haystack = field_text(value);
            condition.values.iter().any(|needle| {
                needle
                    .as_str()
                    .map(|n| haystack.contains(&n.to_lowercase()))
                    .unwrap_or(false)
            })
        }
    }
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        _ => Ordering::Equal,
    }
}

#[async_trait]
impl RecordGateway for MemoryGateway {
    fn backend_tag(&self) -> &'static str {
        "memory"
    }

    async fn list(&self, kind: RecordKind, query: &ListQuery) -> Result<Vec<Value>, CrmError> {
        self.record_call(GatewayCall {
            op: Op::List,
            kind: Some(kind),
            id: None,
            fields: None,
            function: None,
        });
        self.check_failure(Op::List, Some(kind))?;

        let mut rows: Vec<Fields> = self
            .tables
            .lock()
            .get(&kind)
            .map(|t| t.values().cloned().collect())
            .unwrap_or_default();

        rows.retain(|r| {
            query.conditions.iter().all(|c| matches(r, c))
                && query
                    .groups
                    .iter()
                    .all(|g| g.any_of.is_empty() || g.any_of.iter().any(|c| matches(r, c)))
        });

        for order in query.order_by.iter().rev() {
            rows.sort_by(|a, b| {
                let ord = compare_values(a.get(&order.field), b.get(&order.field));
                if order.descending {
                    ord.reverse()
                } else {
                    ord
                }
            });
        }

        Ok(rows.into_iter().map(|r| self.expand(kind, r)).collect())
    }

    async fn get_by_id(&self, kind: RecordKind, id: RecordId) -> Result<Value, CrmError> {
        self.record_call(GatewayCall {
            op: Op::Get,
            kind: Some(kind),
            id: Some(id),
            fields: None,
            function: None,
        });
        self.check_failure(Op::Get, Some(kind))?;
        let record = self
            .stored(kind, id)
            .ok_or(CrmError::NotFound { kind, id })?;
        Ok(self.expand(kind, record))
    }

    async fn create(&self, kind: RecordKind, fields: Fields) -> Result<Option<Value>, CrmError> {
        self.record_call(GatewayCall {
            op: Op::Create,
            kind: Some(kind),
            id: None,
            fields: Some(fields.clone()),
            function: None,
        });
        self.check_failure(Op::Create, Some(kind))?;

        let id = self.allocate_id();
        let mut record = fields;
        record.insert("Id".to_string(), json!(id));
        record
            .entry("created_at_c".to_string())
            .or_insert_with(|| json!(chrono::Utc::now().to_rfc3339()));
        self.tables
            .lock()
            .entry(kind)
            .or_default()
            .insert(id, record.clone());
        Ok(Some(self.expand(kind, record)))
    }

    async fn update(
        &self,
        kind: RecordKind,
        id: RecordId,
        fields: Fields,
    ) -> Result<Option<Value>, CrmError> {
        self.record_call(GatewayCall {
            op: Op::Update,
            kind: Some(kind),
            id: Some(id),
            fields: Some(fields.clone()),
            function: None,
        });
        self.check_failure(Op::Update, Some(kind))?;

        let updated = {
            let mut tables = self.tables.lock();
            let record = tables
                .get_mut(&kind)
                .and_then(|t| t.get_mut(&id))
                .ok_or(CrmError::NotFound { kind, id })?;
            for (key, value) in fields {
                if key != "Id" {
                    record.insert(key, value);
                }
            }
            record.clone()
        };
        Ok(Some(self.expand(kind, updated)))
    }

    async fn delete(&self, kind: RecordKind, id: RecordId) -> Result<(), CrmError> {
        self.record_call(GatewayCall {
            op: Op::Delete,
            kind: Some(kind),
            id: Some(id),
            fields: None,
            function: None,
        });
        self.check_failure(Op::Delete, Some(kind))?;

        let removed = self
            .tables
            .lock()
            .get_mut(&kind)
            .and_then(|t| t.remove(&id));
        match removed {
            Some(_) => Ok(()),
            None => Err(CrmError::PartialFailure {
                kind,
                action: "delete",
                failed: 1,
                message: format!("{} {} does not exist", kind, id),
            }),
        }
    }

    async fn invoke_function(&self, name: &str, payload: Value) -> Result<Value, CrmError> {
        self.record_call(GatewayCall {
            op: Op::Invoke,
            kind: None,
            id: None,
            fields: payload.as_object().cloned(),
            function: Some(name.to_string()),
        });
        self.check_failure(Op::Invoke, None)?;
        Ok(json!({ "success": true }))
    }
}
