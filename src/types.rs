//! Record types, enums and form inputs for the four record kinds.
//!
//! Field names on the wire follow the record service's schema (`Id`,
//! `Name`, `first_name_c`, ...). Every field deserializes leniently: a
//! missing or malformed value takes the default documented on the field
//! rather than failing the record.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Map, Value};

use crate::util::{display_name, lenient};

/// Record identifier assigned by the record service on creation.
pub type RecordId = i64;

/// Field payload sent to the record service on create/update.
pub type Fields = Map<String, Value>;

/// Placeholder shown for a reference that resolves to nothing.
pub const UNKNOWN_NAME: &str = "Unknown";

// =============================================================================
// Enums
// =============================================================================

fn lenient_enum<'de, D, T>(d: D, parse: fn(&str) -> T) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default,
{
    Ok(match Option::<Value>::deserialize(d)? {
        Some(Value::String(s)) => parse(&s),
        _ => T::default(),
    })
}

/// Contact lifecycle status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactStatus {
    #[default]
    Lead,
    Active,
    Inactive,
}

impl ContactStatus {
    pub const ALL: [ContactStatus; 3] = [Self::Lead, Self::Active, Self::Inactive];

    /// Unknown values fall back to `Lead`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "active" => Self::Active,
            "inactive" => Self::Inactive,
            _ => Self::Lead,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lead => "lead",
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Lead => "Lead",
            Self::Active => "Active",
            Self::Inactive => "Inactive",
        }
    }
}

impl<'de> Deserialize<'de> for ContactStatus {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        lenient_enum(d, Self::parse)
    }
}

impl fmt::Display for ContactStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pipeline stage a deal occupies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DealStage {
    #[default]
    Lead,
    Qualified,
    Proposal,
    Negotiation,
    ClosedWon,
    ClosedLost,
}

impl DealStage {
    pub const ALL: [DealStage; 6] = [
        Self::Lead,
        Self::Qualified,
        Self::Proposal,
        Self::Negotiation,
        Self::ClosedWon,
        Self::ClosedLost,
    ];

    /// Pipeline board columns and dashboard breakdown rows, in display order.
    pub const BOARD: [DealStage; 5] = [
        Self::Lead,
        Self::Qualified,
        Self::Proposal,
        Self::Negotiation,
        Self::ClosedWon,
    ];

    /// Unknown or missing stages are read as an active `Lead`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "qualified" => Self::Qualified,
            "proposal" => Self::Proposal,
            "negotiation" => Self::Negotiation,
            "closed-won" => Self::ClosedWon,
            "closed-lost" => Self::ClosedLost,
            "lead" => Self::Lead,
            other => {
                log::debug!("Unknown deal stage '{}', reading as lead", other);
                Self::Lead
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lead => "lead",
            Self::Qualified => "qualified",
            Self::Proposal => "proposal",
            Self::Negotiation => "negotiation",
            Self::ClosedWon => "closed-won",
            Self::ClosedLost => "closed-lost",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Lead => "Lead",
            Self::Qualified => "Qualified",
            Self::Proposal => "Proposal",
            Self::Negotiation => "Negotiation",
            Self::ClosedWon => "Closed Won",
            Self::ClosedLost => "Closed Lost",
        }
    }

    /// Closed stages are the ones whose wire value contains "closed".
    pub fn is_closed(&self) -> bool {
        self.as_str().contains("closed")
    }

    pub fn is_lost(&self) -> bool {
        self.as_str().contains("lost")
    }

    pub fn is_board_stage(&self) -> bool {
        Self::BOARD.contains(self)
    }
}

impl<'de> Deserialize<'de> for DealStage {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        lenient_enum(d, Self::parse)
    }
}

impl fmt::Display for DealStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Activity type. Anything unrecognised is a generic `Other`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityType {
    Call,
    Email,
    Meeting,
    #[default]
    Other,
}

impl ActivityType {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "call" => Self::Call,
            "email" => Self::Email,
            "meeting" => Self::Meeting,
            _ => Self::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Call => "call",
            Self::Email => "email",
            Self::Meeting => "meeting",
            Self::Other => "other",
        }
    }

    /// Icon shown next to the activity in the recent-activity feed.
    pub fn icon(&self) -> &'static str {
        match self {
            Self::Call => "phone",
            Self::Email => "mail",
            Self::Meeting => "calendar",
            Self::Other => "message-square",
        }
    }
}

impl<'de> Deserialize<'de> for ActivityType {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        lenient_enum(d, Self::parse)
    }
}

// =============================================================================
// References
// =============================================================================

/// A many-to-one link to another record, optionally carrying its display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    #[serde(rename = "Id")]
    pub id: RecordId,
    #[serde(rename = "Name", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Reference {
    pub fn new(id: RecordId) -> Self {
        Self { id, name: None }
    }
}

// =============================================================================
// Records
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    #[serde(rename = "Id", default, deserialize_with = "lenient::record_id")]
    pub id: RecordId,
    #[serde(rename = "Name", default, deserialize_with = "lenient::string_or_empty")]
    pub name: String,
    #[serde(rename = "first_name_c", default, deserialize_with = "lenient::string_or_empty")]
    pub first_name: String,
    #[serde(rename = "last_name_c", default, deserialize_with = "lenient::string_or_empty")]
    pub last_name: String,
    #[serde(rename = "email_c", default, deserialize_with = "lenient::string_or_empty")]
    pub email: String,
    #[serde(rename = "phone_c", default, deserialize_with = "lenient::string_or_empty")]
    pub phone: String,
    #[serde(rename = "company_c", default, deserialize_with = "lenient::string_or_empty")]
    pub company: String,
    #[serde(rename = "job_title_c", default, deserialize_with = "lenient::string_or_empty")]
    pub job_title: String,
    #[serde(rename = "city_c", default, deserialize_with = "lenient::string_or_empty")]
    pub city: String,
    #[serde(rename = "state_c", default, deserialize_with = "lenient::string_or_empty")]
    pub state: String,
    #[serde(rename = "pin_code_c", default, deserialize_with = "lenient::string_or_empty")]
    pub pin_code: String,
    #[serde(rename = "linkedin_url_c", default, deserialize_with = "lenient::string_or_empty")]
    pub linkedin_url: String,
    #[serde(rename = "status_c", default)]
    pub status: ContactStatus,
    #[serde(rename = "tags_c", default, deserialize_with = "lenient::string_or_empty")]
    pub tags: String,
    #[serde(rename = "notes_c", default, deserialize_with = "lenient::string_or_empty")]
    pub notes: String,
    #[serde(rename = "created_at_c", default, deserialize_with = "lenient::optional_string")]
    pub created_at: Option<String>,
    #[serde(rename = "last_contact_c", default, deserialize_with = "lenient::optional_string")]
    pub last_contact: Option<String>,
}

impl Contact {
    /// Stored display name, falling back to first + last.
    pub fn display_name(&self) -> String {
        if self.name.trim().is_empty() {
            display_name(&self.first_name, &self.last_name)
        } else {
            self.name.clone()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Company {
    #[serde(rename = "Id", default, deserialize_with = "lenient::record_id")]
    pub id: RecordId,
    #[serde(rename = "Name", default, deserialize_with = "lenient::string_or_empty")]
    pub name: String,
    #[serde(rename = "Tags", default, deserialize_with = "lenient::string_or_empty")]
    pub tags: String,
    #[serde(rename = "name_c", default, deserialize_with = "lenient::string_or_empty")]
    pub company_name: String,
    #[serde(rename = "industry_c", default, deserialize_with = "lenient::string_or_empty")]
    pub industry: String,
    #[serde(rename = "address_c", default, deserialize_with = "lenient::string_or_empty")]
    pub address: String,
    #[serde(rename = "city_c", default, deserialize_with = "lenient::string_or_empty")]
    pub city: String,
    #[serde(rename = "state_c", default, deserialize_with = "lenient::string_or_empty")]
    pub state: String,
    #[serde(rename = "zip_code_c", default, deserialize_with = "lenient::string_or_empty")]
    pub zip_code: String,
    #[serde(rename = "phone_c", default, deserialize_with = "lenient::string_or_empty")]
    pub phone: String,
    #[serde(rename = "website_c", default, deserialize_with = "lenient::string_or_empty")]
    pub website: String,
    #[serde(rename = "CreatedOn", default, deserialize_with = "lenient::optional_string")]
    pub created_on: Option<String>,
    #[serde(rename = "ModifiedOn", default, deserialize_with = "lenient::optional_string")]
    pub modified_on: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Deal {
    #[serde(rename = "Id", default, deserialize_with = "lenient::record_id")]
    pub id: RecordId,
    #[serde(rename = "Name", default, deserialize_with = "lenient::string_or_empty")]
    pub name: String,
    #[serde(rename = "title_c", default, deserialize_with = "lenient::string_or_empty")]
    pub title: String,
    #[serde(rename = "contact_id_c", default, deserialize_with = "lenient::reference")]
    pub contact: Option<Reference>,
    #[serde(rename = "value_c", default, deserialize_with = "lenient::amount")]
    pub value: f64,
    #[serde(rename = "stage_c", default)]
    pub stage: DealStage,
    #[serde(rename = "probability_c", default, deserialize_with = "lenient::probability")]
    pub probability: u8,
    #[serde(rename = "expected_close_c", default, deserialize_with = "lenient::optional_string")]
    pub expected_close: Option<String>,
    #[serde(rename = "notes_c", default, deserialize_with = "lenient::string_or_empty")]
    pub notes: String,
    #[serde(rename = "created_at_c", default, deserialize_with = "lenient::optional_string")]
    pub created_at: Option<String>,
    #[serde(rename = "updated_at_c", default, deserialize_with = "lenient::optional_string")]
    pub updated_at: Option<String>,
}

impl Deal {
    pub fn contact_id(&self) -> Option<RecordId> {
        self.contact.as_ref().map(|r| r.id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    #[serde(rename = "Id", default, deserialize_with = "lenient::record_id")]
    pub id: RecordId,
    #[serde(rename = "Name", default, deserialize_with = "lenient::string_or_empty")]
    pub name: String,
    #[serde(rename = "type_c", default)]
    pub activity_type: ActivityType,
    #[serde(rename = "description_c", default, deserialize_with = "lenient::string_or_empty")]
    pub description: String,
    #[serde(rename = "timestamp_c", default, deserialize_with = "lenient::optional_string")]
    pub timestamp: Option<String>,
    #[serde(rename = "deal_id_c", default, deserialize_with = "lenient::reference")]
    pub deal: Option<Reference>,
    #[serde(rename = "contact_id_c", default, deserialize_with = "lenient::reference")]
    pub contact: Option<Reference>,
}

/// Common accessors used by list views and deletion flows.
pub trait Record {
    fn id(&self) -> RecordId;
}

impl Record for Contact {
    fn id(&self) -> RecordId {
        self.id
    }
}

impl Record for Company {
    fn id(&self) -> RecordId {
        self.id
    }
}

impl Record for Deal {
    fn id(&self) -> RecordId {
        self.id
    }
}

impl Record for Activity {
    fn id(&self) -> RecordId {
        self.id
    }
}

// =============================================================================
// Form inputs
// =============================================================================

/// Contact form submission.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactInput {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    pub company: String,
    #[serde(default)]
    pub job_title: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub pin_code: String,
    #[serde(default)]
    pub linkedin_url: String,
    #[serde(default)]
    pub status: ContactStatus,
    /// Raw comma-separated tag string as typed.
    #[serde(default)]
    pub tags: String,
    #[serde(default)]
    pub notes: String,
}

impl ContactInput {
    pub fn to_create_fields(&self) -> Fields {
        let tags = crate::util::join_tags(&crate::util::parse_tags(&self.tags));
        let value = json!({
            "Name": display_name(&self.first_name, &self.last_name),
            "first_name_c": self.first_name,
            "last_name_c": self.last_name,
            "email_c": self.email,
            "phone_c": self.phone,
            "company_c": self.company,
            "job_title_c": self.job_title,
            "city_c": self.city,
            "state_c": self.state,
            "pin_code_c": self.pin_code,
            "linkedin_url_c": self.linkedin_url,
            "status_c": self.status.as_str(),
            "tags_c": tags,
            "notes_c": self.notes,
        });
        into_fields(value)
    }
}

/// Partial contact update; only `Some` fields are sent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub job_title: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub pin_code: Option<String>,
    pub linkedin_url: Option<String>,
    pub status: Option<ContactStatus>,
    pub tags: Option<String>,
    pub notes: Option<String>,
}

impl ContactPatch {
    /// Update payload. `Name` is recomputed whenever a name part changes;
    /// a missing counterpart is read as empty.
    pub fn to_update_fields(&self, id: RecordId) -> Fields {
        let mut f = Fields::new();
        f.insert("Id".into(), json!(id));
        if self.first_name.is_some() || self.last_name.is_some() {
            let first = self.first_name.as_deref().unwrap_or("");
            let last = self.last_name.as_deref().unwrap_or("");
            f.insert("Name".into(), json!(display_name(first, last)));
        }
        put(&mut f, "first_name_c", &self.first_name);
        put(&mut f, "last_name_c", &self.last_name);
        put(&mut f, "email_c", &self.email);
        put(&mut f, "phone_c", &self.phone);
        put(&mut f, "company_c", &self.company);
        put(&mut f, "job_title_c", &self.job_title);
        put(&mut f, "city_c", &self.city);
        put(&mut f, "state_c", &self.state);
        put(&mut f, "pin_code_c", &self.pin_code);
        put(&mut f, "linkedin_url_c", &self.linkedin_url);
        if let Some(status) = self.status {
            f.insert("status_c".into(), json!(status.as_str()));
        }
        if let Some(ref tags) = self.tags {
            let joined = crate::util::join_tags(&crate::util::parse_tags(tags));
            f.insert("tags_c".into(), json!(joined));
        }
        put(&mut f, "notes_c", &self.notes);
        f
    }
}

impl From<ContactInput> for ContactPatch {
    fn from(i: ContactInput) -> Self {
        Self {
            first_name: Some(i.first_name),
            last_name: Some(i.last_name),
            email: Some(i.email),
            phone: Some(i.phone),
            company: Some(i.company),
            job_title: Some(i.job_title),
            city: Some(i.city),
            state: Some(i.state),
            pin_code: Some(i.pin_code),
            linkedin_url: Some(i.linkedin_url),
            status: Some(i.status),
            tags: Some(i.tags),
            notes: Some(i.notes),
        }
    }
}

/// Company form submission.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyInput {
    pub name: String,
    #[serde(default)]
    pub industry: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub zip_code: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub website: String,
    #[serde(default)]
    pub tags: String,
}

impl CompanyInput {
    pub fn to_create_fields(&self) -> Fields {
        let tags = crate::util::join_tags(&crate::util::parse_tags(&self.tags));
        into_fields(json!({
            "Name": self.name,
            "Tags": tags,
            "name_c": self.name,
            "industry_c": self.industry,
            "address_c": self.address,
            "city_c": self.city,
            "state_c": self.state,
            "zip_code_c": self.zip_code,
            "phone_c": self.phone,
            "website_c": self.website,
        }))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyPatch {
    pub name: Option<String>,
    pub industry: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub tags: Option<String>,
}

impl CompanyPatch {
    pub fn to_update_fields(&self, id: RecordId) -> Fields {
        let mut f = Fields::new();
        f.insert("Id".into(), json!(id));
        if let Some(ref name) = self.name {
            f.insert("name_c".into(), json!(name));
            f.insert("Name".into(), json!(name));
        }
        if let Some(ref tags) = self.tags {
            let joined = crate::util::join_tags(&crate::util::parse_tags(tags));
            f.insert("Tags".into(), json!(joined));
        }
        put(&mut f, "industry_c", &self.industry);
        put(&mut f, "address_c", &self.address);
        put(&mut f, "city_c", &self.city);
        put(&mut f, "state_c", &self.state);
        put(&mut f, "zip_code_c", &self.zip_code);
        put(&mut f, "phone_c", &self.phone);
        put(&mut f, "website_c", &self.website);
        f
    }
}

impl From<CompanyInput> for CompanyPatch {
    fn from(i: CompanyInput) -> Self {
        Self {
            name: Some(i.name),
            industry: Some(i.industry),
            address: Some(i.address),
            city: Some(i.city),
            state: Some(i.state),
            zip_code: Some(i.zip_code),
            phone: Some(i.phone),
            website: Some(i.website),
            tags: Some(i.tags),
        }
    }
}

/// Default win probability on a fresh deal form.
pub const DEFAULT_PROBABILITY: i64 = 20;

/// Deal form submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DealInput {
    pub title: String,
    pub contact_id: Option<RecordId>,
    pub value: f64,
    #[serde(default)]
    pub stage: DealStage,
    #[serde(default = "default_probability")]
    pub probability: i64,
    pub expected_close: String,
    #[serde(default)]
    pub notes: String,
}

fn default_probability() -> i64 {
    DEFAULT_PROBABILITY
}

impl Default for DealInput {
    fn default() -> Self {
        Self {
            title: String::new(),
            contact_id: None,
            value: 0.0,
            stage: DealStage::Lead,
            probability: DEFAULT_PROBABILITY,
            expected_close: String::new(),
            notes: String::new(),
        }
    }
}

impl DealInput {
    pub fn to_create_fields(&self) -> Fields {
        into_fields(json!({
            "Name": self.title,
            "title_c": self.title,
            "contact_id_c": self.contact_id,
            "value_c": self.value.max(0.0),
            "stage_c": self.stage.as_str(),
            "probability_c": clamp_probability(self.probability),
            "expected_close_c": self.expected_close,
            "notes_c": self.notes,
        }))
    }
}

pub fn clamp_probability(p: i64) -> i64 {
    p.clamp(0, 100)
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DealPatch {
    pub title: Option<String>,
    pub contact_id: Option<RecordId>,
    pub value: Option<f64>,
    pub stage: Option<DealStage>,
    pub probability: Option<i64>,
    pub expected_close: Option<String>,
    pub notes: Option<String>,
    pub name: Option<String>,
}

impl DealPatch {
    /// Patch touching only the stage field.
    pub fn stage_only(stage: DealStage) -> Self {
        Self {
            stage: Some(stage),
            ..Default::default()
        }
    }

    pub fn to_update_fields(&self, id: RecordId) -> Fields {
        let mut f = Fields::new();
        f.insert("Id".into(), json!(id));
        put(&mut f, "title_c", &self.title);
        if let Some(contact_id) = self.contact_id {
            f.insert("contact_id_c".into(), json!(contact_id));
        }
        if let Some(value) = self.value {
            f.insert("value_c".into(), json!(value.max(0.0)));
        }
        if let Some(stage) = self.stage {
            f.insert("stage_c".into(), json!(stage.as_str()));
        }
        if let Some(p) = self.probability {
            f.insert("probability_c".into(), json!(clamp_probability(p)));
        }
        put(&mut f, "expected_close_c", &self.expected_close);
        put(&mut f, "notes_c", &self.notes);
        put(&mut f, "Name", &self.name);
        f
    }
}

impl From<DealInput> for DealPatch {
    fn from(i: DealInput) -> Self {
        Self {
            name: Some(i.title.clone()),
            title: Some(i.title),
            contact_id: i.contact_id,
            value: Some(i.value),
            stage: Some(i.stage),
            probability: Some(i.probability),
            expected_close: Some(i.expected_close),
            notes: Some(i.notes),
        }
    }
}

/// New activity. `timestamp` defaults to now when absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityInput {
    #[serde(default)]
    pub activity_type: ActivityType,
    pub description: String,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub deal_id: Option<RecordId>,
    #[serde(default)]
    pub contact_id: Option<RecordId>,
}

impl ActivityInput {
    pub fn to_create_fields(&self) -> Fields {
        let name = if self.description.trim().is_empty() {
            "Activity".to_string()
        } else {
            self.description.clone()
        };
        let timestamp = self
            .timestamp
            .clone()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| chrono::Utc::now().to_rfc3339());
        let mut f = into_fields(json!({
            "Name": name,
            "type_c": self.activity_type.as_str(),
            "description_c": self.description,
            "timestamp_c": timestamp,
        }));
        if let Some(deal_id) = self.deal_id {
            f.insert("deal_id_c".into(), json!(deal_id));
        }
        if let Some(contact_id) = self.contact_id {
            f.insert("contact_id_c".into(), json!(contact_id));
        }
        f
    }
}

fn put(f: &mut Fields, key: &str, value: &Option<String>) {
    if let Some(v) = value {
        f.insert(key.to_string(), json!(v));
    }
}

fn into_fields(value: Value) -> Fields {
    match value {
        Value::Object(map) => map,
        _ => Fields::new(),
    }
}

// =============================================================================
// Navigation
// =============================================================================

/// Top-level routes of the navigation shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Route {
    Dashboard,
    Pipeline,
    Contacts,
    Companies,
    Settings,
}

impl Route {
    pub const ALL: [Route; 5] = [
        Self::Dashboard,
        Self::Pipeline,
        Self::Contacts,
        Self::Companies,
        Self::Settings,
    ];

    pub fn path(&self) -> &'static str {
        match self {
            Self::Dashboard => "/",
            Self::Pipeline => "/pipeline",
            Self::Contacts => "/contacts",
            Self::Companies => "/companies",
            Self::Settings => "/settings",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Dashboard => "Dashboard",
            Self::Pipeline => "Pipeline",
            Self::Contacts => "Contacts",
            Self::Companies => "Companies",
            Self::Settings => "Settings",
        }
    }

    /// Resolve a route from its name or path (`"pipeline"`, `"/pipeline"`).
    pub fn parse(raw: &str) -> Option<Self> {
        let key = raw.trim().trim_start_matches('/').to_ascii_lowercase();
        if key.is_empty() {
            return Some(Self::Dashboard);
        }
        Self::ALL
            .into_iter()
            .find(|r| r.label().eq_ignore_ascii_case(&key))
    }
}

// =============================================================================
// Configuration
// =============================================================================

pub const DEFAULT_BASE_URL: &str = "https://api.apper.io/v1";

/// Application configuration, stored in ~/.salesdesk/config.json.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub project_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
    /// Server function invoked after a contact is created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub welcome_email_function: Option<String>,
    /// Serve seeded sample records from memory instead of the record service.
    #[serde(default)]
    pub demo_data: bool,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            project_id: String::new(),
            public_key: None,
            welcome_email_function: None,
            demo_data: false,
        }
    }
}

impl Config {
    /// Copy safe to show on the settings page.
    pub fn redacted(&self) -> Self {
        Self {
            public_key: self.public_key.as_ref().map(|_| "********".to_string()),
            ..self.clone()
        }
    }
}
