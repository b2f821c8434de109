//! Field lists requested from the record service, per record kind.

use serde_json::{json, Value};

use super::RecordKind;

/// A requested field. Reference fields ask the service to expand the
/// referenced record's `Name` alongside its Id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub reference: Option<RecordKind>,
}

const fn plain(name: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        reference: None,
    }
}

const fn reference(name: &'static str, kind: RecordKind) -> FieldSpec {
    FieldSpec {
        name,
        reference: Some(kind),
    }
}

pub const CONTACT_FIELDS: &[FieldSpec] = &[
    plain("Id"),
    plain("Name"),
    plain("first_name_c"),
    plain("last_name_c"),
    plain("email_c"),
    plain("phone_c"),
    plain("company_c"),
    plain("job_title_c"),
    plain("city_c"),
    plain("state_c"),
    plain("pin_code_c"),
    plain("linkedin_url_c"),
    plain("status_c"),
    plain("tags_c"),
    plain("notes_c"),
    plain("created_at_c"),
    plain("last_contact_c"),
];

/// Narrower projection returned by contact search.
pub const CONTACT_SEARCH_FIELDS: &[FieldSpec] = &[
    plain("Id"),
    plain("Name"),
    plain("first_name_c"),
    plain("last_name_c"),
    plain("email_c"),
    plain("phone_c"),
    plain("company_c"),
    plain("status_c"),
    plain("last_contact_c"),
];

pub const COMPANY_FIELDS: &[FieldSpec] = &[
    plain("Id"),
    plain("Name"),
    plain("Tags"),
    plain("Owner"),
    plain("CreatedOn"),
    plain("CreatedBy"),
    plain("ModifiedOn"),
    plain("ModifiedBy"),
    plain("name_c"),
    plain("industry_c"),
    plain("address_c"),
    plain("city_c"),
    plain("state_c"),
    plain("zip_code_c"),
    plain("phone_c"),
    plain("website_c"),
];

pub const COMPANY_SEARCH_FIELDS: &[FieldSpec] = &[
    plain("Id"),
    plain("Name"),
    plain("name_c"),
    plain("industry_c"),
    plain("city_c"),
    plain("state_c"),
    plain("phone_c"),
    plain("website_c"),
];

pub const DEAL_FIELDS: &[FieldSpec] = &[
    plain("Id"),
    plain("Name"),
    plain("title_c"),
    reference("contact_id_c", RecordKind::Contact),
    plain("value_c"),
    plain("stage_c"),
    plain("probability_c"),
    plain("expected_close_c"),
    plain("notes_c"),
    plain("created_at_c"),
    plain("updated_at_c"),
];

pub const ACTIVITY_FIELDS: &[FieldSpec] = &[
    plain("Id"),
    plain("Name"),
    plain("type_c"),
    plain("description_c"),
    plain("timestamp_c"),
    reference("deal_id_c", RecordKind::Deal),
    reference("contact_id_c", RecordKind::Contact),
];

/// Server-side search columns (display name is matched client-side only).
pub const CONTACT_SEARCH_COLUMNS: &[&str] = &["first_name_c", "last_name_c", "email_c", "company_c"];
pub const COMPANY_SEARCH_COLUMNS: &[&str] = &["name_c", "industry_c", "city_c", "state_c"];

/// `fields` entries in the record service's request format.
pub fn field_params(fields: &[FieldSpec]) -> Vec<Value> {
    fields
        .iter()
        .map(|f| match f.reference {
            Some(_) => json!({
                "field": { "Name": f.name },
                "referenceField": { "field": { "Name": "Name" } },
            }),
            None => json!({ "field": { "Name": f.name } }),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_kind_requests_id_and_name() {
        for kind in RecordKind::ALL {
            let names: Vec<&str> = kind.fields().iter().map(|f| f.name).collect();
            assert_eq!(&names[..2], &["Id", "Name"], "{}", kind);
        }
    }

    #[test]
    fn test_reference_fields_expand_name() {
        let params = field_params(DEAL_FIELDS);
        assert!(params[3].get("referenceField").is_some());
        assert!(params[2].get("referenceField").is_none());
    }
}
