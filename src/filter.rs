//! Client-side search and status filtering for list views.
//!
//! The visible subset is always recomputed from the full source list, so
//! applying a filter twice gives the same result as applying it once.

use serde::Serialize;

use crate::types::{Company, Contact, ContactStatus, Record, RecordId};

/// Records that can be matched by a free-text query.
pub trait Searchable {
    /// Values tested for case-insensitive containment.
    fn search_fields(&self) -> Vec<&str>;

    /// Status used by the status filter, for kinds that have one. Kinds
    /// without a status are never filtered by status.
    fn status(&self) -> Option<ContactStatus> {
        None
    }
}

impl Searchable for Contact {
    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.first_name.as_str(),
            self.last_name.as_str(),
            self.email.as_str(),
            self.company.as_str(),
            self.name.as_str(),
        ]
    }

    fn status(&self) -> Option<ContactStatus> {
        Some(self.status)
    }
}

impl Searchable for Company {
    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.company_name.as_str(),
            self.industry.as_str(),
            self.city.as_str(),
            self.state.as_str(),
            self.name.as_str(),
        ]
    }
}

/// Status filter value. `All` is the sentinel that disables filtering.
///
/// Matching is exact on the wire value: a value that names no status
/// (`Other`) admits no record that has one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Only(ContactStatus),
    Other(String),
}

impl StatusFilter {
    pub fn parse(raw: &str) -> Self {
        if raw == "all" {
            return Self::All;
        }
        ContactStatus::ALL
            .into_iter()
            .find(|s| s.as_str() == raw)
            .map(Self::Only)
            .unwrap_or_else(|| Self::Other(raw.to_string()))
    }

    fn admits(&self, status: Option<ContactStatus>) -> bool {
        let Some(status) = status else {
            return true;
        };
        match self {
            Self::All => true,
            Self::Only(wanted) => status == *wanted,
            Self::Other(_) => false,
        }
    }
}

/// Case-insensitive containment of the query as typed. Only the empty
/// query matches everything.
pub fn matches_query<T: Searchable>(record: &T, query: &str) -> bool {
    if query.is_empty() {
        return true;
    }
    let query = query.to_lowercase();
    record
        .search_fields()
        .iter()
        .any(|f| f.to_lowercase().contains(&query))
}

/// Text AND status; returns the matching records in source order.
pub fn apply<T: Searchable + Clone>(source: &[T], query: &str, status: &StatusFilter) -> Vec<T> {
    source
        .iter()
        .filter(|r| matches_query(*r, query) && status.admits(r.status()))
        .cloned()
        .collect()
}

/// A loaded list plus its current query, filter and visible subset.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListView<T> {
    source: Vec<T>,
    query: String,
    status_filter: StatusFilter,
    visible: Vec<T>,
}

impl<T: Searchable + Record + Clone> ListView<T> {
    pub fn new(source: Vec<T>) -> Self {
        let mut view = Self {
            visible: Vec::new(),
            source,
            query: String::new(),
            status_filter: StatusFilter::All,
        };
        view.refilter();
        view
    }

    fn refilter(&mut self) {
        self.visible = apply(&self.source, &self.query, &self.status_filter);
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
        self.refilter();
    }

    pub fn set_status_filter(&mut self, filter: StatusFilter) {
        self.status_filter = filter;
        self.refilter();
    }

    pub fn replace_source(&mut self, source: Vec<T>) {
        self.source = source;
        self.refilter();
    }

    /// Drop a record after a confirmed delete. Returns whether it was present.
    pub fn remove(&mut self, id: RecordId) -> bool {
        let before = self.source.len();
        self.source.retain(|r| r.id() != id);
        self.refilter();
        self.source.len() != before
    }

    /// Insert or replace a record after a confirmed create/update.
    pub fn upsert(&mut self, record: T) {
        match self.source.iter_mut().find(|r| r.id() == record.id()) {
            Some(existing) => *existing = record,
            None => self.source.insert(0, record),
        }
        self.refilter();
    }

    pub fn source(&self) -> &[T] {
        &self.source
    }

    pub fn visible(&self) -> &[T] {
        &self.visible
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn status_filter(&self) -> &StatusFilter {
        &self.status_filter
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact(id: RecordId, first: &str, last: &str, company: &str, status: ContactStatus) -> Contact {
        Contact {
            id,
            name: format!("{} {}", first, last),
            first_name: first.into(),
            last_name: last.into(),
            email: format!("{}@example.com", first.to_lowercase()),
            company: company.into(),
            status,
            ..Default::default()
        }
    }

    fn contacts() -> Vec<Contact> {
        vec![
            contact(1, "Ada", "Lovelace", "Analytical Engines", ContactStatus::Active),
            contact(2, "Alan", "Turing", "Bletchley Park", ContactStatus::Lead),
            contact(3, "Grace", "Hopper", "US Navy", ContactStatus::Inactive),
        ]
    }

    fn ids(records: &[Contact]) -> Vec<RecordId> {
        records.iter().map(|c| c.id).collect()
    }

    #[test]
    fn test_empty_query_and_all_is_identity() {
        let source = contacts();
        assert_eq!(apply(&source, "", &StatusFilter::All), source);
    }

    #[test]
    fn test_query_is_matched_as_typed() {
        let source = contacts();
        assert_eq!(ids(&apply(&source, "lovelace", &StatusFilter::All)), vec![1]);
        assert!(apply(&source, "lovelace ", &StatusFilter::All).is_empty());
        assert!(apply(&source, "   ", &StatusFilter::All).is_empty());
    }

    #[test]
    fn test_filter_is_idempotent() {
        let source = contacts();
        for query in ["a", "PARK", "zzz", ""] {
            for status in [StatusFilter::All, StatusFilter::Only(ContactStatus::Lead)] {
                let once = apply(&source, query, &status);
                let twice = apply(&once, query, &status);
                assert_eq!(once, twice);
            }
        }
    }

    #[test]
    fn test_query_matches_any_field_case_insensitively() {
        let source = contacts();
        assert_eq!(ids(&apply(&source, "bletchley", &StatusFilter::All)), vec![2]);
        assert_eq!(ids(&apply(&source, "GRACE@", &StatusFilter::All)), vec![3]);
        assert_eq!(ids(&apply(&source, "ada love", &StatusFilter::All)), vec![1]);
    }

    #[test]
    fn test_text_and_status_combine() {
        let source = contacts();
        let only_lead = StatusFilter::Only(ContactStatus::Lead);
        assert_eq!(ids(&apply(&source, "a", &only_lead)), vec![2]);
        assert!(apply(&source, "hopper", &only_lead).is_empty());
    }

    #[test]
    fn test_status_filter_parse() {
        assert_eq!(StatusFilter::parse("all"), StatusFilter::All);
        assert_eq!(
            StatusFilter::parse("active"),
            StatusFilter::Only(ContactStatus::Active)
        );
        assert_eq!(
            StatusFilter::parse("Active"),
            StatusFilter::Other("Active".to_string())
        );
        assert_eq!(StatusFilter::parse(""), StatusFilter::Other(String::new()));
    }

    #[test]
    fn test_unknown_status_matches_no_contact() {
        let source = contacts();
        let archived = StatusFilter::parse("archived");
        assert!(apply(&source, "", &archived).is_empty());
    }

    #[test]
    fn test_kinds_without_status_ignore_status_filter() {
        let companies = vec![Company {
            id: 1,
            company_name: "Initech".into(),
            ..Default::default()
        }];
        let only_active = StatusFilter::Only(ContactStatus::Active);
        assert_eq!(apply(&companies, "", &only_active).len(), 1);
        assert_eq!(apply(&companies, "", &StatusFilter::parse("archived")).len(), 1);
    }

    #[test]
    fn test_company_search_fields() {
        let company = Company {
            id: 1,
            company_name: "Initech".into(),
            industry: "Software".into(),
            city: "Austin".into(),
            ..Default::default()
        };
        assert!(matches_query(&company, "soft"));
        assert!(matches_query(&company, "austin"));
        assert!(!matches_query(&company, "dallas"));
    }

    #[test]
    fn test_list_view_recomputes_on_every_change() {
        let mut view = ListView::new(contacts());
        assert_eq!(view.visible().len(), 3);

        view.set_query("a");
        view.set_status_filter(StatusFilter::Only(ContactStatus::Active));
        assert_eq!(ids(view.visible()), vec![1]);

        assert!(view.remove(1));
        assert!(view.visible().is_empty());
        assert!(!view.remove(1));

        view.set_status_filter(StatusFilter::All);
        assert_eq!(ids(view.visible()), vec![2, 3]);

        view.upsert(contact(4, "Anita", "Borg", "Systers", ContactStatus::Lead));
        assert_eq!(ids(view.visible()), vec![4, 2, 3]);

        view.replace_source(Vec::new());
        assert!(view.visible().is_empty());
        assert_eq!(view.query(), "a");
    }
}
