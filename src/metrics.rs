//! Dashboard and pipeline aggregation.
//!
//! Pure functions over already-loaded records. Malformed numbers were
//! zeroed during deserialization, so nothing here can fail.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::Serialize;

use crate::types::{Activity, Contact, ContactStatus, Deal, DealStage, RecordId, UNKNOWN_NAME};
use crate::util::parse_timestamp;

/// Number of entries in the recent-activity feed.
pub const RECENT_ACTIVITY_LIMIT: usize = 5;

pub fn active_deal_count(deals: &[Deal]) -> usize {
    deals.iter().filter(|d| !d.stage.is_closed()).count()
}

/// Sum of deal value over active (not closed) deals.
pub fn pipeline_value(deals: &[Deal]) -> f64 {
    deals
        .iter()
        .filter(|d| !d.stage.is_closed())
        .map(|d| d.value)
        .sum()
}

/// Share of all deals that are closed-won, as a percentage rounded to one
/// decimal place. Zero for an empty list.
pub fn conversion_rate(deals: &[Deal]) -> f64 {
    if deals.is_empty() {
        return 0.0;
    }
    let won = deals
        .iter()
        .filter(|d| d.stage == DealStage::ClosedWon)
        .count();
    round1(won as f64 / deals.len() as f64 * 100.0)
}

/// `"33.3%"`, or `"0%"` for a zero rate.
pub fn format_percent(rate: f64) -> String {
    if rate == 0.0 {
        "0%".to_string()
    } else {
        format!("{:.1}%", rate)
    }
}

pub fn active_contact_count(contacts: &[Contact]) -> usize {
    contacts
        .iter()
        .filter(|c| c.status == ContactStatus::Active)
        .count()
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageCount {
    pub stage: DealStage,
    pub label: &'static str,
    pub count: usize,
    /// Share of all deals (every stage, lost included).
    pub percentage: f64,
}

/// Deal count and percentage of total for each board stage, in display order.
pub fn stage_breakdown(deals: &[Deal]) -> Vec<StageCount> {
    let total = deals.len();
    DealStage::BOARD
        .iter()
        .map(|&stage| {
            let count = deals.iter().filter(|d| d.stage == stage).count();
            let percentage = if total == 0 {
                0.0
            } else {
                count as f64 / total as f64 * 100.0
            };
            StageCount {
                stage,
                label: stage.label(),
                count,
                percentage,
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageTotal {
    pub stage: DealStage,
    pub count: usize,
    pub value: f64,
}

/// Deal count and summed value per board column.
pub fn stage_column_totals(deals: &[Deal]) -> Vec<StageTotal> {
    DealStage::BOARD
        .iter()
        .map(|&stage| {
            let in_stage = deals.iter().filter(|d| d.stage == stage);
            let (count, value) = in_stage.fold((0, 0.0), |(n, v), d| (n + 1, v + d.value));
            StageTotal {
                stage,
                count,
                value,
            }
        })
        .collect()
}

/// One row of the dashboard's recent-activity feed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityItem {
    pub id: RecordId,
    pub activity_type: crate::types::ActivityType,
    pub icon: &'static str,
    pub description: String,
    pub timestamp: Option<String>,
    pub contact_name: String,
}

/// The most recent activities, newest first, with owner names resolved
/// against `contacts`. Activities without a readable timestamp sort last.
pub fn recent_activities(activities: &[Activity], contacts: &[Contact]) -> Vec<ActivityItem> {
    let names: HashMap<RecordId, String> = contacts
        .iter()
        .map(|c| (c.id, c.display_name()))
        .collect();

    let mut sorted: Vec<(&Activity, Option<chrono::DateTime<chrono::Utc>>)> = activities
        .iter()
        .map(|a| (a, a.timestamp.as_deref().and_then(parse_timestamp)))
        .collect();
    sorted.sort_by(|(_, a), (_, b)| match (a, b) {
        (Some(a), Some(b)) => b.cmp(a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });

    sorted
        .into_iter()
        .take(RECENT_ACTIVITY_LIMIT)
        .map(|(a, _)| {
            let contact_name = a
                .contact
                .as_ref()
                .and_then(|r| names.get(&r.id))
                .filter(|n| !n.is_empty())
                .cloned()
                .unwrap_or_else(|| UNKNOWN_NAME.to_string());
            ActivityItem {
                id: a.id,
                activity_type: a.activity_type,
                icon: a.activity_type.icon(),
                description: a.description.clone(),
                timestamp: a.timestamp.clone(),
                contact_name,
            }
        })
        .collect()
}

/// Headline numbers shown at the top of the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardMetrics {
    pub total_deals: usize,
    pub active_deals: usize,
    pub pipeline_value: f64,
    pub conversion_rate: f64,
    pub conversion_rate_label: String,
    pub active_contacts: usize,
    pub total_contacts: usize,
}

impl DashboardMetrics {
    pub fn compute(deals: &[Deal], contacts: &[Contact]) -> Self {
        let rate = conversion_rate(deals);
        Self {
            total_deals: deals.len(),
            active_deals: active_deal_count(deals),
            pipeline_value: pipeline_value(deals),
            conversion_rate: rate,
            conversion_rate_label: format_percent(rate),
            active_contacts: active_contact_count(contacts),
            total_contacts: contacts.len(),
        }
    }
}
