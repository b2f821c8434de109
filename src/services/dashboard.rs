// Dashboard service: concurrent load of deals, contacts and activities,
// reduced to headline metrics, the stage breakdown and the activity feed.

use serde::Serialize;

use crate::gateway::RecordGateway;
use crate::metrics::{recent_activities, stage_breakdown, ActivityItem, DashboardMetrics, StageCount};
use crate::types::{Activity, Contact, Deal};

/// Everything the dashboard page renders.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardData {
    pub metrics: DashboardMetrics,
    pub stage_breakdown: Vec<StageCount>,
    pub recent_activities: Vec<ActivityItem>,
}

impl DashboardData {
    pub fn build(deals: &[Deal], contacts: &[Contact], activities: &[Activity]) -> Self {
        Self {
            metrics: DashboardMetrics::compute(deals, contacts),
            stage_breakdown: stage_breakdown(deals),
            recent_activities: recent_activities(activities, contacts),
        }
    }
}

/// Result type for dashboard data loading
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum DashboardResult {
    Success { data: DashboardData },
    Error { message: String },
}

/// Load the dashboard. Any failed load turns the whole page into an error
/// state; retrying means calling this again.
pub async fn load_dashboard(gateway: &dyn RecordGateway) -> DashboardResult {
    let loaded = tokio::try_join!(
        super::deals::fetch_all(gateway),
        super::contacts::fetch_all(gateway),
        super::activities::fetch_all(gateway),
    );
    match loaded {
        Ok((deals, contacts, activities)) => {
            log::debug!(
                "Dashboard loaded: {} deals, {} contacts, {} activities",
                deals.len(),
                contacts.len(),
                activities.len()
            );
            DashboardResult::Success {
                data: DashboardData::build(&deals, &contacts, &activities),
            }
        }
        Err(e) => {
            log::error!("Failed to load dashboard data: {}", e);
            DashboardResult::Error {
                message: e.to_string(),
            }
        }
    }
}
