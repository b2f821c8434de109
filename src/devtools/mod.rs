//! Sample records for demo data mode.
//!
//! Seeds an in-memory gateway with a small, internally consistent CRM:
//! companies, contacts at those companies, deals across every stage, and
//! a trail of activities. Dates are relative to now so the dashboard feed
//! always looks current.

use serde_json::json;

use crate::gateway::memory::MemoryGateway;
use crate::gateway::RecordKind;

/// A fresh in-memory gateway holding the sample records.
pub fn demo_gateway() -> MemoryGateway {
    let gw = MemoryGateway::new();
    seed_demo_data(&gw);
    gw
}

pub(crate) fn seed_demo_data(gw: &MemoryGateway) {
    let now = chrono::Utc::now();
    let days_ago = |n: i64| -> String { (now - chrono::Duration::days(n)).to_rfc3339() };
    let date_in = |n: i64| -> String {
        (now + chrono::Duration::days(n))
            .format("%Y-%m-%d")
            .to_string()
    };

    // --- Companies ---
    let companies: [(i64, &str, &str, &str, &str, &str, &str); 4] = [
        (1, "Acme Corp", "Manufacturing", "Chicago", "IL", "https://acme.example.com", "enterprise,manufacturing"),
        (2, "Globex Industries", "Energy", "Portland", "OR", "https://globex.example.com", "energy"),
        (3, "Initech", "Software", "Austin", "TX", "https://initech.example.com", "software,smb"),
        (4, "Umbrella Health", "Healthcare", "Boston", "MA", "", ""),
    ];
    for (id, name, industry, city, state, website, tags) in companies {
        gw.seed(
            RecordKind::Company,
            json!({
                "Id": id, "Name": name, "Tags": tags, "name_c": name,
                "industry_c": industry, "city_c": city, "state_c": state,
                "website_c": website, "CreatedOn": days_ago(90),
            }),
        );
    }

    // --- Contacts ---
    let contacts: [(i64, &str, &str, &str, &str, &str, i64); 6] = [
        (1, "Sarah", "Chen", "Acme Corp", "VP Operations", "active", 2),
        (2, "Marcus", "Webb", "Globex Industries", "CTO", "active", 5),
        (3, "Priya", "Natarajan", "Initech", "Head of IT", "lead", 12),
        (4, "Tom", "Alvarez", "Acme Corp", "Procurement Lead", "active", 1),
        (5, "Lena", "Fischer", "Umbrella Health", "Director of Finance", "inactive", 60),
        (6, "Jordan", "Blake", "Initech", "Engineering Manager", "lead", 20),
    ];
    for (id, first, last, company, title, status, last_contact) in contacts {
        gw.seed(
            RecordKind::Contact,
            json!({
                "Id": id, "Name": format!("{} {}", first, last),
                "first_name_c": first, "last_name_c": last,
                "email_c": format!("{}.{}@example.com", first.to_lowercase(), last.to_lowercase()),
                "phone_c": format!("555-01{:02}", id), "company_c": company,
                "job_title_c": title, "status_c": status, "tags_c": "",
                "created_at_c": days_ago(120), "last_contact_c": days_ago(last_contact),
            }),
        );
    }

    // --- Deals ---
    let deals: [(i64, &str, i64, f64, &str, i64, i64); 8] = [
        (1, "Acme line automation", 1, 120_000.0, "negotiation", 70, 20),
        (2, "Acme spare parts contract", 4, 18_500.0, "proposal", 50, 35),
        (3, "Globex grid analytics", 2, 240_000.0, "qualified", 30, 60),
        (4, "Initech license expansion", 3, 32_000.0, "lead", 10, 75),
        (5, "Initech support renewal", 6, 12_000.0, "closed-won", 100, -10),
        (6, "Umbrella billing pilot", 5, 45_000.0, "closed-lost", 0, -30),
        (7, "Globex field tablets", 2, 58_000.0, "proposal", 40, 45),
        (8, "Acme safety audit", 1, 9_800.0, "closed-won", 100, -5),
    ];
    for (id, title, contact, value, stage, probability, close_in) in deals {
        gw.seed(
            RecordKind::Deal,
            json!({
                "Id": id, "Name": title, "title_c": title, "contact_id_c": contact,
                "value_c": value, "stage_c": stage, "probability_c": probability,
                "expected_close_c": date_in(close_in), "notes_c": "",
                "created_at_c": days_ago(100), "updated_at_c": days_ago(3),
            }),
        );
    }

    // --- Activities ---
    let activities: [(i64, &str, &str, Option<i64>, i64, i64); 7] = [
        (1, "call", "Pricing walkthrough with Sarah", Some(1), 1, 0),
        (2, "email", "Sent revised proposal", Some(2), 4, 1),
        (3, "meeting", "Grid analytics discovery session", Some(3), 2, 3),
        (4, "call", "Intro call", Some(4), 3, 6),
        (5, "other", "Shared case study", None, 6, 8),
        (6, "email", "Renewal signed", Some(5), 6, 10),
        (7, "meeting", "Quarterly review", None, 2, 14),
    ];
    for (id, kind, description, deal, contact, age) in activities {
        gw.seed(
            RecordKind::Activity,
            json!({
                "Id": id, "Name": description, "type_c": kind,
                "description_c": description, "timestamp_c": days_ago(age),
                "deal_id_c": deal, "contact_id_c": contact,
            }),
        );
    }

    log::debug!("Seeded demo data");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{dashboard, pipeline};

    #[tokio::test]
    async fn test_demo_data_loads_every_view() {
        let gw = demo_gateway();
        assert_eq!(gw.len(RecordKind::Company), 4);
        assert_eq!(gw.len(RecordKind::Contact), 6);

        match dashboard::load_dashboard(&gw).await {
            dashboard::DashboardResult::Success { data } => {
                assert_eq!(data.metrics.total_deals, 8);
                assert_eq!(data.metrics.active_deals, 5);
                assert_eq!(data.metrics.conversion_rate_label, "25.0%");
                assert_eq!(data.recent_activities.len(), 5);
                assert_eq!(data.recent_activities[0].contact_name, "Sarah Chen");
            }
            other => panic!("expected success, got {:?}", other),
        }

        match pipeline::load_pipeline(&gw).await {
            pipeline::PipelineResult::Success { data } => assert_eq!(data.deal_count, 7),
            other => panic!("expected success, got {:?}", other),
        }
    }
}
