// Activity service: history reads (newest first) and logging new activities.

use super::{fetch_list, list_or_empty, returned};
use crate::error::CrmError;
use crate::gateway::{ListQuery, RecordGateway, RecordKind};
use crate::types::{Activity, ActivityInput, RecordId};

const KIND: RecordKind = RecordKind::Activity;

fn newest_first() -> ListQuery {
    ListQuery::all(KIND).order_desc("timestamp_c")
}

pub async fn get_all(gateway: &dyn RecordGateway) -> Vec<Activity> {
    list_or_empty(gateway, KIND, &newest_first()).await
}

pub async fn fetch_all(gateway: &dyn RecordGateway) -> Result<Vec<Activity>, CrmError> {
    fetch_list(gateway, KIND, &newest_first()).await
}

pub async fn get_by_deal(gateway: &dyn RecordGateway, deal_id: RecordId) -> Vec<Activity> {
    list_or_empty(gateway, KIND, &newest_first().where_eq("deal_id_c", deal_id)).await
}

pub async fn get_by_contact(gateway: &dyn RecordGateway, contact_id: RecordId) -> Vec<Activity> {
    list_or_empty(gateway, KIND, &newest_first().where_eq("contact_id_c", contact_id)).await
}

pub async fn create(gateway: &dyn RecordGateway, input: &ActivityInput) -> Result<Activity, CrmError> {
    let created = gateway.create(KIND, input.to_create_fields()).await?;
    returned(KIND, created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::memory::MemoryGateway;
    use crate::types::ActivityType;
    use serde_json::json;

    fn gateway() -> MemoryGateway {
        let gw = MemoryGateway::new();
        gw.seed(RecordKind::Contact, json!({ "Id": 1, "Name": "Ada Lovelace" }));
        gw.seed(RecordKind::Deal, json!({ "Id": 2, "Name": "Engine" }));
        for (id, ts, deal) in [
            (10, "2024-01-01T09:00:00Z", Some(2)),
            (11, "2024-03-01T09:00:00Z", None),
            (12, "2024-02-01T09:00:00Z", Some(2)),
        ] {
            gw.seed(
                KIND,
                json!({ "Id": id, "type_c": "email", "timestamp_c": ts, "deal_id_c": deal, "contact_id_c": 1 }),
            );
        }
        gw
    }

    fn ids(activities: &[Activity]) -> Vec<RecordId> {
        activities.iter().map(|a| a.id).collect()
    }

    #[tokio::test]
    async fn test_history_is_newest_first() {
        let gw = gateway();
        assert_eq!(ids(&get_all(&gw).await), vec![11, 12, 10]);
        assert_eq!(ids(&get_by_deal(&gw, 2).await), vec![12, 10]);
        assert_eq!(ids(&get_by_contact(&gw, 1).await), vec![11, 12, 10]);
    }

    #[tokio::test]
    async fn test_create_links_references() {
        let gw = gateway();
        let input = ActivityInput {
            activity_type: ActivityType::Meeting,
            description: "Kickoff".into(),
            deal_id: Some(2),
            contact_id: Some(1),
            ..Default::default()
        };
        let activity = create(&gw, &input).await.unwrap();
        assert_eq!(activity.name, "Kickoff");
        assert_eq!(activity.activity_type, ActivityType::Meeting);
        assert!(activity.timestamp.is_some());
        assert_eq!(activity.deal.unwrap().name.as_deref(), Some("Engine"));
    }
}
