mod common;
use common::{graph_client, mock_settings, quiet_logger};

use adsbridge::managers::accounts::AccountManager;
use adsbridge::managers::ads::AdManager;
use adsbridge::managers::adsets::AdSetManager;
use adsbridge::managers::campaigns::CampaignManager;
use adsbridge::managers::creatives::CreativeManager;
use adsbridge::managers::insights::InsightsManager;
use adsbridge::managers::objects::ObjectManager;
use adsbridge::managers::targeting::TargetingManager;
use adsbridge::services::validation::Validation;
use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn campaigns(server: &MockServer) -> CampaignManager {
    CampaignManager::new(
        quiet_logger(),
        Validation::new(),
        graph_client(mock_settings(&server.uri())),
    )
}

#[tokio::test]
async fn create_campaign_defaults_to_paused_and_rereads() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v21.0/act_42/campaigns"))
        .and(body_string_contains("status=PAUSED"))
        .and(body_string_contains("objective=OUTCOME_TRAFFIC"))
        .and(body_string_contains("special_ad_categories=%5B%5D"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "120009"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v21.0/120009"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "120009",
            "name": "Spring",
            "objective": "OUTCOME_TRAFFIC",
            "status": "PAUSED",
            "daily_budget": "1500",
            "special_ad_categories": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    let result = campaigns(&server)
        .handle_tool(
            "create_campaign",
            json!({
                "account_id": "42",
                "name": "Spring",
                "objective": "outcome_traffic",
                "daily_budget": 1500
            }),
        )
        .await
        .unwrap();
    assert_eq!(result["success"], json!(true));
    assert_eq!(result["id"], json!("120009"));
    assert_eq!(result["object"]["daily_budget"], json!(1500));
}

#[tokio::test]
async fn failed_reread_still_returns_the_new_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v21.0/act_42/campaigns"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "120010"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v21.0/120010"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": {
            "message": "Unsupported get request",
            "code": 100,
            "error_subcode": 33
        }})))
        .mount(&server)
        .await;

    let result = campaigns(&server)
        .handle_tool(
            "create_campaign",
            json!({"account_id": "act_42", "name": "Spring", "objective": "OUTCOME_SALES"}),
        )
        .await
        .unwrap();
    assert_eq!(result["id"], json!("120010"));
    assert!(result["object"].is_null());
    assert_eq!(result["reread_error"]["code"], json!("NOT_FOUND"));
}

#[tokio::test]
async fn both_budgets_are_rejected_before_any_request() {
    let server = MockServer::start().await;
    let err = campaigns(&server)
        .handle_tool(
            "create_campaign",
            json!({
                "account_id": "act_42",
                "name": "Spring",
                "objective": "OUTCOME_SALES",
                "daily_budget": 1000,
                "lifetime_budget": 50000
            }),
        )
        .await
        .unwrap_err();
    assert_eq!(err.code, "INVALID_PARAMS");
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn update_without_fields_is_invalid() {
    let server = MockServer::start().await;
    let err = campaigns(&server)
        .handle_tool("update_campaign", json!({"campaign_id": "120009"}))
        .await
        .unwrap_err();
    assert!(err.message.contains("Nothing to update"));
    assert!(err.hint.unwrap().contains("daily_budget"));
}

#[tokio::test]
async fn update_reports_changed_fields() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v21.0/120009"))
        .and(body_string_contains("status=ACTIVE"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;

    let result = campaigns(&server)
        .handle_tool(
            "update_campaign",
            json!({"campaign_id": "120009", "status": "active"}),
        )
        .await
        .unwrap();
    assert_eq!(result["updated_fields"], json!(["status"]));
}

#[tokio::test]
async fn campaign_listing_passes_effective_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v21.0/act_42/campaigns"))
        .and(query_param("effective_status", "[\"ACTIVE\"]"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"id": "1", "name": "A", "status": "ACTIVE"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let result = campaigns(&server)
        .handle_tool(
            "get_campaigns",
            json!({"account_id": "act_42", "status_filter": "active"}),
        )
        .await
        .unwrap();
    assert_eq!(result["count"], json!(1));
    assert_eq!(result["has_more"], json!(false));
}

#[tokio::test]
async fn upload_ad_image_returns_hash() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v21.0/act_42/adimages"))
        .and(body_string_contains("bytes=aGVsbG8%3D"))
        .and(body_string_contains("name=hero.png"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "images": {"hero.png": {"hash": "f00d", "url": "https://scontent.example/hero.png"}}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let manager = CreativeManager::new(
        quiet_logger(),
        Validation::new(),
        graph_client(mock_settings(&server.uri())),
    );
    let result = manager
        .handle_tool(
            "upload_ad_image",
            json!({"account_id": "act_42", "image_base64": "aGVsbG8=", "name": "hero.png"}),
        )
        .await
        .unwrap();
    assert_eq!(result["hash"], json!("f00d"));
    assert_eq!(result["images"][0]["name"], json!("hero.png"));
}

#[tokio::test]
async fn insights_default_to_last_30_days() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v21.0/120009/insights"))
        .and(query_param("date_preset", "last_30d"))
        .and(query_param("breakdowns", "age,gender"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"impressions": "1200", "clicks": "34", "spend": "12.50", "age": "25-34", "gender": "female"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let manager = InsightsManager::new(
        quiet_logger(),
        Validation::new(),
        graph_client(mock_settings(&server.uri())),
    );
    let result = manager
        .handle_tool(
            "get_insights",
            json!({"object_id": "120009", "breakdown": ["age", "gender"]}),
        )
        .await
        .unwrap();
    assert_eq!(result["count"], json!(1));
}

#[tokio::test]
async fn insights_accept_account_ids() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v21.0/act_42/insights"))
        .and(query_param("date_preset", "yesterday"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .expect(1)
        .mount(&server)
        .await;

    let manager = InsightsManager::new(
        quiet_logger(),
        Validation::new(),
        graph_client(mock_settings(&server.uri())),
    );
    let result = manager
        .handle_tool(
            "get_insights",
            json!({"object_id": "act_42", "date_preset": "yesterday"}),
        )
        .await
        .unwrap();
    assert_eq!(result["count"], json!(0));
}

#[tokio::test]
async fn delete_object_refuses_accounts() {
    let server = MockServer::start().await;
    let manager = ObjectManager::new(
        quiet_logger(),
        Validation::new(),
        graph_client(mock_settings(&server.uri())),
    );
    let err = manager
        .handle_tool("delete_object", json!({"object_id": "act_42"}))
        .await
        .unwrap_err();
    assert_eq!(err.code, "INVALID_PARAMS");
    assert!(err.message.contains("object_id must be a numeric Graph object id"));

    Mock::given(method("DELETE"))
        .and(path("/v21.0/120009"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;
    let result = manager
        .handle_tool("delete_object", json!({"object_id": "120009"}))
        .await
        .unwrap();
    assert_eq!(result, json!({"success": true, "id": "120009"}));
}

#[tokio::test]
async fn ad_accounts_default_to_me_and_name_statuses() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v21.0/me/adaccounts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {"id": "act_1", "name": "Main", "account_status": 1, "amount_spent": "9900", "spend_cap": "0"},
                {"id": "act_2", "name": "Old", "account_status": 101}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let manager = AccountManager::new(
        quiet_logger(),
        Validation::new(),
        graph_client(mock_settings(&server.uri())),
    );
    let result = manager
        .handle_tool("get_ad_accounts", json!({}))
        .await
        .unwrap();
    assert_eq!(result["count"], json!(2));
    assert_eq!(result["items"][0]["status"], json!("ACTIVE"));
    assert_eq!(result["items"][0]["amount_spent"], json!(9900));
    assert!(result["items"][0].get("spend_cap").is_none());
    assert_eq!(result["items"][1]["status"], json!("CLOSED"));
}

#[tokio::test]
async fn adsets_list_from_campaign_when_given() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v21.0/120009/adsets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"id": "230001", "name": "Broad"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let manager = AdSetManager::new(
        quiet_logger(),
        Validation::new(),
        graph_client(mock_settings(&server.uri())),
    );
    let result = manager
        .handle_tool(
            "get_adsets",
            json!({"account_id": "act_42", "campaign_id": "120009"}),
        )
        .await
        .unwrap();
    assert_eq!(result["items"][0]["id"], json!("230001"));
}

#[tokio::test]
async fn create_adset_requires_targeting_object() {
    let server = MockServer::start().await;
    let manager = AdSetManager::new(
        quiet_logger(),
        Validation::new(),
        graph_client(mock_settings(&server.uri())),
    );
    let err = manager
        .handle_tool(
            "create_adset",
            json!({
                "account_id": "act_42",
                "campaign_id": "120009",
                "name": "Broad",
                "optimization_goal": "LINK_CLICKS",
                "billing_event": "IMPRESSIONS"
            }),
        )
        .await
        .unwrap_err();
    assert!(err.message.contains("targeting"));
}

#[tokio::test]
async fn create_adset_sends_targeting_as_json() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v21.0/act_42/adsets"))
        .and(body_string_contains("targeting=%7B%22geo_locations%22"))
        .and(body_string_contains("status=PAUSED"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "230002"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v21.0/230002"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "230002", "name": "Broad"})))
        .mount(&server)
        .await;

    let manager = AdSetManager::new(
        quiet_logger(),
        Validation::new(),
        graph_client(mock_settings(&server.uri())),
    );
    let result = manager
        .handle_tool(
            "create_adset",
            json!({
                "account_id": "act_42",
                "campaign_id": "120009",
                "name": "Broad",
                "optimization_goal": "LINK_CLICKS",
                "billing_event": "IMPRESSIONS",
                "targeting": {"geo_locations": {"countries": ["US"]}},
                "daily_budget": "2000"
            }),
        )
        .await
        .unwrap();
    assert_eq!(result["object"]["name"], json!("Broad"));
}

#[tokio::test]
async fn ads_list_from_narrowest_container() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v21.0/230001/ads"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .expect(1)
        .mount(&server)
        .await;

    let manager = AdManager::new(
        quiet_logger(),
        Validation::new(),
        graph_client(mock_settings(&server.uri())),
    );
    let result = manager
        .handle_tool(
            "get_ads",
            json!({"account_id": "act_42", "campaign_id": "120009", "adset_id": "230001"}),
        )
        .await
        .unwrap();
    assert_eq!(result, json!({"count": 0, "items": [], "has_more": false}));
}

#[tokio::test]
async fn update_ad_swaps_creative() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v21.0/340001"))
        .and(body_string_contains("creative=%7B%22creative_id%22%3A%22555%22%7D"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;

    let manager = AdManager::new(
        quiet_logger(),
        Validation::new(),
        graph_client(mock_settings(&server.uri())),
    );
    let result = manager
        .handle_tool("update_ad", json!({"ad_id": "340001", "creative_id": "555"}))
        .await
        .unwrap();
    assert_eq!(result["updated_fields"], json!(["creative_id"]));
}

fn targeting(server: &MockServer) -> TargetingManager {
    TargetingManager::new(
        quiet_logger(),
        Validation::new(),
        graph_client(mock_settings(&server.uri())),
    )
}

#[tokio::test]
async fn behaviors_search_uses_targeting_category_class() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v21.0/search"))
        .and(query_param("type", "adTargetingCategory"))
        .and(query_param("class", "behaviors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"id": "6002714895372", "name": "Frequent travelers", "type": "behaviors", "path": ["Travel"]}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let result = targeting(&server)
        .handle_tool("search_behaviors", json!({}))
        .await
        .unwrap();
    assert_eq!(result["count"], json!(1));
    assert_eq!(result["items"][0]["name"], json!("Frequent travelers"));
}

#[tokio::test]
async fn interest_and_demographic_searches_send_query_and_class() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v21.0/search"))
        .and(query_param("type", "adinterest"))
        .and(query_param("q", "running"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"id": "6003397425735", "name": "Running"}]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v21.0/search"))
        .and(query_param("type", "adTargetingCategory"))
        .and(query_param("class", "life_events"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .expect(1)
        .mount(&server)
        .await;

    let manager = targeting(&server);
    let interests = manager
        .handle_tool("search_interests", json!({"query": "running"}))
        .await
        .unwrap();
    assert_eq!(interests["items"][0]["id"], json!("6003397425735"));
    let demographics = manager
        .handle_tool("search_demographics", json!({"demographic_class": "Life_Events"}))
        .await
        .unwrap();
    assert_eq!(demographics["count"], json!(0));

    let err = manager
        .handle_tool("search_demographics", json!({"demographic_class": "hobbies"}))
        .await
        .unwrap_err();
    assert_eq!(err.code, "INVALID_PARAMS");
}

#[tokio::test]
async fn geo_search_sends_location_types_as_json() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v21.0/search"))
        .and(query_param("type", "adgeolocation"))
        .and(query_param("q", "berl"))
        .and(query_param("location_types", r#"["city","region"]"#))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"key": "2420379", "name": "Berlin", "type": "city", "country_code": "DE"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let result = targeting(&server)
        .handle_tool(
            "search_geo_locations",
            json!({"query": "berl", "location_types": ["City", "region"]}),
        )
        .await
        .unwrap();
    assert_eq!(result["items"][0]["id"], json!("2420379"));
}

#[tokio::test]
async fn reach_estimate_sends_json_targeting_spec() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v21.0/act_42/reachestimate"))
        .and(query_param(
            "targeting_spec",
            r#"{"geo_locations":{"countries":["US"]}}"#,
        ))
        .and(query_param("optimization_goal", "REACH"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"users_lower_bound": 1200000, "users_upper_bound": 1400000, "estimate_ready": true}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let result = targeting(&server)
        .handle_tool(
            "estimate_audience_size",
            json!({
                "account_id": "42",
                "targeting": {"geo_locations": {"countries": ["US"]}},
                "optimization_goal": "REACH"
            }),
        )
        .await
        .unwrap();
    assert_eq!(result["users_lower_bound"], json!(1200000));
    assert_eq!(result["estimate_ready"], json!(true));
}
