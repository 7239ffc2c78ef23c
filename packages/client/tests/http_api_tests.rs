// ABOUTME: Integration tests for HttpDealApi against a local mock server
// ABOUTME: Verifies request shapes, envelope handling, and error status mapping

use dealflow_client::{ApiError, DealApi, HttpDealApi, ListDealsQuery};
use dealflow_core::{
    DealFilters, DealStage, DealUpdateInput, DealValue, FilterUpdate, NoteInput, PageRequest,
    StageFilter,
};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn deal_body(id: &str, stage: &str) -> serde_json::Value {
    json!({
        "id": id,
        "title": "Sponsored series",
        "brand": {"name": "Acme"},
        "value": {"amount": 4500.0, "currency": "USD"},
        "stage": stage,
        "createdAt": "2026-04-01T08:00:00Z",
        "updatedAt": "2026-04-10T08:00:00Z"
    })
}

async fn api_for(server: &MockServer) -> HttpDealApi {
    HttpDealApi::new(server.uri()).expect("Should build client")
}

// ==============================================================================
// LIST REQUESTS
// ==============================================================================

#[tokio::test]
async fn test_list_deals_encodes_filters_and_unwraps_envelope() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/deals"))
        .and(query_param("search", "acme"))
        .and(query_param("stage", "negotiation"))
        .and(query_param("sortBy", "created_at"))
        .and(query_param("sortOrder", "desc"))
        .and(query_param("page", "1"))
        .and(query_param("limit", "20"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {
                "data": [deal_body("d-1", "negotiation")],
                "pagination": {
                    "page": 1, "pageSize": 20, "totalItems": 1, "totalPages": 1,
                    "hasNextPage": false, "hasPreviousPage": false
                }
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut filters = DealFilters::default();
    filters.apply(&FilterUpdate {
        search: Some("acme".to_string()),
        stage: Some(StageFilter::Only(DealStage::Negotiation)),
        ..Default::default()
    });

    let api = api_for(&server).await;
    let page = api
        .list_deals(&ListDealsQuery::new(filters, PageRequest::default()))
        .await
        .expect("Should list deals");

    assert_eq!(page.deals.len(), 1);
    assert_eq!(page.deals[0].id, "d-1");
    assert_eq!(page.deals[0].stage, DealStage::Negotiation);
    let info = page.page_info.expect("Should carry pagination");
    assert_eq!(info.total_items, 1);
}

#[tokio::test]
async fn test_list_deals_accepts_bare_array() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/deals"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([deal_body("d-1", "lead"), deal_body("d-2", "paid")])),
        )
        .mount(&server)
        .await;

    let api = api_for(&server).await;
    let page = api
        .list_deals(&ListDealsQuery::default())
        .await
        .expect("Should list deals");
    assert_eq!(page.deals.len(), 2);
    assert!(page.page_info.is_none());
}

#[tokio::test]
async fn test_list_deals_rejects_unknown_shape() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/deals"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"items": []}})))
        .mount(&server)
        .await;

    let api = api_for(&server).await;
    let err = api.list_deals(&ListDealsQuery::default()).await.unwrap_err();
    assert!(matches!(err, ApiError::InvalidResponse(_)));
}

// ==============================================================================
// SINGLE-RESOURCE REQUESTS
// ==============================================================================

#[tokio::test]
async fn test_get_deal_maps_404_to_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/deals/missing"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"error": "deal not found"})),
        )
        .mount(&server)
        .await;

    let api = api_for(&server).await;
    let err = api.get_deal("missing").await.unwrap_err();
    assert_eq!(err, ApiError::NotFound("deal not found".to_string()));
}

#[tokio::test]
async fn test_create_deal_surfaces_validation_issues() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/deals"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "success": false,
            "error": {
                "message": "validation failed",
                "errors": [
                    {"field": "title", "message": "is required"},
                    {"field": "value.amount", "message": "must be positive"}
                ]
            }
        })))
        .mount(&server)
        .await;

    let api = api_for(&server).await;
    let input = dealflow_core::DealCreateInput::new(
        "",
        dealflow_core::Brand::named("Acme"),
        DealValue::usd(-5.0),
    );
    let err = api.create_deal(&input).await.unwrap_err();

    let issues = err.validation_issues().expect("Should be a validation error");
    assert_eq!(issues.len(), 2);
    assert_eq!(issues[0].field, "title");
    assert_eq!(issues[1].message, "must be positive");
}

#[tokio::test]
async fn test_update_stage_sends_stage_key_and_parses_deal() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/api/deals/d-7/stage"))
        .and(body_json(json!({"stage": "confirmed"})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"success": true, "data": deal_body("d-7", "confirmed")})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let api = api_for(&server).await;
    let deal = api
        .update_stage("d-7", DealStage::Confirmed)
        .await
        .expect("Should update stage");
    assert_eq!(deal.stage, DealStage::Confirmed);
}

#[tokio::test]
async fn test_update_deal_sends_only_set_fields() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/api/deals/d-3"))
        .and(body_json(json!({"title": "Renewed series"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"data": deal_body("d-3", "lead")})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let patch = DealUpdateInput {
        title: Some("Renewed series".to_string()),
        ..Default::default()
    };
    let api = api_for(&server).await;
    api.update_deal("d-3", &patch).await.expect("Should update");
}

#[tokio::test]
async fn test_delete_deal_accepts_no_content() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/api/deals/d-9"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let api = api_for(&server).await;
    api.delete_deal("d-9").await.expect("Should delete");
}

// ==============================================================================
// BULK AND SUB-RESOURCE REQUESTS
// ==============================================================================

#[tokio::test]
async fn test_bulk_update_posts_ids_and_changes() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/deals/bulk-update"))
        .and(body_json(json!({
            "ids": ["d-1", "d-2"],
            "changes": {"priority": "high"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;

    let api = api_for(&server).await;
    let ids = vec!["d-1".to_string(), "d-2".to_string()];
    let patch = DealUpdateInput {
        priority: Some(dealflow_core::Priority::High),
        ..Default::default()
    };
    api.bulk_update(&ids, &patch).await.expect("Should bulk update");
}

#[tokio::test]
async fn test_add_note_returns_created_note() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/deals/d-1/notes"))
        .and(body_json(json!({"body": "Spoke with their agency"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "data": {
                "id": "n-50",
                "body": "Spoke with their agency",
                "createdAt": "2026-04-11T10:00:00Z"
            }
        })))
        .mount(&server)
        .await;

    let api = api_for(&server).await;
    let note = api
        .add_note("d-1", &NoteInput::new("Spoke with their agency"))
        .await
        .expect("Should add note");
    assert_eq!(note.id.as_deref(), Some("n-50"));
    assert_eq!(note.body, "Spoke with their agency");
}

#[tokio::test]
async fn test_fetch_analytics_unwraps_snapshot() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/deals/analytics"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "totalDeals": 8,
                "totalValue": 36000.0,
                "averageDealSize": 4500.0,
                "conversionRate": 0.125,
                "byStage": {
                    "paid": {"count": 1, "totalValue": 4500.0, "averageAgeDays": 30.0}
                }
            }
        })))
        .mount(&server)
        .await;

    let api = api_for(&server).await;
    let snapshot = api.fetch_analytics().await.expect("Should fetch analytics");
    assert_eq!(snapshot.total_deals, 8);
    assert_eq!(snapshot.stage(DealStage::Paid).count, 1);
}

// ==============================================================================
// AUTH AND TRANSPORT FAILURES
// ==============================================================================

#[tokio::test]
async fn test_bearer_token_is_sent_when_configured() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/deals/d-1"))
        .and(header("Authorization", "Bearer sekrit"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"data": deal_body("d-1", "lead")})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let api = api_for(&server).await.with_auth_token("sekrit");
    api.get_deal("d-1").await.expect("Should authenticate");
}

#[tokio::test]
async fn test_server_error_maps_to_http_with_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/deals"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream down"))
        .mount(&server)
        .await;

    let api = api_for(&server).await;
    let err = api.list_deals(&ListDealsQuery::default()).await.unwrap_err();
    assert_eq!(
        err,
        ApiError::Http {
            status: 503,
            message: "upstream down".to_string()
        }
    );
}

#[tokio::test]
async fn test_unreachable_host_maps_to_network_error() {
    // Port 1 is never listening
    let api = HttpDealApi::new("http://127.0.0.1:1").expect("Should build client");
    let err = api.get_deal("d-1").await.unwrap_err();
    assert!(matches!(err, ApiError::Network(_)), "got {:?}", err);
}
