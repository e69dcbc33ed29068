use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use flowcalc::{api, config::Config, networks::find_network};
use serde_json::{json, Value};
use tower::ServiceExt;

fn app() -> Router {
    let mut cfg = Config::for_network(*find_network("polygon-mainnet").unwrap());
    cfg.buffer_time_seconds = 100;
    api::router(cfg)
}

async fn post(path: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(path)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn depleting_balance() -> Value {
    json!({ "balance_wei": "1000", "net_flow_rate_wei": "-10", "balance_timestamp": 0 })
}

#[tokio::test]
async fn reports_active_network() {
    let request = Request::builder().uri("/network").body(Body::empty()).unwrap();
    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["chain_id"], 137);
    assert_eq!(body["buffer_time_seconds"], 100);
}

#[tokio::test]
async fn projects_balance() {
    let (status, body) = post("/balance/project", json!({ "balance": depleting_balance(), "at": 150 })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["balance_wei"], "-500");
}

#[tokio::test]
async fn computes_critical_timestamp() {
    let (_, body) = post("/balance/critical", json!({ "balance": depleting_balance() })).await;
    assert_eq!(body["critical_timestamp"], 100);

    let growing = json!({ "balance_wei": "1000", "net_flow_rate_wei": "10", "balance_timestamp": 0 });
    let (_, body) = post("/balance/critical", json!({ "balance": growing })).await;
    assert!(body["critical_timestamp"].is_null());
}

#[tokio::test]
async fn normalises_flow_rate() {
    let (status, body) = post("/flow-rate", json!({ "amount_wei": "100", "unit_of_time": 60 })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["per_second_wei"], "1");
    assert_eq!(body["remainder_wei"], "40");
    assert_eq!(body["exact"], false);
}

#[tokio::test]
async fn rejects_unknown_unit_of_time() {
    let (status, body) = post("/flow-rate", json!({ "amount_wei": "100", "unit_of_time": 7 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid unit of time: 7 seconds");
}

#[tokio::test]
async fn buffer_uses_configured_time() {
    let (_, body) = post("/buffer", json!({ "flow_rate_per_second_wei": "-5" })).await;
    assert_eq!(body["buffer_wei"], "500");

    let (_, body) = post(
        "/buffer/delta",
        json!({ "old_flow_rate_wei": "0", "new_flow_rate_wei": "5" }),
    )
    .await;
    assert_eq!(body["buffer_delta_wei"], "500");
}

#[tokio::test]
async fn previews_new_stream() {
    let idle = json!({ "balance_wei": "10000", "net_flow_rate_wei": "0", "balance_timestamp": 0 });
    let (status, body) = post(
        "/stream/preview",
        json!({ "balance": idle, "old_flow_rate_wei": "0", "new_flow_rate_wei": "5" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["buffer_delta_wei"], "500");
    assert_eq!(body["new_net_flow_rate_wei"], "-5");
    assert_eq!(body["balance_after_buffer_wei"], "9500");
    assert_eq!(body["critical_timestamp"], 1900);
}

#[tokio::test]
async fn splits_accounting_periods() {
    let (status, body) = post(
        "/accounting/periods",
        json!({ "flow_rate_wei": "1", "start": 1_704_067_200u64, "end": 1_704_240_000u64, "period": "day" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let periods = body.as_array().unwrap();
    assert_eq!(periods.len(), 2);
    assert_eq!(periods[0]["amount_wei"], "86400");
}

#[tokio::test]
async fn rejects_malformed_wei() {
    let (status, body) = post("/buffer", json!({ "flow_rate_per_second_wei": "1.5" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("invalid amount"));
}

#[tokio::test]
async fn preview_honours_minimum_override() {
    let idle = json!({ "balance_wei": "10000", "net_flow_rate_wei": "0", "balance_timestamp": 0 });
    let (status, body) = post(
        "/stream/preview",
        json!({
            "balance": idle,
            "old_flow_rate_wei": "0",
            "new_flow_rate_wei": "5",
            "minimum_balance_wei": "500"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["critical_timestamp"], 1800);
}

#[tokio::test]
async fn flow_rate_accepts_token_units() {
    let (status, body) = post("/flow-rate", json!({ "amount": "0.0036", "unit_of_time": 3600 })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["amount_wei"], "3600000000000000");
    assert_eq!(body["per_second_wei"], "1000000000000");
    assert_eq!(body["per_unit_wei"], "3600000000000000");
    assert_eq!(body["exact"], true);
}

#[tokio::test]
async fn flow_rate_reports_truncated_per_unit_figure() {
    let (_, body) = post("/flow-rate", json!({ "amount_wei": "100", "unit_of_time": 60 })).await;
    assert_eq!(body["per_unit_wei"], "60");
}

#[tokio::test]
async fn flow_rate_needs_exactly_one_amount() {
    let (status, _) = post("/flow-rate", json!({ "unit_of_time": 60 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = post(
        "/flow-rate",
        json!({ "amount_wei": "1", "amount": "1", "unit_of_time": 60 }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = post("/flow-rate", json!({ "amount": "0.5.1", "unit_of_time": 60 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn reports_total_streamed() {
    let (status, body) = post(
        "/stream/streamed",
        json!({
            "flow_rate_wei": "1000000000000000000",
            "streamed_until_updated_at_wei": "500000000000000000",
            "updated_at_timestamp": 100,
            "at": 102
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["streamed_wei"], "2500000000000000000");
    assert_eq!(body["streamed"], "2.5");
}
