use super::common::*;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).expect("valid request")
}

#[tokio::test]
async fn metrics_route_returns_snapshot() {
    let response = router()
        .oneshot(get(
            "/api/v1/operatives/op-1/metrics?name=Ana%20Ruiz&phone=555-0100&as_of=2025-06-30",
        ))
        .await
        .expect("route responds");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["operative_id"], "op-1");
    assert_eq!(payload["performance"], 92);
    assert_eq!(payload["scores"]["punctuality"], 100);
    assert_eq!(payload["execution_match"], "exact");
}

#[tokio::test]
async fn metrics_route_rejects_missing_phone() {
    let response = router()
        .oneshot(get("/api/v1/operatives/op-1/metrics?name=Ana%20Ruiz"))
        .await
        .expect("route responds");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let payload = read_json_body(response).await;
    assert!(payload["error"]
        .as_str()
        .expect("error message")
        .contains("phone"));
}

#[tokio::test]
async fn rating_route_maps_unknown_operative_to_not_found() {
    let response = router()
        .oneshot(get(
            "/api/v1/operatives/op-404/rating?name=Ghost&phone=555-0404&as_of=2025-06-30",
        ))
        .await
        .expect("route responds");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn rating_route_maps_dependency_failure() {
    let response = flaky_router(Outage {
        operative: true,
        ..Outage::default()
    })
    .oneshot(get(
        "/api/v1/operatives/op-1/rating?name=Ana%20Ruiz&phone=555-0100&as_of=2025-06-30",
    ))
    .await
    .expect("route responds");

    assert_eq!(response.status(), StatusCode::FAILED_DEPENDENCY);
}

#[tokio::test]
async fn rating_route_serializes_unavailable_dimension() {
    let response = router()
        .oneshot(get(
            "/api/v1/operatives/op-1/rating?name=Ana%20Ruiz&phone=555-0100&as_of=2025-06-30",
        ))
        .await
        .expect("route responds");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["general_score"], 98);
    assert_eq!(payload["label"], "excellent");
    assert_eq!(
        payload["dimensions"]["client_satisfaction"]["status"],
        "unavailable"
    );
    assert_eq!(payload["dimensions"]["revenue"]["score"], 100);
}

#[tokio::test]
async fn ranking_route_accepts_basis_and_name() {
    let response = router()
        .oneshot(get(
            "/api/v1/fleet/ranking?name=juan&basis=sale_price&as_of=2025-06-30",
        ))
        .await
        .expect("route responds");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["result"], "ranked");
    assert_eq!(payload["confidence"], "partial");
    assert_eq!(payload["entry"]["name"], "JUAN PEREZ");
    assert_eq!(payload["entry"]["position"], 2);
}

#[tokio::test]
async fn ranking_route_requires_a_name() {
    let response = router()
        .oneshot(get("/api/v1/fleet/ranking?as_of=2025-06-30"))
        .await
        .expect("route responds");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn batch_route_returns_every_member() {
    let response = router()
        .oneshot(get("/api/v1/fleet/ranking/batch?as_of=2025-06-30"))
        .await
        .expect("route responds");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    let members = payload.as_object().expect("object keyed by name");
    assert_eq!(members.len(), 3);
    assert_eq!(payload["ANA RUIZ"]["position"], 1);
    assert_eq!(payload["LUIS GOMEZ"]["position"], 3);
}

#[tokio::test]
async fn fleet_routes_report_store_outage() {
    let outage = Outage {
        fleet: true,
        ..Outage::default()
    };

    let response = flaky_router(outage)
        .oneshot(get("/api/v1/fleet/ranking/batch?as_of=2025-06-30"))
        .await
        .expect("route responds");
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let response = flaky_router(outage)
        .oneshot(get("/api/v1/fleet/benchmarks?name=Ana&as_of=2025-06-30"))
        .await
        .expect("route responds");
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn benchmarks_route_returns_pool_standing() {
    let response = router()
        .oneshot(get("/api/v1/fleet/benchmarks?name=Luis%20Gomez&as_of=2025-06-30"))
        .await
        .expect("route responds");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["population"], 3);
    assert_eq!(payload["standing"]["result"], "ranked");
    assert_eq!(payload["standing"]["revenue_rank"], 3);
    assert_eq!(payload["top_performer"]["name"], "ANA RUIZ");
}

#[tokio::test]
async fn calendar_floor_as_of_yields_empty_results() {
    let response = router()
        .oneshot(get("/api/v1/fleet/ranking/batch?as_of=-262143-01-01"))
        .await
        .expect("route responds");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert!(payload.as_object().expect("object keyed by name").is_empty());

    let response = router()
        .oneshot(get("/api/v1/fleet/benchmarks?name=Ana%20Ruiz&as_of=-262143-01-01"))
        .await
        .expect("route responds");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["population"], 0);
}
