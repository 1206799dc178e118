use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use httpmock::prelude::*;
use roadside_api::{build_app, ServiceConfig};
use serde_json::{json, Value};
use tower::ServiceExt;

async fn app_against(server: &MockServer) -> Router {
    let base_url = server.base_url();
    let config = ServiceConfig::from_lookup(|key| match key {
        "ROADSIDE_OPENAI_API_KEY" => Some("sk-test".to_string()),
        "ROADSIDE_OPENAI_BASE_URL" => Some(base_url.clone()),
        "ROADSIDE_GOOGLE_MAPS_API_KEY" => Some("maps-test".to_string()),
        "ROADSIDE_GOOGLE_MAPS_BASE_URL" => Some(base_url.clone()),
        "ROADSIDE_CLASSIFIER_TIMEOUT_SECONDS" => Some("5".to_string()),
        "ROADSIDE_LOOKUP_TIMEOUT_SECONDS" => Some("5".to_string()),
        _ => None,
    });
    build_app(config).await.expect("app should build")
}

fn completion(reply: Value) -> Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "choices": [
            {
                "index": 0,
                "message": { "role": "assistant", "content": reply.to_string() },
                "finish_reason": "stop"
            }
        ]
    })
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let parsed = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, parsed)
}

#[tokio::test]
async fn health_reports_configured_capabilities() {
    let server = MockServer::start_async().await;
    let app = app_against(&server).await;

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let parsed: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(parsed["status"], "ok");
    assert_eq!(parsed["capabilities"]["classifier"], true);
    assert_eq!(parsed["capabilities"]["places_lookup"], true);
}

#[tokio::test]
async fn missing_data_is_rejected_before_any_upstream_call() {
    let server = MockServer::start_async().await;
    let classifier = server
        .mock_async(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(200).json_body(completion(json!({})));
        })
        .await;
    let app = app_against(&server).await;

    let (status, body) = send(app, post_json("/api/location/process", json!({}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["statusCode"], 400);
    assert!(body["errors"][0]
        .as_str()
        .unwrap()
        .starts_with("ValidationError"));
    assert_eq!(classifier.hits_async().await, 0);
}

#[tokio::test]
async fn empty_text_is_rejected() {
    let server = MockServer::start_async().await;
    let app = app_against(&server).await;

    let (status, body) = send(
        app,
        post_json("/api/location/process", json!({ "data": "   " })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let server = MockServer::start_async().await;
    let app = app_against(&server).await;

    let request = Request::builder()
        .method("POST")
        .uri("/api/location/process")
        .header("content-type", "application/json")
        .body(Body::from("{\"data\": "))
        .unwrap();
    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid request");
}

#[tokio::test]
async fn full_address_is_wrapped_in_success_envelope() {
    let server = MockServer::start_async().await;
    let classifier = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/chat/completions")
                .header("authorization", "Bearer sk-test")
                .body_contains("Domino's Pizza Vesu");
            then.status(200).json_body(completion(json!({
                "is_full_address": true,
                "clean_query_text": "Domino's Pizza Vesu Surat Gujarat India"
            })));
        })
        .await;
    let places = server
        .mock_async(|when, then| {
            when.method(GET).path("/maps/api/place/textsearch/json");
            then.status(200).json_body(json!({ "status": "ZERO_RESULTS", "results": [] }));
        })
        .await;
    let app = app_against(&server).await;

    let (status, body) = send(
        app,
        post_json("/api/location/process", json!({ "data": "Domino's Pizza Vesu" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["statusCode"], 200);
    assert_eq!(body["message"], "Location resolved");
    assert_eq!(
        body["data"],
        json!({
            "is_full_address": true,
            "clean_query_text": "Domino's Pizza Vesu Surat Gujarat India"
        })
    );
    assert_eq!(classifier.hits_async().await, 1);
    assert_eq!(places.hits_async().await, 0);
}

#[tokio::test]
async fn partial_description_offers_nearby_landmarks() {
    let server = MockServer::start_async().await;
    let first_round = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/chat/completions")
                .body_contains("Adajan near Star Bazaar");
            then.status(200).json_body(completion(json!({
                "is_full_address": false,
                "need_nearby_search": true,
                "search_query": "Adajan Star Bazaar Surat Gujarat"
            })));
        })
        .await;
    let places = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/maps/api/place/textsearch/json")
                .query_param("query", "Adajan Star Bazaar Surat Gujarat")
                .query_param("key", "maps-test");
            then.status(200).json_body(json!({
                "status": "OK",
                "results": [
                    { "name": "Star Bazaar", "business_status": "OPERATIONAL" },
                    { "name": "Shreeji Arcade", "business_status": "OPERATIONAL" },
                    { "name": "Old Adajan Cinema", "business_status": "CLOSED_PERMANENTLY" }
                ]
            }));
        })
        .await;
    let second_round = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/chat/completions")
                .body_contains("Shreeji Arcade");
            then.status(200).json_body(completion(json!({
                "ask_user_options": true,
                "options": ["Star Bazaar", "Shreeji Arcade", "Old Adajan Cinema", "Star Bazaar"]
            })));
        })
        .await;
    let app = app_against(&server).await;

    let (status, body) = send(
        app,
        post_json(
            "/api/location/process",
            json!({ "data": "Adajan near Star Bazaar" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Please choose one of the nearby places");
    assert_eq!(
        body["data"],
        json!({
            "ask_user_options": true,
            "landmarks": ["Star Bazaar", "Shreeji Arcade"]
        })
    );
    assert_eq!(first_round.hits_async().await, 1);
    assert_eq!(places.hits_async().await, 1);
    assert_eq!(second_round.hits_async().await, 1);
}

#[tokio::test]
async fn zero_results_returns_sentinel_without_second_classification() {
    let server = MockServer::start_async().await;
    let classifier = server
        .mock_async(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(200).json_body(completion(json!({
                "is_full_address": false,
                "need_nearby_search": true,
                "search_query": "Nowhere Lane Surat Gujarat"
            })));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/maps/api/place/textsearch/json");
            then.status(200).json_body(json!({ "status": "ZERO_RESULTS", "results": [] }));
        })
        .await;
    let app = app_against(&server).await;

    let (status, body) = send(
        app,
        post_json("/api/location/process", json!({ "data": "somewhere on nowhere lane" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "No matching places found");
    assert_eq!(
        body["data"],
        json!({ "no_results_found": true, "ask_user_options": false })
    );
    assert_eq!(classifier.hits_async().await, 1);
}

#[tokio::test]
async fn selection_resolves_to_full_address() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/chat/completions")
                .body_contains("user_selected_place")
                .body_contains("Shreeji Arcade");
            then.status(200).json_body(completion(json!({
                "is_full_address": true,
                "clean_query_text": "Shreeji Arcade Surat Gujarat India"
            })));
        })
        .await;
    let places = server
        .mock_async(|when, then| {
            when.method(GET).path("/maps/api/place/textsearch/json");
            then.status(200).json_body(json!({ "status": "ZERO_RESULTS", "results": [] }));
        })
        .await;
    let app = app_against(&server).await;

    let (status, body) = send(
        app,
        post_json(
            "/api/location/process",
            json!({ "data": { "type": "user_selected_place", "selected": "Shreeji Arcade" } }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["data"]["clean_query_text"],
        "Shreeji Arcade Surat Gujarat India"
    );
    assert_eq!(places.hits_async().await, 0);
}

#[tokio::test]
async fn classifier_outage_is_a_server_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(500).body("upstream exploded");
        })
        .await;
    let app = app_against(&server).await;

    let (status, body) = send(
        app,
        post_json("/api/location/process", json!({ "data": "Adajan" })),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
    assert_eq!(body["statusCode"], 500);
    assert_eq!(body["message"], "Location processing error");
    assert!(body["errors"][0]
        .as_str()
        .unwrap()
        .starts_with("ClassifierError"));
}

#[tokio::test]
async fn distance_endpoint_reports_road_distance() {
    let server = MockServer::start_async().await;
    let matrix = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/maps/api/distancematrix/json")
                .query_param("origins", "Adajan Surat")
                .query_param("destinations", "Vesu Surat")
                .query_param("key", "maps-test");
            then.status(200).json_body(json!({
                "status": "OK",
                "origin_addresses": ["Adajan, Surat, Gujarat, India"],
                "destination_addresses": ["Vesu, Surat, Gujarat, India"],
                "rows": [
                    {
                        "elements": [
                            {
                                "status": "OK",
                                "distance": { "text": "8.4 km", "value": 8412 },
                                "duration": { "text": "22 mins", "value": 1320 }
                            }
                        ]
                    }
                ]
            }));
        })
        .await;
    let app = app_against(&server).await;

    let (status, body) = send(
        app,
        post_json(
            "/api/distance",
            json!({ "origin": "Adajan Surat", "destination": "Vesu Surat" }),
        ),
    )
    .await;

    matrix.assert_async().await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Distance calculated");
    assert_eq!(body["data"]["distance_meters"], 8412);
    assert_eq!(body["data"]["duration_text"], "22 mins");
    assert_eq!(body["data"]["origin"], "Adajan, Surat, Gujarat, India");
}

#[tokio::test]
async fn distance_endpoint_requires_both_places() {
    let server = MockServer::start_async().await;
    let app = app_against(&server).await;

    let (status, body) = send(
        app,
        post_json("/api/distance", json!({ "origin": "Adajan Surat", "destination": " " })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0], "`destination` must be a non-empty string");
}
