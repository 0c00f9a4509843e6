use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use nr_core::{Error, InferenceModel, Recommendations, SummaryLength};
use nr_inference::models::RemoteModel;
use nr_inference::InferenceConfig;
use serde_json::{json, Value};

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn model(url: &str) -> RemoteModel {
    RemoteModel::new(&InferenceConfig::new(url)).unwrap()
}

#[tokio::test]
async fn test_summarize_sends_plain_text_and_lengths() {
    let app = Router::new().route(
        "/summarize",
        post(|Json(body): Json<Value>| async move {
            assert_eq!(body["text"], "Hello world !");
            assert_eq!(body["max_length"], 120);
            assert_eq!(body["min_length"], 10);
            Json(json!({ "summary": "A greeting." }))
        }),
    );
    let url = serve(app).await;

    let summary = model(&url)
        .summarize("<p>Hello <b>world</b> !</p>", SummaryLength { min: 10, max: 120 })
        .await
        .unwrap();
    assert_eq!(summary, "A greeting.");
}

#[tokio::test]
async fn test_summarize_without_summary_field() {
    let app = Router::new().route("/summarize", post(|| async { Json(json!({})) }));
    let url = serve(app).await;

    let err = model(&url)
        .summarize("<p>text</p>", SummaryLength::default())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Inference(ref m) if m == "No summary returned from API"));
}

#[tokio::test]
async fn test_error_status_carries_body() {
    let app = Router::new().route(
        "/summarize",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
    );
    let url = serve(app).await;

    let err = model(&url)
        .summarize("<p>text</p>", SummaryLength::default())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Inference(ref m) if m == "API error: 500 - boom"));
}

#[tokio::test]
async fn test_recommend_ids_and_external_items() {
    let app = Router::new().route(
        "/recommend",
        post(|Json(body): Json<Value>| async move {
            assert_eq!(body["top_k"], 2);
            if body["query_text"] == "technology" {
                Json(json!({ "recommendations": ["id1", "id2"] }))
            } else {
                Json(json!({ "recommendations": [{ "title": "T", "url": "u" }] }))
            }
        }),
    );
    let url = serve(app).await;
    let model = model(&url);

    let ids = model.recommend("technology", 2).await.unwrap();
    assert_eq!(ids, Recommendations::Ids(vec!["id1".into(), "id2".into()]));

    match model.recommend("general news", 2).await.unwrap() {
        Recommendations::External(items) => assert_eq!(items[0].url.as_deref(), Some("u")),
        other => panic!("expected external items, got {:?}", other),
    }
}

#[tokio::test]
async fn test_recommend_rejects_malformed_payloads() {
    let app = Router::new().route(
        "/recommend",
        post(|Json(body): Json<Value>| async move {
            if body["query_text"] == "missing" {
                Json(json!({ "items": [] }))
            } else {
                Json(json!({ "recommendations": ["id1", { "title": "T" }] }))
            }
        }),
    );
    let url = serve(app).await;
    let model = model(&url);

    let err = model.recommend("missing", 5).await.unwrap_err();
    assert!(matches!(err, Error::Inference(ref m) if m.contains("array not found")));

    let err = model.recommend("mixed", 5).await.unwrap_err();
    assert!(matches!(err, Error::Inference(ref m) if m.starts_with("Invalid response format")));
}

#[tokio::test]
async fn test_health() {
    let up = serve(Router::new().route("/health", get(|| async { "ok" }))).await;
    assert!(model(&up).health().await.unwrap());

    let down = serve(Router::new().route(
        "/health",
        get(|| async { StatusCode::SERVICE_UNAVAILABLE }),
    ))
    .await;
    assert!(!model(&down).health().await.unwrap());
}

#[tokio::test]
async fn test_unreachable_host_is_network_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let model = model(&url);
    assert!(!model.health().await.unwrap());
    let err = model.recommend("technology", 5).await.unwrap_err();
    assert!(matches!(err, Error::Network(_)));
}
