mod support;

use serde_json::json;
use serverless_api_lambda::config::AppConfig;
use serverless_api_lambda::handlers::files::handle_files_event;
use serverless_api_lambda::handlers::HttpContext;
use support::{api_event, test_config, with_body, with_path_params, with_query, InMemoryObjectStore};

const BUCKET: &str = "files-test";

fn seeded_store() -> InMemoryObjectStore {
    let store = InMemoryObjectStore::new();
    store.put(BUCKET, "uploads/1-a.txt", b"hello", Some("text/plain"));
    store.put(BUCKET, "uploads/2-b.json", b"{}", Some("application/json"));
    store.put(BUCKET, "reports/q1.pdf", b"%PDF", None);
    store
}

#[tokio::test]
async fn lists_files_under_a_prefix() {
    let config = test_config();
    let context = HttpContext::new(&config, "req-1");
    let store = seeded_store();

    let event = with_query(api_event("GET", "/files", "/files"), json!({"prefix": "uploads/"}));
    let response = handle_files_event(event, &context, &store).await;
    let body = response.json_body().expect("body should be json");

    assert_eq!(response.status_code, 200);
    assert_eq!(body["bucket"], json!(BUCKET));
    assert_eq!(body["fileCount"], json!(2));
    assert_eq!(body["prefix"], json!("uploads/"));
    assert_eq!(body["isTruncated"], json!(false));
    assert_eq!(body["files"][0]["key"], json!("uploads/1-a.txt"));
    assert_eq!(body["files"][0]["size"], json!(5));
}

#[tokio::test]
async fn listing_without_prefix_reports_root() {
    let config = test_config();
    let context = HttpContext::new(&config, "req-2");
    let store = seeded_store();

    let response = handle_files_event(api_event("GET", "/files", "/files"), &context, &store).await;
    let body = response.json_body().expect("body should be json");

    assert_eq!(body["fileCount"], json!(3));
    assert_eq!(body["prefix"], json!("/"));
}

#[tokio::test]
async fn issues_upload_url_with_defaults() {
    let config = test_config();
    let context = HttpContext::new(&config, "req-3");
    let store = InMemoryObjectStore::new();

    let event = with_body(
        api_event("POST", "/files/upload", "/files/upload"),
        json!({"fileName": "report.pdf"}),
    );
    let response = handle_files_event(event, &context, &store).await;
    let body = response.json_body().expect("body should be json");

    assert_eq!(response.status_code, 200);
    let key = body["key"].as_str().expect("key should be a string");
    assert!(key.starts_with("uploads/"));
    assert!(key.ends_with("-report.pdf"));
    assert_eq!(body["expiresIn"], json!(3600));
    assert_eq!(
        body["instructions"],
        json!("Use PUT request with the uploadUrl to upload file")
    );
    let url = body["uploadUrl"].as_str().expect("url should be a string");
    assert!(url.contains("content-type=application/octet-stream"));
}

#[tokio::test]
async fn upload_honours_requested_expiry_and_content_type() {
    let config = test_config();
    let context = HttpContext::new(&config, "req-4");
    let store = InMemoryObjectStore::new();

    let event = with_body(
        api_event("POST", "/files/upload", "/files/upload"),
        json!({"fileName": "a.csv", "contentType": "text/csv", "expirationTime": 600}),
    );
    let response = handle_files_event(event, &context, &store).await;
    let body = response.json_body().expect("body should be json");

    assert_eq!(body["expiresIn"], json!(600));
    let url = body["uploadUrl"].as_str().expect("url should be a string");
    assert!(url.contains("content-type=text/csv"));
    assert!(url.contains("expires=600"));
}

#[tokio::test]
async fn upload_without_file_name_fails_validation() {
    let config = test_config();
    let context = HttpContext::new(&config, "req-5");
    let store = InMemoryObjectStore::new();

    let event = with_body(
        api_event("POST", "/files/upload", "/files/upload"),
        json!({"expirationTime": 0}),
    );
    let response = handle_files_event(event, &context, &store).await;
    let body = response.json_body().expect("body should be json");

    assert_eq!(response.status_code, 422);
    assert_eq!(
        body["error"]["details"]["errors"],
        json!({
            "fileName": "This field is required",
            "expirationTime": "Minimum value is 1"
        })
    );
}

#[tokio::test]
async fn download_url_uses_the_decoded_key() {
    let config = AppConfig {
        signed_url_expiry_secs: 900,
        ..test_config()
    };
    let context = HttpContext::new(&config, "req-6");
    let store = seeded_store();

    let event = with_path_params(
        api_event("GET", "/files/{key}", "/files/uploads%2F1-a.txt"),
        json!({"key": "uploads%2F1-a.txt"}),
    );
    let response = handle_files_event(event, &context, &store).await;
    let body = response.json_body().expect("body should be json");

    assert_eq!(response.status_code, 200);
    assert_eq!(body["key"], json!("uploads/1-a.txt"));
    assert_eq!(body["expiresIn"], json!(900));
    assert_eq!(
        body["instructions"],
        json!("Use GET request with the downloadUrl to download file")
    );
}

#[tokio::test]
async fn raw_http_api_paths_address_nested_keys() {
    let config = test_config();
    let context = HttpContext::new(&config, "req-10");
    let store = seeded_store();

    let download = json!({
        "rawPath": "/files/uploads/1-a.txt",
        "requestContext": {"http": {"method": "GET"}}
    });
    let response = handle_files_event(download, &context, &store).await;
    let body = response.json_body().expect("body should be json");

    assert_eq!(response.status_code, 200);
    assert_eq!(body["key"], json!("uploads/1-a.txt"));
    assert!(body["downloadUrl"].is_string());

    let delete = json!({
        "rawPath": "/files/reports/q1.pdf",
        "requestContext": {"http": {"method": "DELETE"}}
    });
    let response = handle_files_event(delete, &context, &store).await;

    assert_eq!(response.status_code, 200);
    assert!(!store.contains(BUCKET, "reports/q1.pdf"));
}

#[tokio::test]
async fn download_of_missing_file_is_not_found() {
    let config = test_config();
    let context = HttpContext::new(&config, "req-7");
    let store = seeded_store();

    let event = with_path_params(
        api_event("GET", "/files/{key}", "/files/nope.txt"),
        json!({"key": "nope.txt"}),
    );
    let response = handle_files_event(event, &context, &store).await;
    let body = response.json_body().expect("body should be json");

    assert_eq!(response.status_code, 404);
    assert_eq!(body["error"]["message"], json!("File not found: nope.txt"));
}

#[tokio::test]
async fn deletes_file() {
    let config = test_config();
    let context = HttpContext::new(&config, "req-8");
    let store = seeded_store();

    let event = with_path_params(
        api_event("DELETE", "/files/{key}", "/files/reports%2Fq1.pdf"),
        json!({"key": "reports%2Fq1.pdf"}),
    );
    let response = handle_files_event(event, &context, &store).await;
    let body = response.json_body().expect("body should be json");

    assert_eq!(response.status_code, 200);
    assert_eq!(
        body,
        json!({
            "message": "File deleted successfully",
            "bucket": BUCKET,
            "key": "reports/q1.pdf"
        })
    );
    assert!(!store.contains(BUCKET, "reports/q1.pdf"));
}

#[tokio::test]
async fn missing_bucket_configuration_is_an_internal_error() {
    let config = AppConfig {
        bucket_name: None,
        ..test_config()
    };
    let context = HttpContext::new(&config, "req-9");
    let store = seeded_store();

    let response = handle_files_event(api_event("GET", "/files", "/files"), &context, &store).await;
    let body = response.json_body().expect("body should be json");

    assert_eq!(response.status_code, 500);
    assert_eq!(body["error"]["message"], json!("An unexpected error occurred"));
    assert!(!response.body.contains("BUCKET_NAME"));
}
