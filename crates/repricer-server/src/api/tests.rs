use std::io::Cursor;
use std::path::Path;

use axum::body::{to_bytes, Body};
use axum::http::Request;
use axum::response::Response;
use calamine::{open_workbook_from_rs, Data, Reader, Xlsx};
use repricer_core::{ColumnNames, Environment, MarkerPalette};
use rust_decimal::Decimal;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::upload::{download_name, report_file_name, REPORT_FILE_PREFIX, REPORT_HEADER};
use super::*;
use repricer_ledger::ArtifactFormat;

const BOUNDARY: &str = "repricer-test-boundary";

fn test_config(base_url: &str, report_dir: &Path) -> AppConfig {
    AppConfig {
        env: Environment::Test,
        bind_addr: "127.0.0.1:0".parse().expect("addr"),
        log_level: "debug".to_owned(),
        marketplace_base_url: base_url.to_owned(),
        user_agent: "repricer-test/0.1".to_owned(),
        request_timeout_secs: 5,
        max_retries: 0,
        retry_backoff_base_ms: 0,
        max_concurrent_fetches: 2,
        inter_request_delay_ms: 0,
        markdown: Decimal::TEN,
        columns: ColumnNames::default(),
        palette: MarkerPalette::default(),
        report_dir: report_dir.to_path_buf(),
        max_upload_bytes: 64 * 1024,
    }
}

fn app_for(base_url: &str, report_dir: &Path) -> Router {
    let config = test_config(base_url, report_dir);
    let client = MarketplaceClient::from_app_config(&config).expect("client");
    build_app(AppState {
        config: Arc::new(config),
        client: Arc::new(client),
    })
}

/// One `(field name, file name, contents)` per part.
fn multipart_request(parts: &[(&str, Option<&str>, &[u8])]) -> Request<Body> {
    let mut body = Vec::new();
    for (name, filename, contents) in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        let disposition = match filename {
            Some(f) => format!("form-data; name=\"{name}\"; filename=\"{f}\""),
            None => format!("form-data; name=\"{name}\""),
        };
        body.extend_from_slice(format!("Content-Disposition: {disposition}\r\n\r\n").as_bytes());
        body.extend_from_slice(contents);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .expect("request")
}

async fn body_bytes(response: Response) -> Vec<u8> {
    to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes")
        .to_vec()
}

fn report_file(response: &Response) -> String {
    response.headers()[REPORT_HEADER]
        .to_str()
        .expect("ascii")
        .to_owned()
}

fn dir_is_empty(dir: &Path) -> bool {
    std::fs::read_dir(dir).expect("read dir").next().is_none()
}

async fn json_body(response: Response) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).expect("json parse")
}

fn product_page(title: &str, price: &str) -> String {
    format!(
        r#"<html><body>
             <span id="productTitle">{title}</span>
             <span id="tp_price_block_total_price_ww">
               <span class="a-price"><span class="a-offscreen">{price}</span></span>
             </span>
           </body></html>"#
    )
}

async fn marketplace() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/dp/B0KETTLE01"))
        .respond_with(ResponseTemplate::new(200).set_body_string(product_page("Kettle", "₹95.00")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/dp/B0TOAST002"))
        .respond_with(ResponseTemplate::new(200).set_body_string(product_page("Toaster", "₹95")))
        .mount(&server)
        .await;
    server
}

const CSV: &str = "Name,Attribute 1 value(s),Regular price\n\
                   Kettle,B0KETTLE01,100\n\
                   Toaster,B0TOAST002,85\n";

#[test]
fn api_error_bad_request_maps_to_400() {
    let response = ApiError::new("req-1", "bad_request", "invalid input").into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[test]
fn api_error_unknown_code_maps_to_500() {
    let response = ApiError::new("req-1", "internal_error", "boom").into_response();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[test]
fn download_name_keeps_stem_and_switches_extension() {
    assert_eq!(
        download_name("catalog.xlsx", ArtifactFormat::Xlsx),
        "updated_catalog.xlsx"
    );
    assert_eq!(
        download_name("my \"shop\".csv", ArtifactFormat::Csv),
        "updated_my shop.csv"
    );
    assert_eq!(download_name("", ArtifactFormat::Csv), "updated_catalog.csv");
}

#[tokio::test]
async fn health_returns_ok_envelope_with_request_id() {
    let dir = tempfile::tempdir().expect("tempdir");
    let app = app_for("http://127.0.0.1:9", dir.path());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/health")
                .header("x-request-id", "req-health")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("x-request-id").map(|v| v.as_bytes()),
        Some(b"req-health".as_slice())
    );
    let json = json_body(response).await;
    assert_eq!(json["data"]["status"], "ok");
    assert_eq!(json["meta"]["request_id"], "req-health");
}

#[tokio::test]
async fn index_serves_upload_form() {
    let dir = tempfile::tempdir().expect("tempdir");
    let app = app_for("http://127.0.0.1:9", dir.path());

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).expect("request"))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let html = String::from_utf8(body_bytes(response).await).expect("utf8");
    assert!(html.contains("action=\"/upload\""));
    assert!(html.contains("name=\"file\""));
}

#[tokio::test]
async fn unknown_route_is_not_found_envelope() {
    let dir = tempfile::tempdir().expect("tempdir");
    let app = app_for("http://127.0.0.1:9", dir.path());

    let response = app
        .oneshot(Request::builder().uri("/nope").body(Body::empty()).expect("request"))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(response).await["error"]["code"], "not_found");
}

#[tokio::test]
async fn upload_without_file_part_is_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let app = app_for("http://127.0.0.1:9", dir.path());

    let response = app
        .oneshot(multipart_request(&[("note", None, b"hello".as_slice())]))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert_eq!(json["error"]["code"], "bad_request");
    assert_eq!(json["error"]["message"], "no file part in the request");
}

#[tokio::test]
async fn upload_with_empty_filename_is_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let app = app_for("http://127.0.0.1:9", dir.path());

    let response = app
        .oneshot(multipart_request(&[("file", Some(""), b"".as_slice())]))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"]["message"], "no file selected");
}

#[tokio::test]
async fn unsupported_extension_is_rejected_without_fetching() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let dir = tempfile::tempdir().expect("tempdir");
    let app = app_for(&server.uri(), dir.path());

    let response = app
        .oneshot(multipart_request(&[("file", Some("catalog.txt"), CSV.as_bytes())]))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert!(json["error"]["message"]
        .as_str()
        .expect("message")
        .contains("only CSV and Excel"));
    assert!(dir_is_empty(dir.path()));
}

#[tokio::test]
async fn missing_price_column_is_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let app = app_for("http://127.0.0.1:9", dir.path());

    let response = app
        .oneshot(multipart_request(&[(
            "file",
            Some("catalog.csv"),
            b"Attribute 1 value(s),Cost\nB0KETTLE01,100\n".as_slice(),
        )]))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let message = json_body(response).await["error"]["message"].to_string();
    assert!(message.contains("Regular price"), "got {message}");
}

#[tokio::test]
async fn oversized_upload_is_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let app = app_for("http://127.0.0.1:9", dir.path());
    let big = vec![b'a'; 70 * 1024];

    let response = app
        .oneshot(multipart_request(&[("file", Some("catalog.csv"), big.as_slice())]))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn csv_upload_returns_updated_ledger_and_writes_report() {
    let server = marketplace().await;
    let dir = tempfile::tempdir().expect("tempdir");
    let app = app_for(&server.uri(), dir.path());

    let response = app
        .oneshot(multipart_request(&[
            ("note", None, b"ignored".as_slice()),
            ("file", Some("catalog.csv"), CSV.as_bytes()),
        ]))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"updated_catalog.csv\""
    );
    assert!(response.headers()[header::CONTENT_TYPE]
        .to_str()
        .expect("ascii")
        .starts_with("text/csv"));
    let report = report_file(&response);
    assert!(report.starts_with(REPORT_FILE_PREFIX), "got {report}");

    let ledger = String::from_utf8(body_bytes(response).await).expect("utf8");
    assert_eq!(
        ledger,
        "Name,Attribute 1 value(s),Regular price\n\
         Kettle,B0KETTLE01,85\n\
         Toaster,B0TOAST002,85\n"
    );
    assert!(dir.path().join(&report).exists());
}

#[tokio::test]
async fn xlsx_upload_returns_workbook_with_updated_price() {
    let server = marketplace().await;
    let dir = tempfile::tempdir().expect("tempdir");
    let app = app_for(&server.uri(), dir.path());

    let mut wb = rust_xlsxwriter::Workbook::new();
    let ws = wb.add_worksheet();
    ws.write_string(0, 0, "Attribute 1 value(s)").expect("cell");
    ws.write_string(0, 1, "Regular price").expect("cell");
    ws.write_string(1, 0, "B0KETTLE01").expect("cell");
    ws.write_number(1, 1, 100.0).expect("cell");
    let upload = wb.save_to_buffer().expect("workbook");

    let response = app
        .oneshot(multipart_request(&[("file", Some("stock.xlsx"), upload.as_slice())]))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"updated_stock.xlsx\""
    );
    let report = report_file(&response);

    let bytes = body_bytes(response).await;
    let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes)).expect("xlsx");
    let range = workbook
        .worksheet_range_at(0)
        .expect("sheet")
        .expect("range");
    assert_eq!(range.get((1, 1)), Some(&Data::Float(85.0)));
    assert!(dir.path().join(&report).exists());
}

#[tokio::test]
async fn unreachable_marketplace_still_returns_ledger() {
    let dir = tempfile::tempdir().expect("tempdir");
    // Nothing listens on the discard port, so every fetch fails to connect.
    let app = app_for("http://127.0.0.1:9", dir.path());

    let response = app
        .oneshot(multipart_request(&[("file", Some("catalog.csv"), CSV.as_bytes())]))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let ledger = String::from_utf8(body_bytes(response).await).expect("utf8");
    assert_eq!(ledger, CSV);
}

#[tokio::test]
async fn unwritable_report_dir_still_delivers_ledger() {
    let server = marketplace().await;
    let dir = tempfile::tempdir().expect("tempdir");
    let app = app_for(&server.uri(), &dir.path().join("missing"));

    let response = app
        .oneshot(multipart_request(&[("file", Some("catalog.csv"), CSV.as_bytes())]))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(report_file(&response), "failed");
    let ledger = String::from_utf8(body_bytes(response).await).expect("utf8");
    assert_eq!(
        ledger,
        "Name,Attribute 1 value(s),Regular price\n\
         Kettle,B0KETTLE01,85\n\
         Toaster,B0TOAST002,85\n"
    );
}

#[tokio::test]
async fn each_upload_writes_its_own_report() {
    let server = marketplace().await;
    let dir = tempfile::tempdir().expect("tempdir");
    let app = app_for(&server.uri(), dir.path());

    let first = app
        .clone()
        .oneshot(multipart_request(&[("file", Some("catalog.csv"), CSV.as_bytes())]))
        .await
        .expect("response");
    let second = app
        .oneshot(multipart_request(&[("file", Some("catalog.csv"), CSV.as_bytes())]))
        .await
        .expect("response");

    let (first, second) = (report_file(&first), report_file(&second));
    assert_ne!(first, second);
    assert!(dir.path().join(&first).exists());
    assert!(dir.path().join(&second).exists());
}

#[test]
fn report_file_names_are_unique_workbooks() {
    let a = report_file_name();
    let b = report_file_name();
    assert_ne!(a, b);
    assert!(a.starts_with("price_comparison_report_"));
    assert!(Path::new(&a).extension().is_some_and(|e| e == "xlsx"));
}
