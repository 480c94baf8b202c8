//! Mock gallery endpoint and pipeline construction

use query_fetch::{FetchConfig, FetchPipeline};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Path served by the mock gallery API
pub const REST_PATH: &str = "/services/rest/";

/// Gallery document with a single photo titled `title`
pub fn gallery_body(title: &str) -> serde_json::Value {
    json!({
        "photos": {
            "page": 1,
            "photo": [
                { "id": "1", "title": title, "url_m": format!("https://img.test/{title}.jpg") }
            ]
        },
        "stat": "ok"
    })
}

/// Full base URL of the mock REST endpoint
pub fn rest_url(server: &MockServer) -> String {
    format!("{}{REST_PATH}", server.uri())
}

/// Serve a gallery page, answering after `delay`
pub async fn mount_gallery_page(server: &MockServer, page: u32, title: &str, delay: Duration) {
    Mock::given(method("GET"))
        .and(path(REST_PATH))
        .and(query_param("page", page.to_string()))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(gallery_body(title))
                .set_delay(delay),
        )
        .mount(server)
        .await;
}

/// Pipeline with a short timeout so failing tests end quickly
pub fn create_pipeline() -> FetchPipeline {
    create_pipeline_with(FetchConfig {
        request_timeout: Duration::from_secs(5),
        ..Default::default()
    })
}

/// Pipeline over the real reqwest transport
pub fn create_pipeline_with(config: FetchConfig) -> FetchPipeline {
    FetchPipeline::new(config).expect("Failed to create pipeline")
}
