//! Request builders and response readers

use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

pub struct TestHelpers;

impl TestHelpers {
    pub fn get(uri: &str) -> Request<Body> {
        Request::builder().method("GET").uri(uri).body(Body::empty()).unwrap()
    }

    pub fn post(uri: &str, body: impl Into<Body>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "text/csv")
            .body(body.into())
            .unwrap()
    }

    /// POST a `multipart/form-data` form with a single file field
    pub fn post_form(uri: &str, field: &str, file_name: &str, contents: &str) -> Request<Body> {
        let boundary = "playtally-test-boundary";
        let body = format!(
            "--{boundary}\r\n\
             Content-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\n\
             Content-Type: text/csv\r\n\r\n\
             {contents}\r\n\
             --{boundary}--\r\n"
        );

        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", format!("multipart/form-data; boundary={boundary}"))
            .body(Body::from(body))
            .unwrap()
    }

    pub async fn send(router: &Router, request: Request<Body>) -> Response<Body> {
        router.clone().oneshot(request).await.unwrap()
    }

    pub async fn body_text(response: Response<Body>) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    pub async fn body_json(response: Response<Body>) -> Value {
        serde_json::from_str(&Self::body_text(response).await).unwrap()
    }

    /// Poll GET /result until it stops answering 202
    pub async fn poll_result(router: &Router, task_id: &str) -> Response<Body> {
        let uri = format!("/result/{task_id}");
        let poll = async {
            loop {
                let response = Self::send(router, Self::get(&uri)).await;
                if response.status() != StatusCode::ACCEPTED {
                    return response;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        };

        tokio::time::timeout(Duration::from_secs(30), poll)
            .await
            .expect("task still processing after timeout")
    }
}
