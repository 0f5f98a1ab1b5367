use axum::{extract::Request, middleware::Next, response::Response};

use crate::services::metrics::HTTP_REQUESTS_TOTAL;

/// Count every request by method, path and status code.
pub async fn track_requests(req: Request, next: Next) -> Response {
    let method = req.method().to_string();
    let path = req.uri().path().to_string();

    let response = next.run(req).await;

    HTTP_REQUESTS_TOTAL
        .with_label_values(&[&method, &path, response.status().as_str()])
        .inc();

    response
}
