//! Permissive CORS stage.
//!
//! Every response carries the cross-origin headers; OPTIONS preflights
//! short-circuit with `204 No Content` and no body, headers attached.

use axum::{
    extract::Request,
    http::{HeaderValue, Method, StatusCode, header::HeaderMap},
    middleware::Next,
    response::Response,
};

fn apply(headers: &mut HeaderMap) {
    headers.insert("access-control-allow-origin", HeaderValue::from_static("*"));
    headers.insert(
        "access-control-allow-methods",
        HeaderValue::from_static("GET, POST, OPTIONS"),
    );
    headers.insert(
        "access-control-allow-headers",
        HeaderValue::from_static("Content-Type, X-Api-Key"),
    );
}

pub async fn cors(req: Request, next: Next) -> Response {
    if req.method() == Method::OPTIONS {
        let mut resp = Response::new(Default::default());
        *resp.status_mut() = StatusCode::NO_CONTENT;
        apply(resp.headers_mut());
        return resp;
    }

    let mut resp = next.run(req).await;
    apply(resp.headers_mut());
    resp
}
