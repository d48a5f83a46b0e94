use super::context::{NONCE_HEADER, RequestContext};
use axum::{
    Json,
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;

pub const TOTAL_HEADER: &str = "x-wp-total";
pub const TOTAL_PAGES_HEADER: &str = "x-wp-totalpages";

/// A JSON body with the REST headers the dashboard reads
#[derive(Debug)]
pub struct RestResponse<T> {
    status: StatusCode,
    headers: HeaderMap,
    body: T,
}

impl<T: Serialize> RestResponse<T> {
    pub fn ok(body: T) -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body,
        }
    }

    pub fn created(body: T) -> Self {
        Self {
            status: StatusCode::CREATED,
            ..Self::ok(body)
        }
    }

    fn header(mut self, name: &'static str, value: HeaderValue) -> Self {
        self.headers.insert(HeaderName::from_static(name), value);
        self
    }

    /// Attach a nonce for the client to use on its next request
    #[must_use]
    pub fn with_nonce(self, nonce: &str) -> Self {
        match HeaderValue::from_str(nonce) {
            Ok(value) => self.header(NONCE_HEADER, value),
            Err(_) => self,
        }
    }

    #[must_use]
    pub fn with_context(self, ctx: &RequestContext) -> Self {
        match &ctx.nonce {
            Some(nonce) => self.with_nonce(nonce),
            None => self,
        }
    }

    #[must_use]
    pub fn with_totals(self, total: usize, total_pages: u32) -> Self {
        self.header(TOTAL_HEADER, HeaderValue::from(total))
            .header(TOTAL_PAGES_HEADER, HeaderValue::from(total_pages))
    }
}

impl<T: Serialize> IntoResponse for RestResponse<T> {
    fn into_response(self) -> Response {
        (self.status, self.headers, Json(self.body)).into_response()
    }
}
