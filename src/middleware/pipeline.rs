use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body, Bytes},
    extract::{FromRequestParts, OriginalUri, Path, Request, State},
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use serde_json::Value;

use crate::api::body::{content_type, parse_body, parse_query, MAX_BODY_BYTES};
use crate::error::ApiError;

/// Read-only view of a request as seen by pipeline stages.
///
/// The body is buffered once; stages parse it on demand so a stage that
/// never looks at the body (the admin gate) is unaffected by malformed
/// payloads.
pub struct RequestView {
    parts: Parts,
    params: HashMap<String, String>,
    body: Bytes,
}

impl RequestView {
    pub fn new(parts: Parts, params: HashMap<String, String>, body: Bytes) -> Self {
        Self { parts, params, body }
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.parts.headers
    }

    /// Full request path, including any prefix a nested router stripped.
    pub fn path(&self) -> &str {
        self.parts
            .extensions
            .get::<OriginalUri>()
            .map(|uri| uri.path())
            .unwrap_or_else(|| self.parts.uri.path())
    }

    pub fn params(&self) -> &HashMap<String, String> {
        &self.params
    }

    pub fn query(&self) -> Value {
        parse_query(self.parts.uri.query())
    }

    pub fn body(&self) -> Result<Value, ApiError> {
        parse_body(content_type(&self.parts.headers), &self.body)
    }

    fn into_request(self) -> Request {
        Request::from_parts(self.parts, Body::from(self.body))
    }
}

/// One request-processing step. `Ok(())` continues with the next stage,
/// `Err` short-circuits the chain with that error's response.
#[async_trait]
pub trait Stage: Send + Sync {
    fn name(&self) -> &'static str;

    async fn check(&self, request: &RequestView) -> Result<(), ApiError>;
}

/// Ordered list of stages run ahead of a handler.
#[derive(Clone, Default)]
pub struct Pipeline {
    stages: Vec<Arc<dyn Stage>>,
}

impl Pipeline {
    pub fn new(stages: Vec<Arc<dyn Stage>>) -> Self {
        Self { stages }
    }

    /// Run every stage in order against `request`. On success the request is
    /// handed back with its original body bytes.
    pub async fn run(&self, request: Request) -> Result<Request, ApiError> {
        let (mut parts, body) = request.into_parts();

        let params = Path::<HashMap<String, String>>::from_request_parts(&mut parts, &())
            .await
            .map(|Path(params)| params)
            .unwrap_or_default();

        let body = to_bytes(body, MAX_BODY_BYTES)
            .await
            .map_err(|e| ApiError::bad_request(format!("Could not read request body: {}", e)))?;

        let view = RequestView::new(parts, params, body);
        for stage in &self.stages {
            if let Err(err) = stage.check(&view).await {
                tracing::debug!("Stage '{}' rejected {}: {}", stage.name(), view.path(), err);
                return Err(err);
            }
        }

        Ok(view.into_request())
    }
}

/// axum middleware adapter: `from_fn_with_state(Arc<Pipeline>, run_pipeline)`.
pub async fn run_pipeline(
    State(pipeline): State<Arc<Pipeline>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let request = pipeline.run(request).await?;
    Ok(next.run(request).await)
}
