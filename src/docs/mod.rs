//! Route documentation.
//!
//! An [`ApiDoc`] sits next to a handler in the route table and describes its
//! query parameters, body and response. It is consumed only by the OpenAPI
//! generator in [`openapi`]; nothing here is enforced at request time.
//! Enforcement is the job of [`crate::validation`], so a route may document
//! more than it validates.

pub mod openapi;
pub mod schema;

pub use schema::{Schema, SchemaKind};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApiDoc {
    pub summary: Option<String>,
    pub tag: Option<String>,
    pub query: Vec<(String, Schema)>,
    pub body: Vec<(String, Schema)>,
    pub returns: Option<Schema>,
}

impl ApiDoc {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn query(mut self, name: impl Into<String>, schema: Schema) -> Self {
        self.query.push((name.into(), schema));
        self
    }

    pub fn body(mut self, name: impl Into<String>, schema: Schema) -> Self {
        self.body.push((name.into(), schema));
        self
    }

    pub fn returns(mut self, schema: Schema) -> Self {
        self.returns = Some(schema);
        self
    }
}
