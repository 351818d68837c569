//! Declarative request validation.
//!
//! A [`Validator`] is a pipeline stage built from an ordered list of
//! [`Rule`]s. Each rule names a field, where to find it, and what it must
//! look like:
//!
//! ```ignore
//! Validator::new([Rule::string("email"), Rule::string("password")]);
//! Validator::new([Rule::shape("user", Shape::new("User", User::instance_of))]);
//! Validator::new([Rule::number("id").in_params()]);
//! ```
//!
//! Validation never rewrites the request; the handler sees exactly what the
//! client sent.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ApiError;
use crate::middleware::pipeline::{RequestView, Stage};

/// Request section a rule reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Location {
    #[default]
    Body,
    Query,
    Params,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Location::Body => "body",
            Location::Query => "query",
            Location::Params => "params",
        })
    }
}

/// Named structural contract for object-valued fields.
#[derive(Clone, Copy)]
pub struct Shape {
    pub name: &'static str,
    check: fn(&Value) -> bool,
}

impl Shape {
    pub const fn new(name: &'static str, check: fn(&Value) -> bool) -> Self {
        Self { name, check }
    }

    pub fn matches(&self, value: &Value) -> bool {
        (self.check)(value)
    }
}

pub type Predicate = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

#[derive(Clone)]
pub enum Kind {
    String,
    Number,
    Boolean,
    Predicate(Predicate),
    Shape(Shape),
}

impl fmt::Debug for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Kind::String => f.write_str("String"),
            Kind::Number => f.write_str("Number"),
            Kind::Boolean => f.write_str("Boolean"),
            Kind::Predicate(_) => f.write_str("Predicate"),
            Kind::Shape(shape) => write!(f, "Shape({})", shape.name),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Rule {
    pub field: String,
    pub kind: Kind,
    pub location: Location,
    pub optional: bool,
}

impl Rule {
    pub fn new(field: impl Into<String>, kind: Kind) -> Self {
        Self {
            field: field.into(),
            kind,
            location: Location::Body,
            optional: false,
        }
    }

    pub fn string(field: impl Into<String>) -> Self {
        Self::new(field, Kind::String)
    }

    pub fn number(field: impl Into<String>) -> Self {
        Self::new(field, Kind::Number)
    }

    pub fn boolean(field: impl Into<String>) -> Self {
        Self::new(field, Kind::Boolean)
    }

    pub fn shape(field: impl Into<String>, shape: Shape) -> Self {
        Self::new(field, Kind::Shape(shape))
    }

    pub fn predicate<F>(field: impl Into<String>, check: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Self::new(field, Kind::Predicate(Arc::new(check)))
    }

    pub fn in_query(mut self) -> Self {
        self.location = Location::Query;
        self
    }

    pub fn in_params(mut self) -> Self {
        self.location = Location::Params;
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Check one already-located value. `None` means the field is absent.
    pub fn check(&self, value: Option<&Value>) -> Result<(), ApiError> {
        let value = match value {
            None | Some(Value::Null) if self.optional => return Ok(()),
            None | Some(Value::Null) => {
                return Err(ApiError::validation(
                    &self.field,
                    format!(
                        "Missing required parameter \"{}\" in {}",
                        self.field, self.location
                    ),
                ))
            }
            Some(value) => value,
        };

        if self.kind_matches(value) {
            return Ok(());
        }

        let expected = match &self.kind {
            Kind::String => "must be a string".to_string(),
            Kind::Number => "must be a number".to_string(),
            Kind::Boolean => "must be a boolean".to_string(),
            Kind::Predicate(_) => "is invalid".to_string(),
            Kind::Shape(shape) => format!("does not match {}", shape.name),
        };
        Err(ApiError::validation(
            &self.field,
            format!(
                "Parameter \"{}\" in {} {}",
                self.field, self.location, expected
            ),
        ))
    }

    fn kind_matches(&self, value: &Value) -> bool {
        // Query and path values only ever arrive as text.
        let textual = matches!(self.location, Location::Query | Location::Params);

        match &self.kind {
            Kind::String => value.is_string(),
            Kind::Number => match value {
                Value::Number(_) => true,
                Value::String(s) if textual => s.trim().parse::<f64>().is_ok_and(f64::is_finite),
                _ => false,
            },
            Kind::Boolean => match value {
                Value::Bool(_) => true,
                Value::String(s) if textual => matches!(s.as_str(), "true" | "false"),
                _ => false,
            },
            Kind::Predicate(check) => check(value),
            Kind::Shape(shape) => shape.matches(value),
        }
    }
}

impl From<&str> for Rule {
    fn from(field: &str) -> Self {
        Rule::string(field)
    }
}

/// Pipeline stage enforcing an ordered rule set.
#[derive(Debug, Clone)]
pub struct Validator {
    rules: Vec<Rule>,
}

impl Validator {
    pub fn new<I, R>(rules: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<Rule>,
    {
        Self {
            rules: rules.into_iter().map(Into::into).collect(),
        }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn validate(&self, request: &RequestView) -> Result<(), ApiError> {
        let needs_body = self.rules.iter().any(|r| r.location == Location::Body);
        let needs_query = self.rules.iter().any(|r| r.location == Location::Query);

        let body = if needs_body { request.body()? } else { Value::Null };
        let query = if needs_query { request.query() } else { Value::Null };

        for rule in &self.rules {
            let params_value;
            let value = match rule.location {
                Location::Body => body.get(&rule.field),
                Location::Query => query.get(&rule.field),
                Location::Params => {
                    params_value = request.params().get(&rule.field).cloned().map(Value::String);
                    params_value.as_ref()
                }
            };
            rule.check(value)?;
        }
        Ok(())
    }
}

#[async_trait]
impl Stage for Validator {
    fn name(&self) -> &'static str {
        "validate"
    }

    async fn check(&self, request: &RequestView) -> Result<(), ApiError> {
        self.validate(request)
    }
}
