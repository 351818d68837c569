// handlers/demo.rs - documented echo endpoints (GET /test, GET /api/test2)

use axum::{extract::RawQuery, response::Json};
use serde_json::{json, Value};

use crate::api::{parse_query, Payload};
use crate::docs::{ApiDoc, Schema};

/// Echo back whatever body and query string were sent.
///
/// The documentation below describes a richer contract than this handler
/// enforces; nothing validates these routes.
pub async fn echo(RawQuery(query): RawQuery, Payload(body): Payload<Value>) -> Json<Value> {
    Json(json!({
        "body": body,
        "query": parse_query(query.as_deref()),
    }))
}

fn abc() -> Schema {
    Schema::union(["a", "b", "c"])
}

pub fn echo_doc() -> ApiDoc {
    ApiDoc::new()
        .summary("Echo body and query")
        .tag("demo")
        .query("name", Schema::string().non_nullable())
        .query("header", Schema::list(abc().non_nullable()))
        .body("header", Schema::list(abc().non_nullable()))
        .body("message", Schema::string().non_nullable())
        .body("footer", Schema::string())
        .returns(Schema::object([(
            "data",
            Schema::object([("nestedData", abc())]),
        )]))
}
