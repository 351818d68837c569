use axum::http::Method;
use serde_json::{json, Map, Value};

use super::schema::object_schema;
use super::ApiDoc;

/// Turn an axum path template into OpenAPI form: `/users/:id` → `/users/{id}`.
pub fn openapi_path(path: &str) -> String {
    path.split('/')
        .map(|segment| match segment.strip_prefix(':') {
            Some(name) => format!("{{{}}}", name),
            None => segment.to_string(),
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn path_params(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter_map(|segment| segment.strip_prefix(':'))
}

fn operation(path: &str, doc: &ApiDoc) -> Value {
    let mut parameters: Vec<Value> = path_params(path)
        .map(|name| {
            json!({
                "name": name,
                "in": "path",
                "required": true,
                "schema": { "type": "string" }
            })
        })
        .collect();

    for (name, schema) in &doc.query {
        parameters.push(json!({
            "name": name,
            "in": "query",
            "required": !schema.is_nullable(),
            "schema": schema.to_openapi()
        }));
    }

    let response_schema = doc
        .returns
        .as_ref()
        .map(|s| s.to_openapi())
        .unwrap_or_else(|| json!({ "type": "object" }));

    let mut op = json!({
        "responses": {
            "200": {
                "description": "Success",
                "content": { "application/json": { "schema": response_schema } }
            },
            "default": {
                "description": "Error",
                "content": {
                    "application/json": {
                        "schema": {
                            "type": "object",
                            "properties": { "error": { "type": "string" } },
                            "required": ["error"]
                        }
                    }
                }
            }
        }
    });

    if let Some(summary) = &doc.summary {
        op["summary"] = Value::String(summary.clone());
    }
    if let Some(tag) = &doc.tag {
        op["tags"] = json!([tag]);
    }
    if !parameters.is_empty() {
        op["parameters"] = Value::Array(parameters);
    }
    if !doc.body.is_empty() {
        op["requestBody"] = json!({
            "required": true,
            "content": { "application/json": { "schema": object_schema(&doc.body) } }
        });
    }
    op
}

/// Build an OpenAPI 3.0 document from `(method, path, doc)` triples.
pub fn document<'a, I>(title: &str, version: &str, routes: I) -> Value
where
    I: IntoIterator<Item = (&'a Method, &'a str, &'a ApiDoc)>,
{
    let mut paths = Map::new();
    for (method, path, doc) in routes {
        let entry = paths
            .entry(openapi_path(path))
            .or_insert_with(|| Value::Object(Map::new()));
        entry[method.as_str().to_ascii_lowercase()] = operation(path, doc);
    }

    json!({
        "openapi": "3.0.3",
        "info": { "title": title, "version": version },
        "paths": paths
    })
}

/// Swagger UI page that loads the generated document from `spec_url`.
pub fn swagger_ui_html(title: &str, spec_url: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8" />
  <title>{title}</title>
  <link rel="stylesheet" href="https://unpkg.com/swagger-ui-dist@5/swagger-ui.css" />
</head>
<body>
  <div id="swagger-ui"></div>
  <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-bundle.js" crossorigin></script>
  <script>
    window.onload = () => {{
      window.ui = SwaggerUIBundle({{ url: '{spec_url}', dom_id: '#swagger-ui' }});
    }};
  </script>
</body>
</html>
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docs::Schema;

    #[test]
    fn converts_path_templates() {
        assert_eq!(openapi_path("/api/users/delete/:id"), "/api/users/delete/{id}");
        assert_eq!(openapi_path("/api/users/all"), "/api/users/all");
    }

    #[test]
    fn document_lists_methods_params_and_bodies() {
        let login = ApiDoc::new()
            .summary("Log in")
            .body("email", Schema::string().non_nullable())
            .body("password", Schema::string().non_nullable());
        let delete = ApiDoc::new().tag("users");
        let search = ApiDoc::new().query("name", Schema::string().non_nullable());

        let routes = [
            (Method::POST, "/api/auth/login", &login),
            (Method::DELETE, "/api/users/delete/:id", &delete),
            (Method::GET, "/search", &search),
        ];
        let doc = document(
            "demo",
            "1.0.0",
            routes.iter().map(|(m, p, d)| (m, *p, *d)),
        );

        assert_eq!(doc["openapi"], "3.0.3");
        assert_eq!(doc["info"]["title"], "demo");

        let login_op = &doc["paths"]["/api/auth/login"]["post"];
        assert_eq!(login_op["summary"], "Log in");
        assert_eq!(
            login_op["requestBody"]["content"]["application/json"]["schema"]["required"],
            json!(["email", "password"])
        );

        let delete_op = &doc["paths"]["/api/users/delete/{id}"]["delete"];
        assert_eq!(delete_op["parameters"][0]["in"], "path");
        assert_eq!(delete_op["parameters"][0]["name"], "id");
        assert_eq!(delete_op["tags"], json!(["users"]));

        let search_op = &doc["paths"]["/search"]["get"];
        assert_eq!(search_op["parameters"][0]["in"], "query");
        assert_eq!(search_op["parameters"][0]["required"], true);
    }

    #[test]
    fn swagger_page_points_at_document_url() {
        let html = swagger_ui_html("docs", "/api-docs/openapi.json");
        assert!(html.contains("url: '/api-docs/openapi.json'"));
    }
}
