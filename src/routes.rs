//! Route table.
//!
//! Every API route is declared once as a [`RouteEntry`]: method, path,
//! the stages that run before the handler, the handler, and its optional
//! documentation. Entries live in [`RouteGroup`]s sharing a path prefix and
//! group-wide stages (the admin gate on `/api/users`). The same table builds
//! both the axum [`Router`] and the OpenAPI document.

use std::sync::Arc;

use axum::{
    handler::Handler,
    http::Method,
    middleware::from_fn_with_state,
    routing::{self, MethodRouter},
    Router,
};
use serde_json::Value;

use crate::docs::{openapi, ApiDoc};
use crate::error::ApiError;
use crate::handlers::{auth, demo, pages, users};
use crate::middleware::{run_pipeline, AdminGate, Pipeline, Stage};
use crate::state::AppState;
use crate::validation::{Rule, Validator};

pub struct RouteEntry {
    pub method: Method,
    pub path: &'static str,
    stages: Vec<Arc<dyn Stage>>,
    handler: MethodRouter<AppState>,
    pub doc: Option<ApiDoc>,
}

macro_rules! entry_constructor {
    ($name:ident, $method:ident) => {
        pub fn $name<H, T>(path: &'static str, handler: H) -> Self
        where
            H: Handler<T, AppState>,
            T: 'static,
        {
            Self::new(Method::$method, path, routing::$name(handler))
        }
    };
}

impl RouteEntry {
    fn new(method: Method, path: &'static str, handler: MethodRouter<AppState>) -> Self {
        Self {
            method,
            path,
            stages: Vec::new(),
            handler,
            doc: None,
        }
    }

    entry_constructor!(get, GET);
    entry_constructor!(post, POST);
    entry_constructor!(put, PUT);
    entry_constructor!(delete, DELETE);

    pub fn stage(mut self, stage: impl Stage + 'static) -> Self {
        self.stages.push(Arc::new(stage));
        self
    }

    /// Shorthand for a [`Validator`] stage.
    pub fn validate<I, R>(self, rules: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<Rule>,
    {
        self.stage(Validator::new(rules))
    }

    pub fn doc(mut self, doc: ApiDoc) -> Self {
        self.doc = Some(doc);
        self
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    fn into_method_router(self) -> MethodRouter<AppState> {
        if self.stages.is_empty() {
            return self.handler;
        }
        let pipeline = Arc::new(Pipeline::new(self.stages));
        self.handler.layer(from_fn_with_state(pipeline, run_pipeline))
    }
}

pub struct RouteGroup {
    pub prefix: &'static str,
    stages: Vec<Arc<dyn Stage>>,
    entries: Vec<RouteEntry>,
}

impl RouteGroup {
    pub fn new(prefix: &'static str) -> Self {
        Self {
            prefix,
            stages: Vec::new(),
            entries: Vec::new(),
        }
    }

    /// Stage run for every route in the group, ahead of per-route stages.
    pub fn stage(mut self, stage: impl Stage + 'static) -> Self {
        self.stages.push(Arc::new(stage));
        self
    }

    pub fn entry(mut self, entry: RouteEntry) -> Self {
        self.entries.push(entry);
        self
    }

    pub fn entries(&self) -> &[RouteEntry] {
        &self.entries
    }

    fn full_path(&self, entry: &RouteEntry) -> String {
        format!("{}{}", self.prefix, entry.path)
    }

    fn into_router(self) -> Router<AppState> {
        if self.stages.is_empty() || self.prefix.is_empty() {
            return self.into_flat_router();
        }

        // Nested so the group stages also guard paths no entry matches.
        let mut inner = Router::new();
        for entry in self.entries {
            tracing::debug!(
                "route {} {}{} stages={:?}",
                entry.method,
                self.prefix,
                entry.path,
                entry.stage_names()
            );
            inner = inner.route(entry.path, entry.into_method_router());
        }

        let pipeline = Arc::new(Pipeline::new(self.stages));
        let inner = inner
            .fallback(unmatched)
            .layer(from_fn_with_state(pipeline, run_pipeline));
        Router::new().nest(self.prefix, inner)
    }

    fn into_flat_router(self) -> Router<AppState> {
        if self.entries.is_empty() {
            return Router::new();
        }

        let mut router = Router::new();
        for entry in self.entries {
            let path = format!("{}{}", self.prefix, entry.path);
            tracing::debug!("route {} {} stages={:?}", entry.method, path, entry.stage_names());
            router = router.route(&path, entry.into_method_router());
        }

        if self.stages.is_empty() {
            return router;
        }
        let pipeline = Arc::new(Pipeline::new(self.stages));
        router.route_layer(from_fn_with_state(pipeline, run_pipeline))
    }
}

async fn unmatched() -> ApiError {
    ApiError::not_found("Not found")
}

#[derive(Default)]
pub struct RouteTable {
    groups: Vec<RouteGroup>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn group(mut self, group: RouteGroup) -> Self {
        self.groups.push(group);
        self
    }

    /// `(method, full path)` for every registered route.
    pub fn routes(&self) -> Vec<(Method, String)> {
        self.groups
            .iter()
            .flat_map(|g| g.entries.iter().map(move |e| (e.method.clone(), g.full_path(e))))
            .collect()
    }

    pub fn openapi(&self, title: &str, version: &str) -> Value {
        let documented: Vec<(&Method, String, &ApiDoc)> = self
            .groups
            .iter()
            .flat_map(|g| {
                g.entries.iter().filter_map(move |e| {
                    let doc = e.doc.as_ref()?;
                    Some((&e.method, g.full_path(e), doc))
                })
            })
            .collect();

        openapi::document(
            title,
            version,
            documented.iter().map(|(m, p, d)| (*m, p.as_str(), *d)),
        )
    }

    pub fn into_router(self) -> Router<AppState> {
        self.groups
            .into_iter()
            .fold(Router::new(), |router, group| router.merge(group.into_router()))
    }
}

/// All API routes.
pub fn route_table(state: &AppState) -> RouteTable {
    RouteTable::new()
        .group(
            RouteGroup::new("/api/auth")
                .entry(
                    RouteEntry::post("/login", auth::login)
                        .validate(["email", "password"])
                        .doc(auth::login_doc()),
                )
                .entry(RouteEntry::get("/logout", auth::logout).doc(auth::logout_doc())),
        )
        .group(
            RouteGroup::new("/api/users")
                .stage(AdminGate::new(state.sessions.clone()))
                .entry(RouteEntry::get("/all", users::get_all).doc(users::get_all_doc()))
                .entry(
                    RouteEntry::post("/add", users::add)
                        .validate([Rule::shape("user", users::USER_SHAPE)])
                        .doc(users::add_doc()),
                )
                .entry(
                    RouteEntry::put("/update", users::update)
                        .validate([Rule::shape("user", users::USER_SHAPE)])
                        .doc(users::update_doc()),
                )
                .entry(
                    RouteEntry::delete("/delete/:id", users::delete)
                        .validate([Rule::number("id").in_params()])
                        .doc(users::delete_doc()),
                ),
        )
        .group(RouteGroup::new("/api").entry(RouteEntry::get("/test2", demo::echo).doc(demo::echo_doc())))
        .group(
            RouteGroup::new("")
                .entry(RouteEntry::get("/", pages::login_page).doc(ApiDoc::new()))
                .entry(RouteEntry::get("/test", demo::echo).doc(demo::echo_doc())),
        )
}
