// handlers/mod.rs - request handlers grouped by route family
//
// Handlers never format error responses themselves; they return
// `Result<_, ApiError>` and let `ApiError::into_response` decide.

pub mod auth;  // /api/auth/* - login, logout
pub mod demo;  // /test, /api/test2 - documented echo endpoints
pub mod pages; // /, /users, /api-docs - HTML pages and docs
pub mod users; // /api/users/* - admin-only user CRUD
