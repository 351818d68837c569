mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn login_sets_http_only_session_cookie() -> Result<()> {
    let server = common::spawn_server().await?;

    let res = server
        .post("/api/auth/login", None)
        .json(&json!({ "email": common::ADMIN_EMAIL, "password": common::ADMIN_PASSWORD }))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::OK);
    let cookie = common::set_cookie_header(&res).expect("session cookie");
    assert!(cookie.starts_with("ExpressGeneratorTs="), "cookie: {}", cookie);
    assert!(cookie.contains("HttpOnly"), "cookie: {}", cookie);
    assert!(cookie.contains("Path=/"), "cookie: {}", cookie);
    assert_eq!(res.json::<Value>().await?, json!({}));
    Ok(())
}

#[tokio::test]
async fn login_accepts_form_bodies() -> Result<()> {
    let server = common::spawn_server().await?;

    let res = server
        .post("/api/auth/login", None)
        .header("content-type", "application/x-www-form-urlencoded")
        .body(format!(
            "email={}&password={}",
            common::USER_EMAIL.replace('@', "%40"),
            common::USER_PASSWORD
        ))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::OK);
    assert!(common::session_cookie(&res).is_some());
    Ok(())
}

#[tokio::test]
async fn wrong_password_fails_without_cookie() -> Result<()> {
    let server = common::spawn_server().await?;

    let res = server
        .post("/api/auth/login", None)
        .json(&json!({ "email": common::ADMIN_EMAIL, "password": "nope" }))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert!(common::set_cookie_header(&res).is_none());
    assert_eq!(res.json::<Value>().await?, json!({ "error": "Login failed" }));
    Ok(())
}

#[tokio::test]
async fn unknown_email_looks_like_wrong_password() -> Result<()> {
    let server = common::spawn_server().await?;

    let res = server
        .post("/api/auth/login", None)
        .json(&json!({ "email": "ghost@example.com", "password": "whatever" }))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(res.json::<Value>().await?, json!({ "error": "Login failed" }));
    Ok(())
}

#[tokio::test]
async fn missing_password_is_rejected_before_the_store() -> Result<()> {
    let server = common::spawn_server().await?;

    let res = server
        .post("/api/auth/login", None)
        .json(&json!({ "email": common::ADMIN_EMAIL }))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        res.json::<Value>().await?,
        json!({ "error": "Missing required parameter \"password\" in body" })
    );
    assert_eq!(server.store.calls(), 0);
    Ok(())
}

#[tokio::test]
async fn non_string_email_is_rejected() -> Result<()> {
    let server = common::spawn_server().await?;

    let res = server
        .post("/api/auth/login", None)
        .json(&json!({ "email": 42, "password": "x" }))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        res.json::<Value>().await?,
        json!({ "error": "Parameter \"email\" in body must be a string" })
    );
    Ok(())
}

#[tokio::test]
async fn logout_always_clears_the_cookie() -> Result<()> {
    let server = common::spawn_server().await?;

    // Without a session.
    let res = server.get("/api/auth/logout", None).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let cleared = common::set_cookie_header(&res).expect("removal cookie");
    assert!(cleared.starts_with("ExpressGeneratorTs="), "cookie: {}", cleared);
    assert!(cleared.contains("Max-Age=0"), "cookie: {}", cleared);
    assert_eq!(res.json::<Value>().await?, json!({}));

    // With one.
    let cookie = server.admin_cookie().await?;
    let res = server.get("/api/auth/logout", Some(&cookie)).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(common::set_cookie_header(&res).unwrap().contains("Max-Age=0"));
    Ok(())
}
