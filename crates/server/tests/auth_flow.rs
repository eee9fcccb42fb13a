mod support;

use axum::http::StatusCode;
use serde_json::json;
use uuid::Uuid;

use support::{body_json, db, get_request, json_request, send, test_config};
use server::startup::{build_app, build_state};

#[tokio::test]
async fn test_register_and_login_flow() -> anyhow::Result<()> {
    let Some(db) = db().await else { return Ok(()) };
    let app = build_app(build_state(db, &test_config()));

    let email = format!("user_{}@example.com", Uuid::new_v4());
    let password = "S3curePass!";

    let req = json_request("POST", "/auth/register", None, json!({
        "email": email, "name": "Tester", "password": password, "role": "customer",
        "address": "1 Main St", "pincode": "560001"
    }))?;
    let resp = send(&app, req).await?;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let req = json_request("POST", "/auth/login", None, json!({"email": email, "password": password}))?;
    let resp = send(&app, req).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().get("set-cookie").is_some());
    let body = body_json(resp).await?;
    let token = body["token"].as_str().unwrap_or_default().to_string();
    assert!(!token.is_empty());

    let resp = send(&app, get_request("/auth/me", Some(&token))?).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await?["email"], email.as_str());
    Ok(())
}

#[tokio::test]
async fn test_login_wrong_password() -> anyhow::Result<()> {
    let Some(db) = db().await else { return Ok(()) };
    let app = build_app(build_state(db, &test_config()));

    let email = format!("user_{}@example.com", Uuid::new_v4());
    let req = json_request("POST", "/auth/register", None, json!({
        "email": email, "name": "Tester", "password": "StrongPass123", "role": "customer"
    }))?;
    assert_eq!(send(&app, req).await?.status(), StatusCode::CREATED);

    let req = json_request("POST", "/auth/login", None, json!({"email": email, "password": "wrong-password"}))?;
    assert_eq!(send(&app, req).await?.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn test_register_rejects_short_password_and_duplicates() -> anyhow::Result<()> {
    let Some(db) = db().await else { return Ok(()) };
    let app = build_app(build_state(db, &test_config()));

    let email = format!("user_{}@example.com", Uuid::new_v4());
    let req = json_request("POST", "/auth/register", None, json!({
        "email": email, "name": "A", "password": "short", "role": "customer"
    }))?;
    assert_eq!(send(&app, req).await?.status(), StatusCode::BAD_REQUEST);

    let body = json!({"email": email, "name": "A", "password": "LongEnough1", "role": "customer"});
    assert_eq!(send(&app, json_request("POST", "/auth/register", None, body.clone())?).await?.status(), StatusCode::CREATED);
    assert_eq!(send(&app, json_request("POST", "/auth/register", None, body)?).await?.status(), StatusCode::CONFLICT);
    Ok(())
}

#[tokio::test]
async fn test_admin_cannot_self_register() -> anyhow::Result<()> {
    let Some(db) = db().await else { return Ok(()) };
    let app = build_app(build_state(db, &test_config()));
    let req = json_request("POST", "/auth/register", None, json!({
        "email": format!("adm_{}@example.com", Uuid::new_v4()), "name": "A", "password": "LongEnough1", "role": "admin"
    }))?;
    assert_eq!(send(&app, req).await?.status(), StatusCode::BAD_REQUEST);
    Ok(())
}
