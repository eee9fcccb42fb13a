mod support;

use axum::http::StatusCode;
use axum::Router;
use serde_json::{json, Value};
use uuid::Uuid;

use support::{body_json, db, get_request, json_request, send, test_config};
use server::startup::{build_app, build_state};

const PASSWORD: &str = "Passw0rd!";

async fn register_and_login(app: &Router, body: Value) -> anyhow::Result<(String, String)> {
    let email = body["email"].as_str().unwrap_or_default().to_string();
    let resp = send(app, json_request("POST", "/auth/register", None, body)?).await?;
    assert_eq!(resp.status(), StatusCode::CREATED);
    login(app, &email).await
}

async fn login(app: &Router, email: &str) -> anyhow::Result<(String, String)> {
    let resp = send(app, json_request("POST", "/auth/login", None, json!({"email": email, "password": PASSWORD}))?).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await?;
    Ok((
        body["token"].as_str().unwrap_or_default().to_string(),
        body["user"]["id"].as_str().unwrap_or_default().to_string(),
    ))
}

async fn call(app: &Router, method: &str, uri: &str, token: Option<&str>, body: Value) -> anyhow::Result<(StatusCode, Value)> {
    let req = if method == "GET" { get_request(uri, token)? } else { json_request(method, uri, token, body)? };
    let resp = send(app, req).await?;
    let status = resp.status();
    Ok((status, body_json(resp).await?))
}

#[tokio::test]
async fn profiles_are_edited_per_role() -> anyhow::Result<()> {
    let Some(db) = db().await else { return Ok(()) };
    let app = build_app(build_state(db, &test_config()));
    let tag = Uuid::new_v4().simple().to_string();

    let (customer, _) = register_and_login(&app, json!({
        "email": format!("pc_{tag}@example.com"), "name": "Cora", "password": PASSWORD, "role": "customer", "pincode": "560001"
    })).await?;
    let (status, profile) = call(&app, "GET", "/auth/profile", Some(&customer), Value::Null).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["role"], "customer");
    assert_eq!(profile["customer"]["pincode"], "560001");
    assert!(profile.get("professional").is_none());

    let (status, profile) = call(&app, "PUT", "/customer/profile", Some(&customer), json!({"name": "Cora Lee", "address": "7 Hill Rd", "pincode": "600001"})).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["name"], "Cora Lee");
    assert_eq!(profile["customer"]["address"], "7 Hill Rd");

    let (status, _) = call(&app, "PUT", "/auth/profile", Some(&customer), json!({"service_type": "plumbing"})).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = call(&app, "PUT", "/auth/profile", Some(&customer), json!({"pincode": "abc"})).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (pro, _) = register_and_login(&app, json!({
        "email": format!("pp_{tag}@example.com"), "name": "Pia", "password": PASSWORD, "role": "professional", "service_type": "painting"
    })).await?;
    let (status, profile) = call(&app, "PUT", "/professional/profile", Some(&pro), json!({"service_type": "Roofing", "experience": "6 years"})).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["professional"]["service_type"], "roofing");
    assert_eq!(profile["professional"]["available"], true);
    let (status, _) = call(&app, "PUT", "/professional/profile", Some(&pro), json!({"address": "somewhere"})).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn customers_find_approved_professionals() -> anyhow::Result<()> {
    let Some(db) = db().await else { return Ok(()) };
    let state = build_state(db, &test_config());
    let tag = Uuid::new_v4().simple().to_string();
    let service_type = format!("t{}", &tag[..12]);
    let admin_email = format!("admin_{tag}@example.com");
    state.auth_service.bootstrap_admin(&admin_email, "Admin", PASSWORD).await?;
    let app = build_app(state);
    let (admin, _) = login(&app, &admin_email).await?;

    let (customer, _) = register_and_login(&app, json!({
        "email": format!("sc_{tag}@example.com"), "name": "Sid", "password": PASSWORD, "role": "customer", "pincode": "110001"
    })).await?;
    let (_, pro_id) = register_and_login(&app, json!({
        "email": format!("sp_{tag}@example.com"), "name": "Ola", "password": PASSWORD, "role": "professional", "service_type": service_type
    })).await?;

    let search = format!("/professionals?service_type={service_type}");
    let (status, page) = call(&app, "GET", &search, Some(&customer), Value::Null).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 0);

    let (status, _) = call(&app, "POST", &format!("/admin/professionals/{pro_id}/verify"), Some(&admin), json!({"approve": true})).await?;
    assert_eq!(status, StatusCode::OK);
    let (_, page) = call(&app, "GET", &search, Some(&customer), Value::Null).await?;
    assert_eq!(page["total"], 1);
    assert_eq!(page["items"][0]["id"], pro_id.as_str());
    assert!(page["items"][0].get("email").is_none());

    let (_, page) = call(&app, "GET", &format!("{search}&min_rating=4"), Some(&customer), Value::Null).await?;
    assert_eq!(page["total"], 0);
    let (status, _) = call(&app, "GET", &format!("{search}&min_rating=9"), Some(&customer), Value::Null).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, service) = call(&app, "POST", "/admin/services", Some(&admin), json!({
        "name": format!("Job {tag}"), "type": service_type, "price": 80, "time_required": "1h"
    })).await?;
    let (status, page) = call(&app, "GET", &format!("/services/{}/professionals", service["id"].as_str().unwrap_or_default()), None, Value::Null).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 1);
    let (status, _) = call(&app, "GET", &format!("/services/{}/professionals", Uuid::new_v4()), None, Value::Null).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn admin_lists_users_and_customers() -> anyhow::Result<()> {
    let Some(db) = db().await else { return Ok(()) };
    let state = build_state(db, &test_config());
    let tag = Uuid::new_v4().simple().to_string();
    let admin_email = format!("admin_{tag}@example.com");
    state.auth_service.bootstrap_admin(&admin_email, "Admin", PASSWORD).await?;
    let app = build_app(state);
    let (admin, _) = login(&app, &admin_email).await?;

    register_and_login(&app, json!({
        "email": format!("lc_{tag}@example.com"), "name": "Lu", "password": PASSWORD, "role": "customer", "pincode": "400001"
    })).await?;
    register_and_login(&app, json!({
        "email": format!("lp_{tag}@example.com"), "name": "Mo", "password": PASSWORD, "role": "professional", "service_type": "cleaning"
    })).await?;

    let (status, page) = call(&app, "GET", &format!("/admin/users?q={tag}"), Some(&admin), Value::Null).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 3);
    let (_, page) = call(&app, "GET", &format!("/admin/users?q={tag}&status=pending"), Some(&admin), Value::Null).await?;
    assert_eq!(page["total"], 1);
    assert_eq!(page["items"][0]["role"], "professional");
    let (status, _) = call(&app, "GET", "/admin/users?status=deleted", Some(&admin), Value::Null).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, page) = call(&app, "GET", &format!("/admin/customers?q={tag}"), Some(&admin), Value::Null).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 1);
    assert_eq!(page["items"][0]["pincode"], "400001");
    Ok(())
}

#[tokio::test]
async fn admin_stats_follow_catalog_and_registrations() -> anyhow::Result<()> {
    let Some(db) = db().await else { return Ok(()) };
    let state = build_state(db, &test_config());
    let tag = Uuid::new_v4().simple().to_string();
    let admin_email = format!("admin_{tag}@example.com");
    state.auth_service.bootstrap_admin(&admin_email, "Admin", PASSWORD).await?;
    let app = build_app(state);
    let (admin, _) = login(&app, &admin_email).await?;

    let service_type = format!("g{}", &tag[..12]);
    let (status, before) = call(&app, "GET", "/stats/admin", Some(&admin), Value::Null).await?;
    assert_eq!(status, StatusCode::OK);
    assert!(before["services_by_type"].get(&service_type).is_none());
    let customers = before["total_customers"].as_u64().unwrap_or_default();

    let (status, service) = call(&app, "POST", "/admin/services", Some(&admin), json!({
        "name": format!("Stats {tag}"), "type": service_type, "price": 40, "time_required": "3h"
    })).await?;
    assert_eq!(status, StatusCode::CREATED);
    let (_, after) = call(&app, "GET", "/stats/admin", Some(&admin), Value::Null).await?;
    assert_eq!(after["services_by_type"][&service_type], 1);

    register_and_login(&app, json!({
        "email": format!("st_{tag}@example.com"), "name": "Ty", "password": PASSWORD, "role": "customer"
    })).await?;
    let (_, after) = call(&app, "GET", "/stats/admin", Some(&admin), Value::Null).await?;
    assert!(after["total_customers"].as_u64().unwrap_or_default() > customers);

    let uri = format!("/admin/services/{}", service["id"].as_str().unwrap_or_default());
    let resp = send(&app, json_request("DELETE", &uri, Some(&admin), Value::Null)?).await?;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    let (_, after) = call(&app, "GET", "/stats/admin", Some(&admin), Value::Null).await?;
    assert!(after["services_by_type"].get(&service_type).is_none());
    Ok(())
}
