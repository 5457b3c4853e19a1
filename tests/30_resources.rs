mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

use common::spawn_app;

#[tokio::test]
async fn create_service_returns_record_with_input_fields() -> Result<()> {
    let app = spawn_app().await?;
    let (user, token) = app.identity.user("ana@example.com");

    let service = app
        .create(
            "/api/services",
            &token,
            "service",
            json!({ "name": "Sound system", "description": "PA + mixer", "daily_price": 250.5 }),
        )
        .await?;

    assert_eq!(service["name"], "Sound system");
    assert_eq!(service["description"], "PA + mixer");
    assert_eq!(service["daily_price"], json!(250.5));
    assert_eq!(service["user_id"], json!(user.id));
    assert!(service["id"].is_string());
    assert!(service["created_at"].is_string());

    let id = service["id"].as_str().unwrap();
    let res = app.get(&format!("/api/services/{}", id), &token).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.json::<Value>().await?["service"], service);
    Ok(())
}

#[tokio::test]
async fn duplicate_name_conflicts_and_creates_nothing() -> Result<()> {
    let app = spawn_app().await?;
    let (_, token) = app.identity.user("ana@example.com");

    app.create("/api/clients", &token, "client", json!({ "name": "Acme Events" })).await?;

    let res = app
        .post("/api/clients", &token, &json!({ "name": "Acme Events", "city": "Lisbon" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let body = res.json::<Value>().await?;
    assert!(body["error"].as_str().unwrap().contains("already exists"));

    let list = app.get("/api/clients", &token).send().await?.json::<Value>().await?;
    assert_eq!(list["clients"].as_array().unwrap().len(), 1);
    Ok(())
}

#[tokio::test]
async fn same_name_is_allowed_for_another_owner() -> Result<()> {
    let app = spawn_app().await?;
    let (_, ana) = app.identity.user("ana@example.com");
    let (_, bruno) = app.identity.user("bruno@example.com");

    app.create("/api/brands", &ana, "brand", json!({ "name": "Shure" })).await?;
    app.create("/api/brands", &bruno, "brand", json!({ "name": "Shure" })).await?;
    Ok(())
}

#[tokio::test]
async fn short_name_is_rejected_with_field_detail() -> Result<()> {
    let app = spawn_app().await?;
    let (_, token) = app.identity.user("ana@example.com");

    let res = app.post("/api/services", &token, &json!({ "name": "A" })).send().await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = res.json::<Value>().await?;
    assert_eq!(body["error"], "Validation failed");
    assert_eq!(body["details"][0]["field"], "name");
    assert_eq!(body["details"][0]["message"], "name must be between 2 and 100 characters");
    Ok(())
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() -> Result<()> {
    let app = spawn_app().await?;
    let (_, token) = app.identity.user("ana@example.com");

    let res = app
        .client
        .post(app.url("/api/services"))
        .bearer_auth(&token)
        .header(reqwest::header::CONTENT_TYPE, "application/json")
        .body("{ not json")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert!(res.json::<Value>().await?["error"].is_string());
    Ok(())
}

#[tokio::test]
async fn list_is_sorted_and_owner_scoped() -> Result<()> {
    let app = spawn_app().await?;
    let (_, ana) = app.identity.user("ana@example.com");
    let (_, bruno) = app.identity.user("bruno@example.com");

    for name in ["Video wall", "Audio", "Lighting rig"] {
        app.create("/api/services", &ana, "service", json!({ "name": name })).await?;
    }
    app.create("/api/services", &bruno, "service", json!({ "name": "Bruno's service" })).await?;

    let body = app.get("/api/services", &ana).send().await?.json::<Value>().await?;
    let names: Vec<&str> = body["services"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Audio", "Lighting rig", "Video wall"]);
    Ok(())
}

#[tokio::test]
async fn other_owners_records_are_not_found() -> Result<()> {
    let app = spawn_app().await?;
    let (_, ana) = app.identity.user("ana@example.com");
    let (_, bruno) = app.identity.user("bruno@example.com");

    let supplier = app.create("/api/suppliers", &ana, "supplier", json!({ "name": "Rental Co" })).await?;
    let path = format!("/api/suppliers/{}", supplier["id"].as_str().unwrap());

    assert_eq!(app.get(&path, &bruno).send().await?.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        app.patch(&path, &bruno, &json!({ "name": "Mine now" })).send().await?.status(),
        StatusCode::NOT_FOUND
    );
    assert_eq!(app.delete(&path, &bruno).send().await?.status(), StatusCode::NOT_FOUND);
    assert_eq!(app.get(&path, &ana).send().await?.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn patch_updates_only_given_fields_and_clears_nulls() -> Result<()> {
    let app = spawn_app().await?;
    let (_, token) = app.identity.user("ana@example.com");

    let client = app
        .create(
            "/api/clients",
            &token,
            "client",
            json!({ "name": "Acme", "city": "Porto", "email": "hello@acme.test", "client_type": "individual" }),
        )
        .await?;
    let path = format!("/api/clients/{}", client["id"].as_str().unwrap());

    let res = app
        .patch(&path, &token, &json!({ "city": "Lisbon", "email": null }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let updated = res.json::<Value>().await?["client"].clone();
    assert_eq!(updated["city"], "Lisbon");
    assert_eq!(updated["email"], Value::Null);
    assert_eq!(updated["name"], "Acme");
    assert_eq!(updated["client_type"], "individual");
    Ok(())
}

#[tokio::test]
async fn empty_patch_is_rejected() -> Result<()> {
    let app = spawn_app().await?;
    let (_, token) = app.identity.user("ana@example.com");

    let service = app.create("/api/services", &token, "service", json!({ "name": "Audio" })).await?;
    let path = format!("/api/services/{}", service["id"].as_str().unwrap());

    let res = app.patch(&path, &token, &json!({})).send().await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn renaming_onto_existing_name_conflicts() -> Result<()> {
    let app = spawn_app().await?;
    let (_, token) = app.identity.user("ana@example.com");

    app.create("/api/job-positions", &token, "job_position", json!({ "name": "Stagehand" })).await?;
    let rigger = app
        .create("/api/job-positions", &token, "job_position", json!({ "name": "Rigger", "daily_price": 180 }))
        .await?;
    let path = format!("/api/job-positions/{}", rigger["id"].as_str().unwrap());

    let res = app.patch(&path, &token, &json!({ "name": "Stagehand" })).send().await?;
    assert_eq!(res.status(), StatusCode::CONFLICT);

    // Keeping its own name is not a conflict
    let res = app
        .patch(&path, &token, &json!({ "name": "Rigger", "daily_price": 200 }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.json::<Value>().await?["job_position"]["daily_price"], json!(200.0));
    Ok(())
}

#[tokio::test]
async fn delete_then_get_is_not_found() -> Result<()> {
    let app = spawn_app().await?;
    let (_, token) = app.identity.user("ana@example.com");

    let category = app.create("/api/categories", &token, "category", json!({ "name": "Lighting" })).await?;
    let path = format!("/api/categories/{}", category["id"].as_str().unwrap());

    let res = app.delete(&path, &token).send().await?;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    assert_eq!(app.get(&path, &token).send().await?.status(), StatusCode::NOT_FOUND);
    assert_eq!(app.delete(&path, &token).send().await?.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn non_uuid_id_is_not_found() -> Result<()> {
    let app = spawn_app().await?;
    let (_, token) = app.identity.user("ana@example.com");

    let res = app.get("/api/clients/42", &token).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(res.json::<Value>().await?["error"], "Client not found");
    Ok(())
}
