mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

use common::spawn_app;

#[tokio::test]
async fn profile_is_created_on_first_access() -> Result<()> {
    let app = spawn_app().await?;
    let (user, token) = app.identity.user("ana@example.com");

    let res = app.get("/api/profile", &token).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let profile = res.json::<Value>().await?["profile"].clone();
    assert_eq!(profile["id"], json!(user.id));
    assert_eq!(profile["email"], "ana@example.com");
    assert_eq!(profile["role"], "user");

    // Second read returns the same row
    let again = app.get("/api/profile", &token).send().await?.json::<Value>().await?;
    assert_eq!(again["profile"]["created_at"], profile["created_at"]);
    Ok(())
}

#[tokio::test]
async fn role_cannot_be_self_assigned() -> Result<()> {
    let app = spawn_app().await?;
    let (_, token) = app.identity.user("ana@example.com");

    let res = app
        .patch(
            "/api/profile",
            &token,
            &json!({ "full_name": "Ana Ferreira", "company_name": "Ana Eventos", "role": "admin" }),
        )
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let profile = res.json::<Value>().await?["profile"].clone();
    assert_eq!(profile["full_name"], "Ana Ferreira");
    assert_eq!(profile["company_name"], "Ana Eventos");
    assert_eq!(profile["role"], "user");

    // Only the role: nothing writable left
    let res = app.patch("/api/profile", &token, &json!({ "role": "admin" })).send().await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn invalid_avatar_url_is_rejected() -> Result<()> {
    let app = spawn_app().await?;
    let (_, token) = app.identity.user("ana@example.com");

    let res = app
        .patch("/api/profile", &token, &json!({ "avatar_url": "not a url" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(res.json::<Value>().await?["details"][0]["field"], "avatar_url");
    Ok(())
}
