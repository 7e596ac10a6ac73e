mod common;

use anyhow::Result;
use reqwest::{
    header::{CONTENT_TYPE, COOKIE},
    StatusCode,
};
use serde_json::json;
use uuid::Uuid;

use fitcoach_api::database::{Role, SubscriptionStatus};

#[tokio::test]
async fn same_set_twice_updates_in_place() -> Result<()> {
    let server = common::spawn_server().await?;
    let client = common::client()?;
    let org = server.directory.add_organization(SubscriptionStatus::Active, None);
    let trainer = server.directory.add_profile(Role::Trainer, Some(org));
    let cookie = server.session_cookie(trainer)?;
    let session_id = Uuid::new_v4();
    let squat = Uuid::new_v4();

    for weight in [100.0, 102.5] {
        let res = client
            .put(server.url(&format!("/api/workouts/{}/sets", session_id)))
            .header(COOKIE, &cookie)
            .json(&json!({
                "exercise_id": squat,
                "set_number": 1,
                "reps": 5,
                "weight_kg": weight,
                "performed_at": "2024-06-03T09:00:00Z"
            }))
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::OK);
    }

    assert_eq!(server.directory.set_count(), 1);

    let res = client
        .get(server.url(&format!("/api/workouts/{}/sets", session_id)))
        .header(COOKIE, &cookie)
        .send()
        .await?;
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["data"][0]["exercise_id"], squat.to_string());
    assert_eq!(body["data"][0]["sets"][0]["weight_kg"], 102.5);
    Ok(())
}

#[tokio::test]
async fn another_organizations_set_is_not_overwritten() -> Result<()> {
    let server = common::spawn_server().await?;
    let client = common::client()?;
    let org_a = server.directory.add_organization(SubscriptionStatus::Active, None);
    let org_b = server.directory.add_organization(SubscriptionStatus::Active, None);
    let trainer_a = server.directory.add_profile(Role::Trainer, Some(org_a));
    let trainer_b = server.directory.add_profile(Role::Trainer, Some(org_b));
    let session_id = Uuid::new_v4();
    let body = json!({ "exercise_id": Uuid::new_v4(), "set_number": 1, "reps": 5, "weight_kg": 60.0 });

    let res = client
        .put(server.url(&format!("/api/workouts/{}/sets", session_id)))
        .header(COOKIE, server.session_cookie(trainer_a)?)
        .json(&body)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .put(server.url(&format!("/api/workouts/{}/sets", session_id)))
        .header(COOKIE, server.session_cookie(trainer_b)?)
        .json(&body)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    // and org B cannot read it either
    let res = client
        .get(server.url(&format!("/api/workouts/{}/sets", session_id)))
        .header(COOKIE, server.session_cookie(trainer_b)?)
        .send()
        .await?;
    let listed = res.json::<serde_json::Value>().await?;
    assert_eq!(listed["data"], json!([]));
    Ok(())
}

#[tokio::test]
async fn invalid_set_is_rejected() -> Result<()> {
    let server = common::spawn_server().await?;
    let org = server.directory.add_organization(SubscriptionStatus::Active, None);
    let trainer = server.directory.add_profile(Role::Trainer, Some(org));

    let res = common::client()?
        .put(server.url(&format!("/api/workouts/{}/sets", Uuid::new_v4())))
        .header(COOKIE, server.session_cookie(trainer)?)
        .json(&json!({ "exercise_id": Uuid::new_v4(), "set_number": 0, "reps": 5, "weight_kg": 60.0 }))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = res.json::<serde_json::Value>().await?;
    assert!(body["field_errors"]["set_number"].is_string());
    Ok(())
}

#[tokio::test]
async fn tonnage_report_buckets_by_week() -> Result<()> {
    let server = common::spawn_server().await?;
    let client = common::client()?;
    let org = server.directory.add_organization(SubscriptionStatus::Active, None);
    let trainer = server.directory.add_profile(Role::Trainer, Some(org));
    let cookie = server.session_cookie(trainer)?;
    let session_id = Uuid::new_v4();

    for (set_number, performed_at) in [(1, "2024-06-04T09:00:00Z"), (2, "2024-06-18T09:00:00Z")] {
        let res = client
            .put(server.url(&format!("/api/workouts/{}/sets", session_id)))
            .header(COOKIE, &cookie)
            .json(&json!({
                "exercise_id": Uuid::nil(),
                "set_number": set_number,
                "reps": 10,
                "weight_kg": 50.0,
                "performed_at": performed_at
            }))
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::OK);
    }

    let res = client
        .get(server.url("/api/reports/tonnage?from=2024-06-03&to=2024-06-23&bucket=week"))
        .header(COOKIE, &cookie)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["data"]["total"], 1000.0);
    let buckets = body["data"]["buckets"].as_array().cloned().unwrap_or_default();
    assert_eq!(buckets.len(), 3);
    assert_eq!(buckets[0]["start"], "2024-06-03");
    assert_eq!(buckets[0]["tonnage"], 500.0);
    assert_eq!(buckets[1]["tonnage"], 0.0);
    assert_eq!(buckets[2]["sets"], 1);
    Ok(())
}

#[tokio::test]
async fn inverted_tonnage_range_is_400() -> Result<()> {
    let server = common::spawn_server().await?;
    let org = server.directory.add_organization(SubscriptionStatus::Active, None);
    let trainer = server.directory.add_profile(Role::Trainer, Some(org));

    let res = common::client()?
        .get(server.url("/api/reports/tonnage?from=2024-06-10&to=2024-06-01"))
        .header(COOKIE, server.session_cookie(trainer)?)
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn data_routes_need_an_organization() -> Result<()> {
    let server = common::spawn_server().await?;
    let admin = server.directory.add_profile(Role::SuperAdmin, None);

    let res = common::client()?
        .get(server.url(&format!("/api/workouts/{}/sets", Uuid::new_v4())))
        .header(COOKIE, server.session_cookie(admin)?)
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn out_of_range_report_dates_are_400() -> Result<()> {
    let server = common::spawn_server().await?;
    let org = server.directory.add_organization(SubscriptionStatus::Active, None);
    let trainer = server.directory.add_profile(Role::Trainer, Some(org));

    let res = common::client()?
        .get(server.url("/api/reports/tonnage?from=%2B262142-12-31&to=%2B262142-12-31&bucket=day"))
        .header(COOKIE, server.session_cookie(trainer)?)
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    Ok(())
}

#[tokio::test]
async fn malformed_input_keeps_the_error_envelope() -> Result<()> {
    let server = common::spawn_server().await?;
    let client = common::client()?;
    let org = server.directory.add_organization(SubscriptionStatus::Active, None);
    let trainer = server.directory.add_profile(Role::Trainer, Some(org));
    let cookie = server.session_cookie(trainer)?;

    let unknown_bucket = client
        .get(server.url("/api/reports/tonnage?from=2024-06-01&to=2024-06-10&bucket=year"))
        .header(COOKIE, &cookie)
        .send()
        .await?;
    let bad_session_id = client
        .get(server.url("/api/workouts/not-a-uuid/sets"))
        .header(COOKIE, &cookie)
        .send()
        .await?;
    let broken_body = client
        .put(server.url(&format!("/api/workouts/{}/sets", Uuid::new_v4())))
        .header(COOKIE, &cookie)
        .header(CONTENT_TYPE, "application/json")
        .body("{\"exercise_id\":")
        .send()
        .await?;

    for res in [unknown_bucket, bad_session_id, broken_body] {
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let content_type = res
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        assert_eq!(content_type.as_deref(), Some("application/json"));

        let body = res.json::<serde_json::Value>().await?;
        assert_eq!(body["success"], false);
        assert!(body["error"].is_string());
        assert!(body["code"].is_string());
    }
    Ok(())
}
