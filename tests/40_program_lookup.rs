mod common;

use anyhow::Result;
use chrono::{TimeZone, Utc};
use programs_metadata::courses::{CourseKey, CourseSettings};
use programs_metadata::programs::PROGRAM_METADATA_KEY;
use reqwest::StatusCode;
use serde_json::{json, Value};

const NATIONAL_ID: &str = "1222888000";

async fn lookup(server: &common::TestServer, token: &str, query: &[(&str, &str)]) -> Result<(StatusCode, Value)> {
    let res = reqwest::Client::new()
        .get(server.lookup_url())
        .header("Authorization", format!("JWT {}", token))
        .query(query)
        .send()
        .await?;
    Ok((res.status(), res.json().await?))
}

/// Course with catalog fields and, optionally, stored program metadata
async fn seed_course(server: &common::TestServer, id: &str, with_metadata: bool) -> CourseKey {
    let key = CourseKey::parse(id).unwrap();
    let mut course = CourseSettings::new(key.clone());
    course.display_name = Some("Demo Course".into());
    course.start = Utc.with_ymd_and_hms(2024, 3, 11, 8, 0, 0).single();
    course.effort = Some("5".into());
    if with_metadata {
        course
            .other_course_settings
            .insert(PROGRAM_METADATA_KEY.into(), common::valid_payload());
    }
    server.courses.insert(course).await;
    key
}

#[tokio::test]
async fn lookup_requires_authentication() -> Result<()> {
    let server = common::spawn_server(common::test_config()).await?;

    let res = reqwest::get(server.lookup_url()).await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn lists_callers_enrolled_programs() -> Result<()> {
    let server = common::spawn_server(common::test_config()).await?;
    let key = seed_course(&server, common::COURSE_ID, true).await;
    server.enrollments.enroll(7, key).await;

    let (status, body) = lookup(&server, &server.token(7, false, &[]), &[]).await?;
    assert_eq!(status, StatusCode::OK);

    let rows = body.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["Program_name"], "Demo Course");
    assert_eq!(rows[0]["Program_code"], "TEST001");
    assert_eq!(rows[0]["Type_of_Activity"], "التدريب - التدريب الإلكتروني");
    assert_eq!(rows[0]["Type_of_Activity_id"], 155);
    assert_eq!(rows[0]["Code"], common::COURSE_ID);
    assert_eq!(rows[0]["Date_Start"], "2024-03-11");
    assert_eq!(rows[0]["Date_Start_Hijri"], "1445-09-01");
    assert_eq!(rows[0]["Date_End"], Value::Null);
    assert_eq!(rows[0]["duration"], 5);
    assert_eq!(rows[0]["Unit"], "hour");
    Ok(())
}

#[tokio::test]
async fn caller_without_enrollments_gets_empty_list() -> Result<()> {
    let server = common::spawn_server(common::test_config()).await?;

    let (status, body) = lookup(&server, &server.token(7, false, &[]), &[]).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
    Ok(())
}

#[tokio::test]
async fn course_without_metadata_is_reported_inline() -> Result<()> {
    let server = common::spawn_server(common::test_config()).await?;
    let good = seed_course(&server, common::COURSE_ID, true).await;
    let bare = seed_course(&server, "course-v1:edX+Bare+2024", false).await;
    server.enrollments.enroll(7, good).await;
    server.enrollments.enroll(7, bare).await;

    let (status, body) = lookup(&server, &server.token(7, false, &[]), &[]).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["Code"], common::COURSE_ID);
    assert_eq!(body[1]["error"], "Invalid program lookup data");
    assert_eq!(body[1]["course_id"], "course-v1:edX+Bare+2024");
    assert_eq!(body[1]["details"]["Program_code"], "This field may not be null.");
    Ok(())
}

#[tokio::test]
async fn lookup_by_national_id_needs_permission() -> Result<()> {
    let server = common::spawn_server(common::test_config()).await?;

    let (status, body) = lookup(&server, &server.token(7, false, &[]), &[("national_id", NATIONAL_ID)]).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");
    Ok(())
}

#[tokio::test]
async fn national_id_is_validated() -> Result<()> {
    let server = common::spawn_server(common::test_config()).await?;
    let token = server.token(2, false, &["programs_lookup"]);

    let (status, body) = lookup(&server, &token, &[("other", "1")]).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "MISSING_NATIONAL_ID");

    let (status, _) = lookup(&server, &token, &[("national_id", "")]).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    for bad in ["12345", "12345abcde", "1234567890123456"] {
        let (status, body) = lookup(&server, &token, &[("national_id", bad)]).await?;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{bad}");
        assert_eq!(body["code"], "INVALID_NATIONAL_ID");
    }
    Ok(())
}

#[tokio::test]
async fn unknown_national_id_is_not_found() -> Result<()> {
    let server = common::spawn_server(common::test_config()).await?;

    let (status, body) = lookup(&server, &server.admin_token(), &[("national_id", NATIONAL_ID)]).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "No user matches the given national_id.");
    Ok(())
}

#[tokio::test]
async fn lookup_role_lists_another_learners_programs() -> Result<()> {
    let server = common::spawn_server(common::test_config()).await?;
    let key = seed_course(&server, common::COURSE_ID, true).await;
    server.enrollments.enroll(9, key).await;
    server.enrollments.set_national_id(9, NATIONAL_ID).await;

    let token = server.token(2, false, &["programs_lookup"]);
    let (status, body) = lookup(&server, &token, &[("national_id", NATIONAL_ID)]).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["Code"], common::COURSE_ID);

    // The caller's own enrollments are untouched
    let (_, own) = lookup(&server, &token, &[]).await?;
    assert_eq!(own, json!([]));
    Ok(())
}
