mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
async fn hundred_and_first_request_is_throttled() -> Result<()> {
    let server = common::spawn_server(common::test_config()).await?;
    let client = reqwest::Client::new();
    let auth = format!("JWT {}", server.admin_token());

    for i in 0..100 {
        let res = client
            .get(server.metadata_url(common::COURSE_ID))
            .header("Authorization", &auth)
            .send()
            .await?;
        assert_ne!(res.status(), StatusCode::TOO_MANY_REQUESTS, "request {} throttled early", i + 1);
    }

    // Valid payload or not, the quota is spent
    let res = client
        .post(server.metadata_url(common::COURSE_ID))
        .header("Authorization", &auth)
        .json(&common::valid_payload())
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
    let retry_after: u64 = res
        .headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .expect("missing Retry-After header");
    assert!(retry_after > 0 && retry_after <= 3600);

    let res = client
        .post(server.metadata_url(common::COURSE_ID))
        .header("Authorization", &auth)
        .json(&json!({}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
    Ok(())
}

#[tokio::test]
async fn quota_headers_count_down() -> Result<()> {
    let mut config = common::test_config();
    config.api.rate_limit = "5/hour".to_string();
    let server = common::spawn_server(config).await?;
    let client = reqwest::Client::new();
    let auth = format!("JWT {}", server.admin_token());

    for expected in ["4", "3"] {
        let res = client
            .get(server.metadata_url(common::COURSE_ID))
            .header("Authorization", &auth)
            .send()
            .await?;
        assert_eq!(res.headers().get("x-ratelimit-limit").unwrap(), "5");
        assert_eq!(res.headers().get("x-ratelimit-remaining").unwrap(), expected);
    }
    Ok(())
}

#[tokio::test]
async fn unauthenticated_requests_do_not_spend_quota() -> Result<()> {
    let mut config = common::test_config();
    config.api.rate_limit = "2/hour".to_string();
    let server = common::spawn_server(config).await?;
    let client = reqwest::Client::new();

    for _ in 0..5 {
        let res = client.get(server.metadata_url(common::COURSE_ID)).send().await?;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    let auth = format!("JWT {}", server.admin_token());
    for _ in 0..2 {
        let res = client
            .get(server.metadata_url(common::COURSE_ID))
            .header("Authorization", &auth)
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    let res = client
        .get(server.metadata_url(common::COURSE_ID))
        .header("Authorization", &auth)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);

    // Auth still answers first once the quota is gone
    let res = client.get(server.metadata_url(common::COURSE_ID)).send().await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn throttling_can_be_disabled() -> Result<()> {
    let mut config = common::test_config();
    config.api.enable_rate_limiting = false;
    config.api.rate_limit = "1/hour".to_string();
    let server = common::spawn_server(config).await?;
    let client = reqwest::Client::new();
    let auth = format!("JWT {}", server.admin_token());

    for _ in 0..3 {
        let res = client
            .get(server.metadata_url(common::COURSE_ID))
            .header("Authorization", &auth)
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        assert!(res.headers().get("x-ratelimit-limit").is_none());
    }
    Ok(())
}
