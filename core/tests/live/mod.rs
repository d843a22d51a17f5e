use std::env;

use anyhow::Result;
use fsapi_core::{ApiClient, Config, Context, OsEnv};
use fsapi_http_send_reqwest::ReqwestHttpSend;
use log::{debug, warn};

/// Build a client against a real API when `FS_API_TEST=on`.
fn init_live_client() -> Option<ApiClient> {
    super::init_logger();
    let _ = dotenv::dotenv();

    if env::var("FS_API_TEST").ok().as_deref() != Some("on") {
        return None;
    }

    let ctx = Context::new()
        .with_env(OsEnv)
        .with_http_send(ReqwestHttpSend::default());
    let config = Config::new()
        .from_env(&ctx)
        .expect("FS_API_* env must be valid");

    Some(ApiClient::from_config(ctx, &config).expect("FS_API_* env must be set"))
}

#[tokio::test]
async fn test_live_ping() -> Result<()> {
    let Some(client) = init_live_client() else {
        warn!("FS_API_TEST is not set, skipped");
        return Ok(());
    };

    assert!(client.test().await?);
    Ok(())
}

#[tokio::test]
async fn test_live_sync_clock() -> Result<()> {
    let Some(client) = init_live_client() else {
        warn!("FS_API_TEST is not set, skipped");
        return Ok(());
    };

    let diff = client.sync_clock().await?;
    debug!("clock diff: {diff}");

    let resp = client.api("/", "GET", Default::default()).await?;
    debug!("got response: {:?}", resp.json());
    Ok(())
}
