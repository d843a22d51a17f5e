use anyhow::Result;
use fsapi_core::{ApiClient, Config, Context, OsEnv};
use fsapi_http_send_reqwest::ReqwestHttpSend;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenv::dotenv();
    env_logger::init();

    let ctx = Context::new()
        .with_env(OsEnv)
        .with_http_send(ReqwestHttpSend::default());
    let config = Config::new().from_env(&ctx)?;
    let client = ApiClient::from_config(ctx, &config)?;

    println!("Pinging {}", config.base_url());
    if !client.test().await? {
        println!("API rejected the credential");
        return Ok(());
    }

    let diff = client.sync_clock().await?;
    println!("Connected, clock offset {diff}s");

    let url = client.signed_url("/ping.json", &[]);
    println!("Signed url: {url}");
    Ok(())
}
