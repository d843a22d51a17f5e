use fsapi_core::{ApiClient, Config, Context, OsEnv, Result};
use fsapi_http_send_reqwest::ReqwestHttpSend;
use reqwest::Client;

/// Context reading the process environment and sending with reqwest.
pub fn default_context() -> Context {
    default_context_with_client(Client::new())
}

/// Like [`default_context`], with a caller supplied reqwest client.
pub fn default_context_with_client(client: Client) -> Context {
    Context::new()
        .with_env(OsEnv)
        .with_http_send(ReqwestHttpSend::new(client))
}

/// Client configured from `FS_API_*` environment values.
///
/// The reqwest client enforces the same timeout as the transport.
pub fn default_client() -> Result<ApiClient> {
    let ctx = Context::new().with_env(OsEnv);
    let config = Config::new().from_env(&ctx)?;

    let ctx = ctx.with_http_send(ReqwestHttpSend::with_timeout(config.timeout())?);
    ApiClient::from_config(ctx, &config)
}
