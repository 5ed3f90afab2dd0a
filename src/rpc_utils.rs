use crate::{error::RemoteError, net::send_with_backoff, types::Block};
use serde_json::{json, Value};
use std::sync::OnceLock;
use std::time::Duration;

static HTTP: OnceLock<reqwest::Client> = OnceLock::new();

fn http_client() -> &'static reqwest::Client {
    HTTP.get_or_init(|| {
        reqwest::Client::builder()
            .pool_max_idle_per_host(8)
            .tcp_nodelay(true)
            .build()
            .unwrap_or_else(|e| {
                log::warn!("falling back to default http client: {e}");
                reqwest::Client::new()
            })
    })
}

pub async fn rpc_post(
    url: &str,
    method: &str,
    params: Value,
    timeout_ms: u64,
    retries: u32,
) -> Result<Value, RemoteError> {
    let body = json!({"jsonrpc": "2.0", "id": 1, "method": method, "params": params});
    let req = http_client()
        .post(url)
        .json(&body)
        .timeout(Duration::from_millis(timeout_ms));

    let res = send_with_backoff(req, method, retries).await?;
    if !res.status().is_success() {
        return Err(RemoteError::Unavailable(format!("http {}", res.status())));
    }
    let v: Value = res.json().await?;
    unwrap_envelope(v)
}

/// Pull `result` out of a JSON-RPC response, turning an `error` member into
/// `Unavailable`.
pub fn unwrap_envelope(mut v: Value) -> Result<Value, RemoteError> {
    if let Some(err) = v.get("error") {
        let code = err.get("code").and_then(|c| c.as_i64()).unwrap_or_default();
        let msg = err
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("rpc error");
        return Err(RemoteError::Unavailable(format!("rpc {code} {msg}")));
    }
    match v.get_mut("result") {
        Some(r) => Ok(r.take()),
        None => Err(RemoteError::Malformed(
            "invalid rpc payload (no result)".into(),
        )),
    }
}

pub async fn get_block_count(url: &str, t: u64, retries: u32) -> Result<u64, RemoteError> {
    let v = rpc_post(url, "getblockcount", json!([]), t, retries).await?;
    parse_block_count(&v)
}

pub async fn get_block_by_index(
    url: &str,
    index: u64,
    t: u64,
    retries: u32,
) -> Result<Block, RemoteError> {
    let v = rpc_post(url, "getblock", json!([index, 1]), t, retries).await?;
    parse_block(v)
}

/// `getblockcount` answers with the number of blocks, i.e. head index + 1.
/// Some nodes send it as a decimal string.
pub fn parse_block_count(v: &Value) -> Result<u64, RemoteError> {
    v.as_u64()
        .or_else(|| v.as_str().and_then(|s| s.parse().ok()))
        .ok_or_else(|| RemoteError::Malformed(format!("block count is not an integer: {v}")))
}

pub fn parse_block(v: Value) -> Result<Block, RemoteError> {
    if !v.is_object() {
        return Err(RemoteError::Malformed(format!(
            "block is not an object: {v}"
        )));
    }
    Ok(serde_json::from_value(v)?)
}
