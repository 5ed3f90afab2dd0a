use crate::{
    config::Config,
    error::RemoteError,
    rpc_utils::{get_block_by_index, get_block_count},
    source::{BlockFetcher, HeightSource},
    types::Block,
};
use async_trait::async_trait;

/// JSON-RPC node endpoint (`getblockcount` / `getblock`).
#[derive(Clone, Debug)]
pub struct RpcSource {
    url: String,
    timeout_ms: u64,
    retries: u32,
}

impl RpcSource {
    pub fn new(url: impl Into<String>, timeout_ms: u64, retries: u32) -> Self {
        Self {
            url: url.into(),
            timeout_ms,
            retries,
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self::new(cfg.rpc_url.clone(), cfg.rpc_timeout_ms, cfg.rpc_retries)
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl HeightSource for RpcSource {
    async fn fetch_height(&self) -> Result<u64, RemoteError> {
        log::debug!("📡 getblockcount {}", self.url);
        get_block_count(&self.url, self.timeout_ms, self.retries).await
    }
}

#[async_trait]
impl BlockFetcher for RpcSource {
    async fn fetch_block(&self, index: u64) -> Result<Block, RemoteError> {
        log::debug!("📦 Retrieving block {index}");
        let block = get_block_by_index(&self.url, index, self.timeout_ms, self.retries).await?;
        log::debug!(
            "✅ Got block #{} ({} txs, {})",
            block.index,
            block.tx_count(),
            block.when()
        );
        Ok(block)
    }
}
