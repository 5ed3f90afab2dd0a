//! Remote collaborator seams consumed by the tracker.

use crate::{error::RemoteError, types::Block};
use async_trait::async_trait;

/// Reports the current chain height (block count, i.e. head index + 1).
#[async_trait]
pub trait HeightSource: Send + Sync {
    async fn fetch_height(&self) -> Result<u64, RemoteError>;
}

/// Retrieves a single block by index.
#[async_trait]
pub trait BlockFetcher: Send + Sync {
    async fn fetch_block(&self, index: u64) -> Result<Block, RemoteError>;
}

/// Anything that can both report height and fetch blocks.
pub trait ChainSource: HeightSource + BlockFetcher {}

impl<T: HeightSource + BlockFetcher + ?Sized> ChainSource for T {}
