use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A block as returned by a verbose `getblock` call.
///
/// Field names on the wire follow the node's JSON so the same value can be
/// handed to the panel untouched. Identity is `index`; a fetched block is
/// never mutated.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub index: u64,
    pub hash: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub version: u32,
    #[serde(rename = "previousblockhash", default)]
    pub previous_block_hash: String,
    #[serde(rename = "merkleroot", default)]
    pub merkle_root: String,
    /// Milliseconds since the unix epoch.
    #[serde(default)]
    pub time: u64,
    #[serde(rename = "nextconsensus", default)]
    pub next_consensus: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmations: Option<u64>,
    #[serde(rename = "nextblockhash", default, skip_serializing_if = "Option::is_none")]
    pub next_block_hash: Option<String>,
    #[serde(rename = "tx", default)]
    pub transactions: Vec<TxLite>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TxLite {
    pub hash: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
    #[serde(rename = "sysfee", default, skip_serializing_if = "Option::is_none")]
    pub system_fee: Option<String>,
    #[serde(rename = "netfee", default, skip_serializing_if = "Option::is_none")]
    pub network_fee: Option<String>,
    #[serde(rename = "validuntilblock", default, skip_serializing_if = "Option::is_none")]
    pub valid_until_block: Option<u64>,
}

impl Block {
    pub fn tx_count(&self) -> usize {
        self.transactions.len()
    }

    /// Local wall-clock rendering of the block time, "-" when the node sent none.
    pub fn when(&self) -> String {
        use chrono::{Local, TimeZone};
        if self.time == 0 {
            return "-".into();
        }
        match Local.timestamp_millis_opt(self.time as i64).single() {
            Some(dt) => dt.format("%Y-%m-%d %H:%M:%S%.3f").to_string(),
            None => "-".into(),
        }
    }
}

/// Sentinel for "no pinned start" and "no selection".
pub const UNSET: i64 = -1;

/// Snapshot pushed to the render sink.
///
/// Replaced wholesale on every recomputation; consumers never mutate it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewState {
    pub view: String,
    pub panel_title: String,
    pub block_height: u64,
    pub start_at_block: i64,
    pub selected_block: i64,
    pub blocks: Vec<Arc<Block>>,
    pub pagination_distance: u64,
}

impl ViewState {
    pub fn initial(panel_title: impl Into<String>, pagination_distance: u64) -> Self {
        Self {
            view: "tracker".into(),
            panel_title: panel_title.into(),
            block_height: 0,
            start_at_block: UNSET,
            selected_block: UNSET,
            blocks: Vec::new(),
            pagination_distance,
        }
    }

    pub fn is_pinned(&self) -> bool {
        self.start_at_block >= 0
    }

    /// Index of the head block, if any block has been observed.
    pub fn head_index(&self) -> Option<u64> {
        self.block_height.checked_sub(1)
    }

    pub fn block_indices(&self) -> Vec<u64> {
        self.blocks.iter().map(|b| b.index).collect()
    }
}
