//! NEP-171 event logs, written to the host log as `EVENT_LOG:{json}`.
use std::fmt;

use serde::Serialize;
use trie_sdk::types::AccountId;

use crate::metadata::{TokenId, NFT_METADATA_SPEC};

pub const EVENT_LOG_PREFIX: &str = "EVENT_LOG:";
const NFT_STANDARD_NAME: &str = "nep171";

#[derive(Serialize, Debug)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum EventKind<'a> {
    NftMint(Vec<NftMintLog<'a>>),
    NftTransfer(Vec<NftTransferLog<'a>>),
}

#[derive(Serialize, Debug)]
pub struct NftMintLog<'a> {
    pub owner_id: &'a AccountId,
    pub token_ids: Vec<&'a TokenId>,
}

#[derive(Serialize, Debug)]
pub struct NftTransferLog<'a> {
    pub old_owner_id: &'a AccountId,
    pub new_owner_id: &'a AccountId,
    pub token_ids: Vec<&'a TokenId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memo: Option<&'a str>,
}

#[derive(Serialize, Debug)]
pub struct EventLog<'a> {
    pub standard: &'static str,
    pub version: &'static str,
    #[serde(flatten)]
    pub event: EventKind<'a>,
}

impl<'a> EventLog<'a> {
    pub fn new(event: EventKind<'a>) -> Self {
        Self {
            standard: NFT_STANDARD_NAME,
            version: NFT_METADATA_SPEC,
            event,
        }
    }

    pub fn emit(&self) {
        trie_sdk::msg(&self.to_string());
    }
}

impl fmt::Display for EventLog<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        write!(f, "{}{}", EVENT_LOG_PREFIX, json)
    }
}
