use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use trie_sdk::types::AccountId;

pub type TokenId = String;

pub const NFT_METADATA_SPEC: &str = "nft-1.0.0";

/// Contract-level metadata (NEP-177).
#[derive(BorshSerialize, BorshDeserialize, Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct NFTContractMetadata {
    /// Version of the metadata standard, like `nft-1.0.0`.
    pub spec: String,
    pub name: String,
    pub symbol: String,
    pub icon: Option<String>,
    pub base_uri: Option<String>,
    /// URL to a JSON file with more info.
    pub reference: Option<String>,
    /// Base64-encoded sha256 hash of the JSON behind `reference`.
    pub reference_hash: Option<String>,
}

impl Default for NFTContractMetadata {
    fn default() -> Self {
        Self {
            spec: NFT_METADATA_SPEC.to_string(),
            name: "NFT Marketplace K10".to_string(),
            symbol: "NFTK10".to_string(),
            icon: None,
            base_uri: None,
            reference: None,
            reference_hash: None,
        }
    }
}

/// Per-token metadata. Every field is optional.
#[derive(
    BorshSerialize, BorshDeserialize, Serialize, Deserialize, Default, Clone, Debug, PartialEq, Eq,
)]
#[serde(default)]
pub struct TokenMetadata {
    pub title: Option<String>,
    pub description: Option<String>,
    /// URL to associated media.
    pub media: Option<String>,
    /// Base64-encoded sha256 hash of the content behind `media`.
    pub media_hash: Option<String>,
    pub copies: Option<u64>,
    /// Unix epoch in milliseconds.
    pub issued_at: Option<u64>,
    pub expires_at: Option<u64>,
    pub starts_at: Option<u64>,
    pub updated_at: Option<u64>,
    /// Anything extra, usually stringified JSON.
    pub extra: Option<String>,
    pub reference: Option<String>,
    pub reference_hash: Option<String>,
}

/// What the contract stores per token id.
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct Token {
    pub owner_id: AccountId,
}

/// A token as returned by the view methods.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct JsonToken {
    pub token_id: TokenId,
    pub owner_id: AccountId,
    pub metadata: TokenMetadata,
}
