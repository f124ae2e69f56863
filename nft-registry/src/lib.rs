//! A non-fungible token registry: minting, ownership tracking, paginated views and transfers.
use borsh::{BorshDeserialize, BorshSerialize};
use trie_sdk::contract;
use trie_sdk::store::{LookupMap, UnorderedMap, UnorderedSet};
use trie_sdk::types::AccountId;

pub mod events;
pub mod metadata;

use events::{EventKind, EventLog, NftMintLog, NftTransferLog};
use metadata::{JsonToken, NFTContractMetadata, Token, TokenId, TokenMetadata};

const TOKENS_PER_OWNER_PREFIX: &[u8] = b"tokens_per_owner";
const TOKEN_BY_ID_PREFIX: &[u8] = b"token_by_id";
const TOKEN_METADATA_BY_ID_PREFIX: &[u8] = b"token_metadata_by_id";
const TOKENS_OF_PREFIX: &[u8] = b"tokens_of";
const DEFAULT_PAGE_LIMIT: u32 = 20;

#[derive(BorshSerialize, BorshDeserialize)]
pub struct Contract {
    owner_id: AccountId,
    tokens_per_owner: LookupMap<AccountId, UnorderedSet<TokenId>>,
    token_by_id: LookupMap<TokenId, Token>,
    token_metadata_by_id: UnorderedMap<TokenId, TokenMetadata>,
    metadata: NFTContractMetadata,
}

/// Storage prefix of the set holding the tokens of `owner_id`.
fn tokens_of_prefix(owner_id: &AccountId) -> Vec<u8> {
    [TOKENS_OF_PREFIX, owner_id.as_bytes()].concat()
}

/// Resolves optional pagination arguments. Zero counts as unset.
fn page(from_start: Option<u32>, limit: Option<u32>) -> (usize, usize) {
    let start = from_start.unwrap_or(0);
    let limit = limit.filter(|limit| *limit > 0).unwrap_or(DEFAULT_PAGE_LIMIT);
    (start as usize, limit as usize)
}

#[contract]
impl Contract {
    #[init]
    pub fn init(owner_id: AccountId) -> Self {
        Self {
            owner_id,
            tokens_per_owner: LookupMap::new(TOKENS_PER_OWNER_PREFIX.to_vec()),
            token_by_id: LookupMap::new(TOKEN_BY_ID_PREFIX.to_vec()),
            token_metadata_by_id: UnorderedMap::new(TOKEN_METADATA_BY_ID_PREFIX.to_vec()),
            metadata: NFTContractMetadata::default(),
        }
    }

    /// Mints `token_id` to `receiver_id`.
    #[call(payable)]
    pub fn nft_mint(
        &mut self,
        token_id: TokenId,
        receiver_id: AccountId,
        metadata: TokenMetadata,
    ) {
        assert!(
            !self.token_by_id.contains_key(&token_id),
            "Token Already Exists"
        );

        let token = Token {
            owner_id: receiver_id,
        };
        self.token_by_id.insert(token_id.clone(), token.clone());
        self.add_token_to_owner(&token.owner_id, &token_id);
        self.token_metadata_by_id.insert(token_id.clone(), metadata);

        EventLog::new(EventKind::NftMint(vec![NftMintLog {
            owner_id: &token.owner_id,
            token_ids: vec![&token_id],
        }]))
        .emit();
    }

    pub fn nft_total_supply(&self) -> u32 {
        self.token_metadata_by_id.len()
    }

    pub fn nft_supply_for_owner(&self, owner_id: AccountId) -> u32 {
        self.tokens_per_owner
            .get(&owner_id)
            .map_or(0, |tokens| tokens.len())
    }

    pub fn nft_token(&self, token_id: TokenId) -> Option<JsonToken> {
        let token = self.token_by_id.get(&token_id)?;
        let metadata = self.token_metadata_by_id.get(&token_id)?;
        Some(JsonToken {
            token_id,
            owner_id: token.owner_id,
            metadata,
        })
    }

    /// Lists tokens in mint order, `limit` of them starting at index `from_start`.
    ///
    /// A listed id without a token record is left out of the page instead of showing up as `null`.
    pub fn nft_tokens(&self, from_start: Option<u32>, limit: Option<u32>) -> Vec<JsonToken> {
        let (start, limit) = page(from_start, limit);
        self.token_metadata_by_id
            .keys()
            .skip(start)
            .take(limit)
            .filter_map(|token_id| self.nft_token(token_id))
            .collect()
    }

    /// Lists the tokens of `owner_id`.
    ///
    /// `limit` bounds the index rather than the page size: this returns the tokens at
    /// indexes `from_start..limit`, which is empty once `from_start >= limit`. As in
    /// [`Self::nft_tokens`], ids without a token record are left out.
    pub fn nft_tokens_for_owner(
        &self,
        owner_id: AccountId,
        from_start: Option<u32>,
        limit: Option<u32>,
    ) -> Vec<JsonToken> {
        let tokens = match self.tokens_per_owner.get(&owner_id) {
            Some(tokens) => tokens,
            None => return Vec::new(),
        };
        let (start, limit) = page(from_start, limit);
        tokens
            .iter()
            .take(limit)
            .skip(start)
            .filter_map(|token_id| self.nft_token(token_id))
            .collect()
    }

    /// Transfers a token owned by the caller to `receiver_id`.
    #[call(payable)]
    pub fn nft_transfer(
        &mut self,
        receiver_id: AccountId,
        token_id: TokenId,
        approval_id: Option<u64>,
        memo: Option<String>,
    ) {
        assert!(approval_id.is_none(), "Approvals are not supported");
        let token = self.expect_token(&token_id);
        assert_eq!(
            token.owner_id,
            trie_sdk::caller_address(),
            "Sender must be the token owner"
        );

        self.internal_transfer(&token_id, token, receiver_id, memo.as_deref());
    }

    /// Transfers a token on the contract's own authority and logs `msg`.
    #[call(private)]
    pub fn nft_transfer_call(
        &mut self,
        receiver_id: AccountId,
        token_id: TokenId,
        msg: String,
        approval_id: Option<u64>,
        memo: Option<String>,
    ) {
        assert!(approval_id.is_none(), "Approvals are not supported");
        let token = self.expect_token(&token_id);

        self.internal_transfer(&token_id, token, receiver_id, memo.as_deref());
        trie_sdk::msg(&msg);
    }

    pub fn nft_metadata(&self) -> NFTContractMetadata {
        self.metadata.clone()
    }
}

impl Contract {
    fn expect_token(&self, token_id: &TokenId) -> Token {
        match self.token_by_id.get(token_id) {
            Some(token) => token,
            None => panic!("Token not found"),
        }
    }

    fn add_token_to_owner(&mut self, owner_id: &AccountId, token_id: &TokenId) {
        let mut tokens = self
            .tokens_per_owner
            .get(owner_id)
            .unwrap_or_else(|| UnorderedSet::new(tokens_of_prefix(owner_id)));
        tokens.insert(token_id.clone());
        // The stored descriptor carries the set length.
        self.tokens_per_owner.insert(owner_id.clone(), tokens);
    }

    fn remove_token_from_owner(&mut self, owner_id: &AccountId, token_id: &TokenId) {
        let mut tokens = match self.tokens_per_owner.get(owner_id) {
            Some(tokens) => tokens,
            None => panic!("Token should be owned by the sender"),
        };
        tokens.remove(token_id);
        if tokens.is_empty() {
            self.tokens_per_owner.remove(owner_id);
        } else {
            self.tokens_per_owner.insert(owner_id.clone(), tokens);
        }
    }

    fn internal_transfer(
        &mut self,
        token_id: &TokenId,
        token: Token,
        receiver_id: AccountId,
        memo: Option<&str>,
    ) {
        assert_ne!(
            token.owner_id, receiver_id,
            "The token owner and the receiver should be different"
        );

        self.remove_token_from_owner(&token.owner_id, token_id);
        self.add_token_to_owner(&receiver_id, token_id);
        self.token_by_id.insert(
            token_id.clone(),
            Token {
                owner_id: receiver_id.clone(),
            },
        );

        EventLog::new(EventKind::NftTransfer(vec![NftTransferLog {
            old_owner_id: &token.owner_id,
            new_owner_id: &receiver_id,
            token_ids: vec![token_id],
            memo,
        }]))
        .emit();
    }
}

//====================================================== TESTS =================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EVENT_LOG_PREFIX;
    use trie_sdk::dispatch::{self, DispatchError, MethodOptions};
    use trie_sdk::mock::*;

    fn account(name: &str) -> AccountId {
        AccountId::try_from(name).unwrap()
    }

    fn titled(title: &str) -> TokenMetadata {
        TokenMetadata {
            title: Some(title.to_string()),
            ..Default::default()
        }
    }

    fn minted(tokens: &[(&str, &str)]) -> Contract {
        let mut contract = Contract::init(account("owner.test"));
        for (token_id, owner) in tokens {
            contract.nft_mint(token_id.to_string(), account(owner), titled(token_id));
        }
        contract
    }

    fn token_ids(tokens: Vec<JsonToken>) -> Vec<String> {
        tokens.into_iter().map(|token| token.token_id).collect()
    }

    #[test]
    fn test_init() {
        let contract = Contract::init(account("owner.test"));

        assert_eq!(contract.owner_id, account("owner.test"));
        assert_eq!(contract.nft_total_supply(), 0);
        assert_eq!(contract.nft_metadata(), NFTContractMetadata::default());
    }

    #[test]
    fn test_mint() {
        let contract = minted(&[("t1", "alice.test")]);

        assert_eq!(contract.nft_total_supply(), 1);
        assert_eq!(contract.nft_supply_for_owner(account("alice.test")), 1);
        assert_eq!(
            contract.nft_token("t1".to_string()),
            Some(JsonToken {
                token_id: "t1".to_string(),
                owner_id: account("alice.test"),
                metadata: titled("t1"),
            })
        );
        assert_eq!(contract.nft_token("t2".to_string()), None);
    }

    #[test]
    fn test_mint_emits_event() {
        minted(&[("t1", "alice.test")]);

        assert_eq!(
            get_mock_msgs(),
            vec![format!(
                "{}{}",
                EVENT_LOG_PREFIX,
                r#"{"standard":"nep171","version":"nft-1.0.0","event":"nft_mint","data":[{"owner_id":"alice.test","token_ids":["t1"]}]}"#
            )]
        );
    }

    #[test]
    #[should_panic(expected = "Token Already Exists")]
    fn test_mint_duplicate() {
        let mut contract = minted(&[("t1", "alice.test")]);

        contract.nft_mint("t1".to_string(), account("bob.test"), titled("again"));
    }

    #[test]
    fn test_owner_set_layout() {
        minted(&[("t1", "alice.test"), ("t2", "alice.test")]);

        let mut elements = b"tokens_of".to_vec();
        elements.extend_from_slice(b"alice.teste");
        assert_eq!(storage_keys_with_prefix(&elements).len(), 2);
    }

    #[test]
    fn test_supply_for_unknown_owner() {
        let contract = minted(&[("t1", "alice.test")]);

        assert_eq!(contract.nft_supply_for_owner(account("bob.test")), 0);
        assert!(contract
            .nft_tokens_for_owner(account("bob.test"), None, None)
            .is_empty());
    }

    #[test]
    fn test_nft_tokens_pagination() {
        let contract = minted(&[
            ("t0", "alice.test"),
            ("t1", "bob.test"),
            ("t2", "alice.test"),
            ("t3", "bob.test"),
            ("t4", "alice.test"),
        ]);

        assert_eq!(
            token_ids(contract.nft_tokens(None, None)),
            vec!["t0", "t1", "t2", "t3", "t4"]
        );
        assert_eq!(
            token_ids(contract.nft_tokens(Some(1), Some(2))),
            vec!["t1", "t2"]
        );
        assert_eq!(
            token_ids(contract.nft_tokens(Some(3), Some(0))),
            vec!["t3", "t4"]
        );
        assert!(contract.nft_tokens(Some(5), None).is_empty());
    }

    #[test]
    fn test_nft_tokens_default_limit() {
        let tokens: Vec<(String, &str)> =
            (0..25).map(|i| (format!("t{}", i), "alice.test")).collect();
        let tokens: Vec<(&str, &str)> = tokens.iter().map(|(id, o)| (id.as_str(), *o)).collect();
        let contract = minted(&tokens);

        assert_eq!(contract.nft_tokens(None, None).len(), 20);
        assert_eq!(contract.nft_tokens(Some(20), None).len(), 5);
    }

    #[test]
    fn test_nft_tokens_for_owner_limit_bounds_index() {
        let contract = minted(&[
            ("t0", "alice.test"),
            ("t1", "alice.test"),
            ("t2", "alice.test"),
            ("t3", "alice.test"),
        ]);
        let alice = || account("alice.test");

        assert_eq!(
            token_ids(contract.nft_tokens_for_owner(alice(), None, None)),
            vec!["t0", "t1", "t2", "t3"]
        );
        assert_eq!(
            token_ids(contract.nft_tokens_for_owner(alice(), Some(1), Some(3))),
            vec!["t1", "t2"]
        );
        assert!(contract
            .nft_tokens_for_owner(alice(), Some(2), Some(2))
            .is_empty());
    }

    #[test]
    fn test_listings_skip_ids_without_token_record() {
        let mut contract = minted(&[
            ("t0", "alice.test"),
            ("t1", "alice.test"),
            ("t2", "alice.test"),
        ]);
        contract.token_by_id.remove("t1");

        assert_eq!(contract.nft_token("t1".to_string()), None);
        assert_eq!(token_ids(contract.nft_tokens(None, None)), vec!["t0", "t2"]);
        assert_eq!(
            token_ids(contract.nft_tokens_for_owner(account("alice.test"), None, None)),
            vec!["t0", "t2"]
        );
        assert_eq!(contract.nft_total_supply(), 3);
    }

    #[test]
    fn test_transfer() {
        let mut contract = minted(&[("t1", "alice.test"), ("t2", "alice.test")]);
        set_mock_caller_address(account("alice.test"));

        contract.nft_transfer(
            account("bob.test"),
            "t1".to_string(),
            None,
            Some("gift".to_string()),
        );

        assert_eq!(contract.nft_supply_for_owner(account("alice.test")), 1);
        assert_eq!(contract.nft_supply_for_owner(account("bob.test")), 1);
        assert_eq!(
            contract.nft_token("t1".to_string()).unwrap().owner_id,
            account("bob.test")
        );
        assert_eq!(
            token_ids(contract.nft_tokens_for_owner(account("bob.test"), None, None)),
            vec!["t1"]
        );
        assert_eq!(contract.nft_total_supply(), 2);

        let last = get_mock_msgs().pop().unwrap();
        assert_eq!(
            last,
            r#"EVENT_LOG:{"standard":"nep171","version":"nft-1.0.0","event":"nft_transfer","data":[{"old_owner_id":"alice.test","new_owner_id":"bob.test","token_ids":["t1"],"memo":"gift"}]}"#
        );
    }

    #[test]
    fn test_transfer_last_token_drops_owner_set() {
        let mut contract = minted(&[("t1", "alice.test")]);
        set_mock_caller_address(account("alice.test"));

        contract.nft_transfer(account("bob.test"), "t1".to_string(), None, None);

        assert_eq!(contract.nft_supply_for_owner(account("alice.test")), 0);
        assert!(!contract.tokens_per_owner.contains_key(&account("alice.test")));
        assert!(storage_keys_with_prefix(b"tokens_ofalice.test").is_empty());
    }

    #[test]
    #[should_panic(expected = "Sender must be the token owner")]
    fn test_transfer_by_stranger() {
        let mut contract = minted(&[("t1", "alice.test")]);
        set_mock_caller_address(account("mallory.test"));

        contract.nft_transfer(account("mallory.test"), "t1".to_string(), None, None);
    }

    #[test]
    #[should_panic(expected = "Token not found")]
    fn test_transfer_missing_token() {
        let mut contract = minted(&[]);
        set_mock_caller_address(account("alice.test"));

        contract.nft_transfer(account("bob.test"), "t1".to_string(), None, None);
    }

    #[test]
    fn test_transfer_call_logs_msg() {
        let mut contract = minted(&[("t1", "alice.test")]);

        contract.nft_transfer_call(
            account("bob.test"),
            "t1".to_string(),
            "hello".to_string(),
            None,
            None,
        );

        assert_eq!(
            contract.nft_token("t1".to_string()).unwrap().owner_id,
            account("bob.test")
        );
        assert_eq!(get_mock_msgs().last().unwrap(), "hello");
    }

    #[derive(serde::Deserialize)]
    struct InitArgs {
        owner_id: AccountId,
    }

    #[derive(serde::Deserialize)]
    struct MintArgs {
        token_id: TokenId,
        receiver_id: AccountId,
        metadata: TokenMetadata,
    }

    #[derive(serde::Deserialize)]
    struct NoArgs {}

    fn dispatch_init() {
        set_mock_input(br#"{"owner_id":"owner.test"}"#.to_vec());
        dispatch::try_init(MethodOptions::init(), |args: InitArgs| {
            Contract::init(args.owner_id)
        })
        .unwrap();
    }

    fn dispatch_mint(input: &[u8]) -> Result<(), DispatchError> {
        set_mock_input(input.to_vec());
        dispatch::try_call(
            MethodOptions::call().payable(),
            |contract: &mut Contract, args: MintArgs| {
                contract.nft_mint(args.token_id, args.receiver_id, args.metadata)
            },
        )
    }

    #[test]
    fn test_dispatch_round_trip() {
        dispatch_init();
        set_mock_attached_deposit(1);

        dispatch_mint(
            br#"{"token_id":"t1","receiver_id":"alice.test","metadata":{"title":"First"}}"#,
        )
        .unwrap();
        assert_eq!(get_mock_output(), b"null");

        set_mock_attached_deposit(0);
        set_mock_write_perm(false);
        set_mock_input(Vec::new());
        dispatch::try_view(MethodOptions::view(), |contract: &Contract, _: NoArgs| {
            contract.nft_total_supply()
        })
        .unwrap();
        assert_eq!(get_mock_output(), b"1");

        set_mock_input(br#"{"token_id":"t1"}"#.to_vec());
        #[derive(serde::Deserialize)]
        struct TokenArgs {
            token_id: TokenId,
        }
        dispatch::try_view(
            MethodOptions::view(),
            |contract: &Contract, args: TokenArgs| contract.nft_token(args.token_id),
        )
        .unwrap();
        let token: JsonToken = serde_json::from_slice(&get_mock_output()).unwrap();
        assert_eq!(token.owner_id, account("alice.test"));
        assert_eq!(token.metadata.title.as_deref(), Some("First"));
    }

    #[test]
    fn test_dispatch_transfer_call_is_private() {
        dispatch_init();
        dispatch_mint(br#"{"token_id":"t1","receiver_id":"alice.test","metadata":{}}"#).unwrap();

        #[derive(serde::Deserialize)]
        struct TransferCallArgs {
            receiver_id: AccountId,
            token_id: TokenId,
            msg: String,
        }
        let transfer_call = |contract: &mut Contract, args: TransferCallArgs| {
            contract.nft_transfer_call(args.receiver_id, args.token_id, args.msg, None, None)
        };
        let input = br#"{"receiver_id":"bob.test","token_id":"t1","msg":"hi"}"#;

        set_mock_input(input.to_vec());
        let result = dispatch::try_call(MethodOptions::call().private(), transfer_call);
        assert!(matches!(result, Err(DispatchError::Private)));

        set_mock_caller_address(trie_sdk::contract_instance_address());
        set_mock_input(input.to_vec());
        dispatch::try_call(MethodOptions::call().private(), transfer_call).unwrap();

        let contract: Contract = dispatch::read_state().unwrap().unwrap();
        assert_eq!(contract.nft_supply_for_owner(account("bob.test")), 1);
    }
}
