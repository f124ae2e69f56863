use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

const MIN_ACCOUNT_ID_LEN: usize = 2;
const MAX_ACCOUNT_ID_LEN: usize = 64;

/// Balance is a type for storing token amounts in the smallest indivisible unit.
pub type Balance = u128;

/// Reasons an [`AccountId`] can be rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseAccountIdError {
    #[error("account id must be between 2 and 64 characters long, got {0}")]
    Length(usize),
    #[error("account id contains invalid character {0:?}")]
    InvalidChar(char),
    #[error("account id is not valid UTF-8")]
    NotUtf8,
}

/// Name of an account as seen by the host, e.g. `alice.test`.
///
/// Account ids are lowercase ASCII alphanumerics plus the `-`, `_` and `.` separators.
/// Because they have to be validated, they are converted with [`TryFrom`].
/// # Examples:
/// ```
/// use trie_sdk::types::AccountId;
///
/// assert!(AccountId::try_from("Alice").is_err());
/// assert!(AccountId::try_from("a").is_err());
///
/// let alice = AccountId::try_from("alice.test").unwrap();
/// assert_eq!(alice.as_str(), "alice.test");
/// ```
#[derive(BorshSerialize, BorshDeserialize, Hash, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct AccountId(String);

impl AccountId {
    /// Wraps `id` without validating it.
    pub(crate) fn new_unchecked(id: &str) -> Self {
        Self(id.to_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the raw UTF-8 bytes of the account id
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    pub fn into_string(self) -> String {
        self.0
    }

    fn validate(id: &str) -> Result<(), ParseAccountIdError> {
        if !(MIN_ACCOUNT_ID_LEN..=MAX_ACCOUNT_ID_LEN).contains(&id.len()) {
            return Err(ParseAccountIdError::Length(id.len()));
        }
        match id
            .chars()
            .find(|c| !matches!(c, 'a'..='z' | '0'..='9' | '-' | '_' | '.'))
        {
            Some(c) => Err(ParseAccountIdError::InvalidChar(c)),
            None => Ok(()),
        }
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl fmt::Debug for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl AsRef<str> for AccountId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for AccountId {
    type Error = ParseAccountIdError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::validate(value)?;
        Ok(Self(value.to_owned()))
    }
}

impl TryFrom<String> for AccountId {
    type Error = ParseAccountIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::validate(&value)?;
        Ok(Self(value))
    }
}

impl TryFrom<&[u8]> for AccountId {
    type Error = ParseAccountIdError;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        let id = std::str::from_utf8(value).map_err(|_| ParseAccountIdError::NotUtf8)?;
        Self::try_from(id)
    }
}

impl TryFrom<Vec<u8>> for AccountId {
    type Error = ParseAccountIdError;

    fn try_from(value: Vec<u8>) -> Result<Self, Self::Error> {
        let id = String::from_utf8(value).map_err(|_| ParseAccountIdError::NotUtf8)?;
        Self::try_from(id)
    }
}

impl Serialize for AccountId {
    fn serialize<S>(&self, serializer: S) -> Result<<S as Serializer>::Ok, <S as Serializer>::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for AccountId {
    fn deserialize<D>(deserializer: D) -> Result<Self, <D as Deserializer<'de>>::Error>
    where
        D: Deserializer<'de>,
    {
        let s: String = Deserialize::deserialize(deserializer)?;
        AccountId::try_from(s).map_err(serde::de::Error::custom)
    }
}
