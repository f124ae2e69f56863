//! The pipeline every exported contract method runs through.
//!
//! [`crate::contract`] generates one entry point per public method, and each entry point hands
//! its method to [`init`], [`call`] or [`view`]. The stages run in a fixed order:
//!
//! 1. reentrancy guard
//! 2. access stages ([`ACCESS_STAGES`]): private caller check, then payment check
//! 3. JSON arguments from [`crate::input`]
//! 4. contract state from storage
//! 5. the method itself
//! 6. JSON result into [`crate::output`]
//! 7. contract state back to storage (not for views, which only borrow the state)
use borsh::{BorshDeserialize, BorshSerialize};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// Storage key of the contract state.
pub const STATE_KEY: &[u8] = b"STATE";
const REENTRANCY_GUARD_KEY: &[u8] = b"__REENTRANCY_GUARD__";
const REENTRANCY_GUARD: &[u8] = b"";
const EMPTY_ARGS: &[u8] = b"{}";

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Found a cross-contract call loop")]
    Reentrancy,
    #[error("Function is private")]
    Private,
    #[error("Function is not payable")]
    NotPayable,
    #[error("Failed to deserialize input from JSON: {0}")]
    Input(#[source] serde_json::Error),
    #[error("Failed to serialize the return value using JSON: {0}")]
    Output(#[source] serde_json::Error),
    #[error("The contract is not initialized")]
    NotInitialized,
    #[error("The contract has already been initialized")]
    AlreadyInitialized,
    #[error("Cannot deserialize the contract state")]
    State,
}

/// How a method treats the contract state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MethodKind {
    /// Creates the state. Fails if it already exists.
    Init,
    /// Loads the state and stores it back afterwards.
    Call,
    /// Loads the state and only borrows it.
    View,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MethodOptions {
    pub kind: MethodKind,
    /// Only the contract itself may call the method.
    pub private: bool,
    /// The method accepts an attached deposit.
    pub payable: bool,
}

impl MethodOptions {
    pub const fn init() -> Self {
        Self::new(MethodKind::Init)
    }

    pub const fn call() -> Self {
        Self::new(MethodKind::Call)
    }

    pub const fn view() -> Self {
        Self::new(MethodKind::View)
    }

    const fn new(kind: MethodKind) -> Self {
        Self {
            kind,
            private: false,
            payable: false,
        }
    }

    pub const fn private(mut self) -> Self {
        self.private = true;
        self
    }

    pub const fn payable(mut self) -> Self {
        self.payable = true;
        self
    }
}

type AccessStage = fn(&MethodOptions) -> Result<(), DispatchError>;

/// Checks applied before arguments are even read, in this order.
pub const ACCESS_STAGES: &[AccessStage] = &[check_private, check_payable];

fn check_private(options: &MethodOptions) -> Result<(), DispatchError> {
    if options.private && crate::caller_address() != crate::contract_instance_address() {
        return Err(DispatchError::Private);
    }
    Ok(())
}

fn check_payable(options: &MethodOptions) -> Result<(), DispatchError> {
    if !options.payable && crate::attached_deposit() > 0 {
        return Err(DispatchError::NotPayable);
    }
    Ok(())
}

/// Marks the contract as being executed until dropped. Only writable executions leave a mark;
/// read-only ones just check that no writable execution of the same contract is on the stack.
struct ReentrancyGuard {
    write_perm: bool,
}

impl ReentrancyGuard {
    fn acquire() -> Result<Self, DispatchError> {
        let write_perm = crate::storage_write_perm();
        let found = if write_perm {
            crate::storage_write_raw(REENTRANCY_GUARD_KEY, REENTRANCY_GUARD)
        } else {
            crate::storage_has_key(REENTRANCY_GUARD_KEY)
        };
        if found {
            return Err(DispatchError::Reentrancy);
        }
        Ok(Self { write_perm })
    }
}

impl Drop for ReentrancyGuard {
    fn drop(&mut self) {
        if self.write_perm {
            crate::storage_remove_raw(REENTRANCY_GUARD_KEY);
        }
    }
}

/// Reads the contract state. Returns `Ok(None)` if the contract was never initialized.
pub fn read_state<S: BorshDeserialize>() -> Result<Option<S>, DispatchError> {
    match crate::storage_read(STATE_KEY) {
        Some(raw) => S::try_from_slice(&raw)
            .map(Some)
            .map_err(|_| DispatchError::State),
        None => Ok(None),
    }
}

pub fn write_state<S: BorshSerialize>(state: &S) {
    let raw = state
        .try_to_vec()
        .unwrap_or_else(|_| crate::panic("Cannot serialize the contract state"));
    crate::storage_write_raw(STATE_KEY, &raw);
}

fn read_args<A: DeserializeOwned>() -> Result<A, DispatchError> {
    let input = crate::input().filter(|input| !input.is_empty());
    serde_json::from_slice(input.as_deref().unwrap_or(EMPTY_ARGS)).map_err(DispatchError::Input)
}

fn write_result<R: Serialize>(result: &R) -> Result<(), DispatchError> {
    let result = serde_json::to_vec(result).map_err(DispatchError::Output)?;
    crate::output(&result);
    Ok(())
}

fn enter(options: &MethodOptions) -> Result<ReentrancyGuard, DispatchError> {
    let guard = ReentrancyGuard::acquire()?;
    for stage in ACCESS_STAGES {
        stage(options)?;
    }
    Ok(guard)
}

/// Runs an `init` method: the state it returns becomes the contract state.
pub fn try_init<S, A, F>(options: MethodOptions, method: F) -> Result<(), DispatchError>
where
    S: BorshSerialize,
    A: DeserializeOwned,
    F: FnOnce(A) -> S,
{
    let guard = enter(&options)?;
    let args = read_args::<A>()?;
    if crate::storage_has_key(STATE_KEY) {
        return Err(DispatchError::AlreadyInitialized);
    }

    let state = method(args);

    write_state(&state);
    drop(guard);
    Ok(())
}

/// Runs a `call` method against the stored contract state and stores the state back.
pub fn try_call<S, A, R, F>(options: MethodOptions, method: F) -> Result<(), DispatchError>
where
    S: BorshSerialize + BorshDeserialize,
    A: DeserializeOwned,
    R: Serialize,
    F: FnOnce(&mut S, A) -> R,
{
    let guard = enter(&options)?;
    let args = read_args::<A>()?;
    let mut state = read_state::<S>()?.ok_or(DispatchError::NotInitialized)?;

    let result = method(&mut state, args);

    write_result(&result)?;
    write_state(&state);
    drop(guard);
    Ok(())
}

/// Runs a `view` method. The method only borrows the state, so its collections cannot be
/// changed without their descriptors being stored.
pub fn try_view<S, A, R, F>(options: MethodOptions, method: F) -> Result<(), DispatchError>
where
    S: BorshDeserialize,
    A: DeserializeOwned,
    R: Serialize,
    F: FnOnce(&S, A) -> R,
{
    let guard = enter(&options)?;
    let args = read_args::<A>()?;
    let state = read_state::<S>()?.ok_or(DispatchError::NotInitialized)?;

    let result = method(&state, args);

    write_result(&result)?;
    drop(guard);
    Ok(())
}

/// Entry point used by generated `init` exports. Any failure aborts the execution.
pub fn init<S, A, F>(options: MethodOptions, method: F)
where
    S: BorshSerialize,
    A: DeserializeOwned,
    F: FnOnce(A) -> S,
{
    crate::setup_panic_hook();
    if let Err(err) = try_init(options, method) {
        crate::panic(&err.to_string())
    }
}

/// Entry point used by generated `call` exports. Any failure aborts the execution.
pub fn call<S, A, R, F>(options: MethodOptions, method: F)
where
    S: BorshSerialize + BorshDeserialize,
    A: DeserializeOwned,
    R: Serialize,
    F: FnOnce(&mut S, A) -> R,
{
    crate::setup_panic_hook();
    if let Err(err) = try_call(options, method) {
        crate::panic(&err.to_string())
    }
}

/// Entry point used by generated `view` exports. Any failure aborts the execution.
pub fn view<S, A, R, F>(options: MethodOptions, method: F)
where
    S: BorshDeserialize,
    A: DeserializeOwned,
    R: Serialize,
    F: FnOnce(&S, A) -> R,
{
    crate::setup_panic_hook();
    if let Err(err) = try_view(options, method) {
        crate::panic(&err.to_string())
    }
}

//====================================================== TESTS =================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::*;
    use crate::store::UnorderedSet;
    use crate::types::AccountId;
    use serde::Deserialize;

    #[derive(BorshSerialize, BorshDeserialize)]
    struct Counter {
        count: u64,
        seen: UnorderedSet<String>,
    }

    #[derive(Deserialize)]
    struct NoArgs {}

    #[derive(Deserialize)]
    struct AddArgs {
        name: String,
    }

    fn init_counter() {
        try_init(MethodOptions::init(), |_: NoArgs| Counter {
            count: 0,
            seen: UnorderedSet::new(b"seen".to_vec()),
        })
        .unwrap();
    }

    fn add(counter: &mut Counter, args: AddArgs) -> u64 {
        if counter.seen.insert(args.name) {
            counter.count += 1;
        }
        counter.count
    }

    fn has_seen(counter: &Counter, args: AddArgs) -> bool {
        counter.seen.contains(&args.name)
    }

    fn count(counter: &Counter, _: NoArgs) -> u64 {
        counter.count
    }

    #[test]
    fn test_init_writes_state() {
        init_counter();

        let state: Counter = read_state().unwrap().unwrap();
        assert_eq!(state.count, 0);
        assert!(state.seen.is_empty());
        assert!(!storage_has_key(REENTRANCY_GUARD_KEY));
    }

    #[test]
    fn test_init_twice() {
        init_counter();

        let result = try_init(MethodOptions::init(), |_: NoArgs| Counter {
            count: 10,
            seen: UnorderedSet::new(b"seen".to_vec()),
        });
        assert!(matches!(result, Err(DispatchError::AlreadyInitialized)));
    }

    #[test]
    fn test_call_persists_state() {
        init_counter();

        set_mock_input(br#"{"name":"alice"}"#.to_vec());
        try_call(MethodOptions::call(), add).unwrap();
        assert_eq!(get_mock_output(), b"1");

        set_mock_input(br#"{"name":"alice"}"#.to_vec());
        try_call(MethodOptions::call(), add).unwrap();
        assert_eq!(get_mock_output(), b"1");

        set_mock_input(br#"{"name":"bob"}"#.to_vec());
        try_call(MethodOptions::call(), add).unwrap();
        assert_eq!(get_mock_output(), b"2");

        let state: Counter = read_state().unwrap().unwrap();
        assert_eq!(state.count, 2);
        assert_eq!(state.seen.to_vec(), vec!["alice", "bob"]);
    }

    #[test]
    fn test_view_reads_state() {
        init_counter();
        set_mock_input(br#"{"name":"alice"}"#.to_vec());
        try_call(MethodOptions::call(), add).unwrap();

        set_mock_input(br#"{"name":"alice"}"#.to_vec());
        try_view(MethodOptions::view(), has_seen).unwrap();
        assert_eq!(get_mock_output(), b"true");

        set_mock_input(br#"{"name":"bob"}"#.to_vec());
        try_view(MethodOptions::view(), has_seen).unwrap();
        assert_eq!(get_mock_output(), b"false");
    }

    #[test]
    fn test_view_leaves_storage_untouched() {
        init_counter();
        let before = storage_keys_with_prefix(b"");

        set_mock_input(br#"{"name":"alice"}"#.to_vec());
        try_view(MethodOptions::view(), has_seen).unwrap();
        assert_eq!(storage_keys_with_prefix(b""), before);

        // The set is still consistent, so a later call records the element exactly once.
        set_mock_input(br#"{"name":"alice"}"#.to_vec());
        try_call(MethodOptions::call(), add).unwrap();

        let state: Counter = read_state().unwrap().unwrap();
        assert_eq!(state.count, 1);
        assert_eq!(state.seen.len(), 1);
        assert!(state.seen.contains("alice"));
    }

    #[test]
    #[should_panic(expected = "read-only execution")]
    fn test_read_only_execution_cannot_call() {
        init_counter();
        set_mock_write_perm(false);

        set_mock_input(br#"{"name":"alice"}"#.to_vec());
        let _ = try_call(MethodOptions::call(), add);
    }

    #[test]
    fn test_call_before_init() {
        set_mock_input(br#"{"name":"alice"}"#.to_vec());

        let result = try_call(MethodOptions::call(), add);
        assert!(matches!(result, Err(DispatchError::NotInitialized)));
    }

    #[test]
    fn test_bad_input() {
        init_counter();
        set_mock_input(br#"{"nom":"alice"}"#.to_vec());

        let result = try_call(MethodOptions::call(), add);
        assert!(matches!(result, Err(DispatchError::Input(_))));
    }

    #[test]
    fn test_missing_input_reads_as_empty_object() {
        clear_mock_io();

        try_init(MethodOptions::init(), |_: NoArgs| Counter {
            count: 3,
            seen: UnorderedSet::new(b"seen".to_vec()),
        })
        .unwrap();

        try_view(MethodOptions::view(), count).unwrap();
        assert_eq!(get_mock_output(), b"3");
    }

    #[test]
    fn test_private_method() {
        init_counter();
        let options = MethodOptions::call().private();

        set_mock_input(br#"{"name":"alice"}"#.to_vec());
        let result = try_call(options, add);
        assert!(matches!(result, Err(DispatchError::Private)));

        set_mock_caller_address(crate::contract_instance_address());
        set_mock_input(br#"{"name":"alice"}"#.to_vec());
        try_call(options, add).unwrap();
        assert_eq!(get_mock_output(), b"1");
    }

    #[test]
    fn test_payable_method() {
        init_counter();
        set_mock_attached_deposit(10);

        set_mock_input(br#"{"name":"alice"}"#.to_vec());
        let result = try_call(MethodOptions::call(), add);
        assert!(matches!(result, Err(DispatchError::NotPayable)));

        set_mock_input(br#"{"name":"alice"}"#.to_vec());
        try_call(MethodOptions::call().payable(), add).unwrap();
        assert_eq!(get_mock_output(), b"1");
    }

    #[test]
    fn test_private_checked_before_payment() {
        init_counter();
        set_mock_caller_address(AccountId::try_from("stranger.test").unwrap());
        set_mock_attached_deposit(10);

        let result = try_call(MethodOptions::call().private(), add);
        assert!(matches!(result, Err(DispatchError::Private)));
    }

    #[test]
    fn test_reentrancy_guard() {
        init_counter();
        crate::storage_write_raw(REENTRANCY_GUARD_KEY, REENTRANCY_GUARD);

        set_mock_input(br#"{"name":"alice"}"#.to_vec());
        let result = try_call(MethodOptions::call(), add);
        assert!(matches!(result, Err(DispatchError::Reentrancy)));

        set_mock_write_perm(false);
        let result = try_view(MethodOptions::view(), has_seen);
        assert!(matches!(result, Err(DispatchError::Reentrancy)));
    }

    #[test]
    fn test_read_only_execution_leaves_no_guard() {
        init_counter();
        set_mock_write_perm(false);

        set_mock_input(br#"{"name":"alice"}"#.to_vec());
        try_view(MethodOptions::view(), has_seen).unwrap();
        assert_eq!(get_mock_output(), b"false");
        assert!(!storage_has_key(REENTRANCY_GUARD_KEY));
    }

    #[test]
    #[should_panic(expected = "Function is not payable")]
    fn test_call_panics_with_error_message() {
        init_counter();
        set_mock_attached_deposit(1);

        call(MethodOptions::call(), add);
    }
}
