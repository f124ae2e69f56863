pub use trie_sdk_macros::contract;
pub use trie_sys as sys;
use std::panic as std_panic;
use types::{AccountId, Balance};

pub mod dispatch;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod store;
pub mod types;

const EVICTED_REGISTER: u64 = u64::MAX - 1;
#[cfg_attr(any(test, feature = "mock"), allow(dead_code))]
const ATOMIC_OP_REGISTER: u64 = u64::MAX - 2;

#[cfg(not(any(test, feature = "mock")))]
macro_rules! try_method_into_register {
    ( $method:ident ) => {{
        unsafe { trie_sys::$method(ATOMIC_OP_REGISTER) };
        read_register(ATOMIC_OP_REGISTER)
    }};
}

#[cfg(not(any(test, feature = "mock")))]
macro_rules! method_into_register {
    ( $method:ident ) => {{
        expect_register(try_method_into_register!($method))
    }};
}

/// Returns the size of the register. If register is not used returns `None`.
#[cfg_attr(any(test, feature = "mock"), allow(dead_code))]
fn register_len(register_id: u64) -> Option<u64> {
    let len = unsafe { trie_sys::register_len(register_id) };
    if len == u64::MAX {
        None
    } else {
        Some(len)
    }
}

/// Reads the content of the `register_id`. If register is not used returns `None`.
fn read_register(register_id: u64) -> Option<Vec<u8>> {
    #[cfg(any(test, feature = "mock"))]
    {
        return mock::read_register(register_id);
    }
    #[cfg(not(any(test, feature = "mock")))]
    {
        let len: usize = register_len(register_id)?
            .try_into()
            .unwrap_or_else(|_| abort());

        let mut buffer = Vec::with_capacity(len);

        unsafe {
            trie_sys::read_register(register_id, buffer.as_mut_ptr() as u64);

            buffer.set_len(len);
        }
        Some(buffer)
    }
}

fn expect_register<T>(option: Option<T>) -> T {
    option.unwrap_or_else(|| abort())
}

/// Implements panic hook that converts `PanicInfo` into a string and provides it through the
/// host interface.
#[cfg_attr(any(test, feature = "mock"), allow(dead_code))]
fn panic_hook_impl(info: &std_panic::PanicInfo) {
    panic(&info.to_string());
}

/// Setups panic hook to expose error info to the host.
///
/// Does nothing against the mocked host, where panics have to unwind into the test harness.
pub fn setup_panic_hook() {
    #[cfg(not(any(test, feature = "mock")))]
    std_panic::set_hook(Box::new(panic_hook_impl));
}

/// Aborts the current contract execution without a custom message.
/// To include a message, use [`crate::panic`].
pub fn abort() -> ! {
    #[cfg(any(test, feature = "mock"))]
    std::panic!("Mocked abort function called!");
    #[cfg(not(any(test, feature = "mock")))]
    unsafe {
        trie_sys::panic()
    }
}

/// Terminates the execution of the program with the message.
///
/// The host reverts every storage mutation made by the current call.
pub fn panic(message: &str) -> ! {
    msg(message);

    #[cfg(any(test, feature = "mock"))]
    std::panic!("{}", message);
    #[cfg(not(any(test, feature = "mock")))]
    unsafe {
        trie_sys::panic_msg(message.as_ptr() as _, message.len() as _)
    }
}

/// The input to the contract call serialized as bytes. If input is not provided returns `None`.
pub fn input() -> Option<Vec<u8>> {
    #[cfg(any(test, feature = "mock"))]
    {
        return mock::input();
    }
    #[cfg(not(any(test, feature = "mock")))]
    try_method_into_register!(input)
}

/// Writes `data` to 'output' register
pub fn output(data: &[u8]) {
    #[cfg(any(test, feature = "mock"))]
    {
        return mock::output(data);
    }
    #[cfg(not(any(test, feature = "mock")))]
    unsafe {
        sys::output(data.as_ptr() as _, data.len() as _)
    }
}

/// Writes a line to the host log.
pub fn msg(message: &str) {
    #[cfg(any(test, feature = "mock"))]
    {
        return mock::msg(message);
    }
    #[cfg(not(any(test, feature = "mock")))]
    {
        #[cfg(all(debug_assertions, not(target_arch = "wasm32")))]
        eprintln!("{}", message);

        unsafe { trie_sys::msg(message.as_ptr() as _, message.len() as _) }
    }
}

/// Writes key-value into storage.
///
/// Returns `true` if the key was already present. In that case the replaced value is placed
/// into the evicted register and can be fetched with [`storage_get_evicted`] until the next
/// evicting call overwrites it.
///
/// Prefer [`storage_write`], which reads the register immediately.
pub fn storage_write_raw(key: &[u8], value: &[u8]) -> bool {
    #[cfg(any(test, feature = "mock"))]
    {
        return mock::storage_write(key, value, EVICTED_REGISTER);
    }
    #[cfg(not(any(test, feature = "mock")))]
    match unsafe {
        sys::storage_write(
            key.as_ptr() as _,
            key.len() as _,
            value.as_ptr() as _,
            value.len() as _,
            EVICTED_REGISTER,
        )
    } {
        0 => false,
        1 => true,
        _ => abort(),
    }
}

/// Removes the value stored under the given key.
///
/// Returns `true` if the key-value existed. The removed value is placed into the evicted
/// register, same as for [`storage_write_raw`].
pub fn storage_remove_raw(key: &[u8]) -> bool {
    #[cfg(any(test, feature = "mock"))]
    {
        return mock::storage_remove(key, EVICTED_REGISTER);
    }
    #[cfg(not(any(test, feature = "mock")))]
    match unsafe { sys::storage_remove(key.as_ptr() as _, key.len() as _, EVICTED_REGISTER) } {
        0 => false,
        1 => true,
        _ => abort(),
    }
}

/// Reads the value last evicted by [`storage_write_raw`] or [`storage_remove_raw`].
///
/// The register holds one value only. Any other evicting call issued in between replaces it.
pub fn storage_get_evicted() -> Option<Vec<u8>> {
    read_register(EVICTED_REGISTER)
}

/// Writes key-value into storage.
///
/// If the storage did not have this key present, `None` is returned.
///
/// If the storage did have this key present, the value is updated, and the old value is returned.
pub fn storage_write(key: &[u8], value: &[u8]) -> Option<Vec<u8>> {
    if storage_write_raw(key, value) {
        Some(expect_register(storage_get_evicted()))
    } else {
        None
    }
}

/// Removes the value stored under the given key.
///
/// Returns the removed value if the key-value existed.
pub fn storage_remove(key: &[u8]) -> Option<Vec<u8>> {
    if storage_remove_raw(key) {
        Some(expect_register(storage_get_evicted()))
    } else {
        None
    }
}

/// Reads the value stored under the given key.
///
/// If the storage doesn't have the key present, returns `None`
pub fn storage_read(key: &[u8]) -> Option<Vec<u8>> {
    #[cfg(any(test, feature = "mock"))]
    {
        return mock::storage_read(key);
    }
    #[cfg(not(any(test, feature = "mock")))]
    match unsafe { sys::storage_read(key.as_ptr() as _, key.len() as _, ATOMIC_OP_REGISTER) } {
        0 => None,
        1 => Some(expect_register(read_register(ATOMIC_OP_REGISTER))),
        _ => abort(),
    }
}

/// Returns `true` if the storage has a value under the given key.
pub fn storage_has_key(key: &[u8]) -> bool {
    #[cfg(any(test, feature = "mock"))]
    {
        return mock::storage_has_key(key);
    }
    #[cfg(not(any(test, feature = "mock")))]
    match unsafe { sys::storage_has_key(key.as_ptr() as _, key.len() as _) } {
        0 => false,
        1 => true,
        _ => abort(),
    }
}

/// Returns `true` if the contract has write permissions and `false` if it doesn't.
pub fn storage_write_perm() -> bool {
    #[cfg(any(test, feature = "mock"))]
    {
        return mock::storage_write_perm();
    }
    #[cfg(not(any(test, feature = "mock")))]
    match unsafe { sys::storage_write_perm() } {
        0 => false,
        1 => true,
        _ => abort(),
    }
}

/// Returns the account that called the current contract.
pub fn caller_address() -> AccountId {
    #[cfg(any(test, feature = "mock"))]
    {
        return mock::caller_address();
    }
    #[cfg(not(any(test, feature = "mock")))]
    method_into_register!(caller_address)
        .try_into()
        .unwrap_or_else(|_| abort())
}

/// Returns the account of the current contract's instance.
pub fn contract_instance_address() -> AccountId {
    #[cfg(any(test, feature = "mock"))]
    {
        return mock::contract_instance_address();
    }
    #[cfg(not(any(test, feature = "mock")))]
    method_into_register!(contract_instance_address)
        .try_into()
        .unwrap_or_else(|_| abort())
}

/// Returns the amount of tokens attached to the current call.
pub fn attached_deposit() -> Balance {
    #[cfg(any(test, feature = "mock"))]
    {
        return mock::attached_deposit();
    }
    #[cfg(not(any(test, feature = "mock")))]
    {
        let mut buf = [0u8; std::mem::size_of::<Balance>()];

        unsafe { trie_sys::attached_deposit(buf.as_mut_ptr() as _, buf.len() as _) };

        Balance::from_le_bytes(buf)
    }
}
