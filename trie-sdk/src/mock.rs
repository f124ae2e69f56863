//! In-memory host used by unit tests and by tests of contracts built with the `mock` feature.
//!
//! State is thread-local, so every test (which the harness runs on its own thread) starts
//! from empty storage.
use std::cell::RefCell;
use std::collections::HashMap;

use crate::types::{AccountId, Balance};

thread_local! {
    static MOCK_DATA: RefCell<MockData> = RefCell::new(MockData::new());
}

const CALLER_ADDRESS: &str = "mock-caller.test";
const CONTRACT_INSTANCE_ADDRESS: &str = "mock-instance.test";
const ERR_READ_ONLY_EXECUTION: &str = "Storage cannot be modified in a read-only execution";

pub struct MockData {
    storage: HashMap<Vec<u8>, Vec<u8>>,
    registers: HashMap<u64, Vec<u8>>,
    input: Option<Vec<u8>>,
    output: Vec<u8>,
    messages: Vec<String>,
    caller_address: AccountId,
    contract_instance_address: AccountId,
    attached_deposit: Balance,
    write_perm: bool,
}

impl MockData {
    pub fn new() -> Self {
        Self {
            storage: HashMap::new(),
            registers: HashMap::new(),
            input: Some(Vec::new()),
            output: Vec::new(),
            messages: Vec::new(),
            caller_address: AccountId::new_unchecked(CALLER_ADDRESS),
            contract_instance_address: AccountId::new_unchecked(CONTRACT_INSTANCE_ADDRESS),
            attached_deposit: 0,
            write_perm: true,
        }
    }
}

impl Default for MockData {
    fn default() -> Self {
        Self::new()
    }
}

/*
 * Host side
 */

/// Storage mutations abort a read-only execution, as on the host.
fn check_write_perm(mock_data: &MockData) {
    if !mock_data.write_perm {
        std::panic!("{}", ERR_READ_ONLY_EXECUTION);
    }
}

pub fn storage_write(key: &[u8], value: &[u8], evicted_register_id: u64) -> bool {
    MOCK_DATA.with(|data| {
        let mut mock_data = data.borrow_mut();
        check_write_perm(&mock_data);
        match mock_data.storage.insert(key.to_vec(), value.to_vec()) {
            Some(evicted) => {
                mock_data.registers.insert(evicted_register_id, evicted);
                true
            }
            None => false,
        }
    })
}

pub fn storage_remove(key: &[u8], evicted_register_id: u64) -> bool {
    MOCK_DATA.with(|data| {
        let mut mock_data = data.borrow_mut();
        check_write_perm(&mock_data);
        match mock_data.storage.remove(key) {
            Some(evicted) => {
                mock_data.registers.insert(evicted_register_id, evicted);
                true
            }
            None => false,
        }
    })
}

pub fn storage_read(key: &[u8]) -> Option<Vec<u8>> {
    MOCK_DATA.with(|data| data.borrow().storage.get(key).cloned())
}

pub fn storage_has_key(key: &[u8]) -> bool {
    MOCK_DATA.with(|data| data.borrow().storage.contains_key(key))
}

pub fn storage_write_perm() -> bool {
    MOCK_DATA.with(|data| data.borrow().write_perm)
}

pub fn read_register(register_id: u64) -> Option<Vec<u8>> {
    MOCK_DATA.with(|data| data.borrow().registers.get(&register_id).cloned())
}

pub fn input() -> Option<Vec<u8>> {
    MOCK_DATA.with(|data| data.borrow().input.clone())
}

pub fn output(data: &[u8]) {
    MOCK_DATA.with(|data_refcell| {
        let mut data_inside = data_refcell.borrow_mut();
        data_inside.output = data.to_vec();
    })
}

pub fn msg(message: &str) {
    MOCK_DATA.with(|data| data.borrow_mut().messages.push(message.to_owned()))
}

pub fn caller_address() -> AccountId {
    MOCK_DATA.with(|data| data.borrow().caller_address.clone())
}

pub fn contract_instance_address() -> AccountId {
    MOCK_DATA.with(|data| data.borrow().contract_instance_address.clone())
}

pub fn attached_deposit() -> Balance {
    MOCK_DATA.with(|data| data.borrow().attached_deposit)
}

/*
 * Test side
 */

pub fn set_mock_input(data: Vec<u8>) {
    MOCK_DATA.with(|data_refcell| {
        let mut data_inside = data_refcell.borrow_mut();
        data_inside.input = Some(data);
    });
}

pub fn get_mock_output() -> Vec<u8> {
    MOCK_DATA.with(|data| data.borrow().output.clone())
}

pub fn get_mock_msgs() -> Vec<String> {
    MOCK_DATA.with(|data| data.borrow().messages.clone())
}

pub fn clear_mock_io() {
    MOCK_DATA.with(|data| {
        let mut data = data.borrow_mut();
        data.input = None;
        data.output = Vec::new();
        data.messages = Vec::new();
    })
}

pub fn set_mock_caller_address(caller_address: AccountId) {
    MOCK_DATA.with(|data| data.borrow_mut().caller_address = caller_address)
}

pub fn set_mock_contract_instance_address(contract_instance_address: AccountId) {
    MOCK_DATA.with(|data| data.borrow_mut().contract_instance_address = contract_instance_address)
}

pub fn set_mock_attached_deposit(amount: Balance) {
    MOCK_DATA.with(|data| data.borrow_mut().attached_deposit = amount)
}

pub fn set_mock_write_perm(write_perm: bool) {
    MOCK_DATA.with(|data| data.borrow_mut().write_perm = write_perm)
}

/// Returns every stored key starting with `prefix`, sorted.
pub fn storage_keys_with_prefix(prefix: &[u8]) -> Vec<Vec<u8>> {
    MOCK_DATA.with(|data| {
        let mut keys: Vec<Vec<u8>> = data
            .borrow()
            .storage
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect();
        keys.sort();
        keys
    })
}

/// Removes a key behind the collections' back. Used to simulate corrupted storage.
pub fn remove_from_mock_storage(key: &[u8]) -> bool {
    MOCK_DATA.with(|data| data.borrow_mut().storage.remove(key).is_some())
}
