#![no_std]

// Registers let the host hand data to the contract without moving it out of the VM first.
type RegisterId = u64;
// An address in virtual memory.
type MemoryAddress = u64;
type ReturnCode = u64;

extern "C" {
    /*
     * Register API
     */
    pub fn read_register(register_id: RegisterId, result_addr: MemoryAddress);
    // u64::MAX if the register is not used
    pub fn register_len(register_id: RegisterId) -> u64;
    pub fn write_register(register_id: RegisterId, data_addr: MemoryAddress, data_len: u64);
    /*
     * Storage API
     */
    // 0 or 1 depending on whether anything was replaced. The replaced value goes to
    // `evicted_register_id`.
    pub fn storage_write(
        key_addr: MemoryAddress,
        key_len: u64,
        value_addr: MemoryAddress,
        value_len: u64,
        evicted_register_id: RegisterId,
    ) -> ReturnCode;
    // 0 or 1 depending on whether anything was read
    pub fn storage_read(
        key_addr: MemoryAddress,
        key_len: u64,
        register_id: RegisterId,
    ) -> ReturnCode;
    // 0 or 1 depending on whether anything was removed. The removed value goes to
    // `evicted_register_id`.
    pub fn storage_remove(
        key_addr: MemoryAddress,
        key_len: u64,
        evicted_register_id: RegisterId,
    ) -> ReturnCode;
    // 0 or 1 depending on whether the key is present
    pub fn storage_has_key(key_addr: MemoryAddress, key_len: u64) -> ReturnCode;
    // 0 or 1 depending on whether the contract has write permissions
    pub fn storage_write_perm() -> ReturnCode;
    /*
     * Context API
     */
    pub fn input(result_register_id: RegisterId);
    pub fn output(output_addr: MemoryAddress, output_len: u64);
    pub fn caller_address(register_id: RegisterId);
    pub fn contract_instance_address(register_id: RegisterId);
    // Writes the attached deposit as a little-endian u128
    pub fn attached_deposit(output_addr: MemoryAddress, output_len: u64);
    /*
     * Misc API
     */
    pub fn panic() -> !;
    pub fn panic_msg(msg_addr: MemoryAddress, msg_len: u64) -> !;
    pub fn msg(addr: MemoryAddress, len: u64);
}
