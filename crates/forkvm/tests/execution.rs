//! End-to-end execution scenarios: bytecode through the interpreter, and
//! whole transactions through the executor, across fork boundaries.

use forkvm::prelude::*;

fn addr(n: u8) -> Address {
    Address::new([n; 20])
}

const SENDER: u8 = 0xA1;
const TARGET: u8 = 0xB2;

/// Runs `code` as the target contract of a top-level call message.
fn run_code(
    state: &mut JournaledState,
    fork: &ForkSpec,
    ctx: &TransactionContext,
    code: Vec<u8>,
    data: Vec<u8>,
    gas: u64,
) -> ComputationResult {
    let msg = Message::call(
        addr(SENDER),
        addr(TARGET),
        U256::zero(),
        Bytes::from_vec(data),
        gas,
        Bytes::from_vec(code),
    );
    apply_message(state, fork, ctx, msg)
}

/// PUSH1-heavy assembler helper.
fn push1(value: u8) -> Vec<u8> {
    vec![0x60, value]
}

fn push20(address: Address) -> Vec<u8> {
    let mut out = vec![0x73];
    out.extend_from_slice(address.as_bytes());
    out
}

fn push32(word: [u8; 32]) -> Vec<u8> {
    let mut out = vec![0x7F];
    out.extend_from_slice(&word);
    out
}

// =============================================================================
// ROUND-TRIP LAWS
// =============================================================================

#[test]
fn test_mstore_mload_roundtrip() {
    let mut word = [0u8; 32];
    word[0] = 0xDE;
    word[31] = 0xAD;

    // MSTORE the word at 0, MLOAD it back, MSTORE the copy at 32, return
    // bytes 32..64.
    let mut code = Vec::new();
    code.extend(push32(word));
    code.extend(push1(0));
    code.push(0x52); // MSTORE
    code.extend(push1(0));
    code.push(0x51); // MLOAD
    code.extend(push1(0x20));
    code.push(0x52); // MSTORE
    code.extend(push1(0x20));
    code.extend(push1(0x20));
    code.push(0xF3); // RETURN

    let mut state = JournaledState::new();
    let fork = ForkSpec::shanghai();
    let ctx = TransactionContext::default();
    let result = run_code(&mut state, &fork, &ctx, code, vec![], 100_000);

    assert!(result.is_success());
    assert_eq!(result.output.as_slice(), &word);
}

#[test]
fn test_push_pop_is_stack_noop_with_fixed_gas() {
    // PUSH32 x, POP, STOP: exactly 3 + 2 gas.
    let mut code = push32([0x11; 32]);
    code.push(0x50); // POP
    code.push(0x00); // STOP

    let mut state = JournaledState::new();
    let fork = ForkSpec::shanghai();
    let ctx = TransactionContext::default();
    let result = run_code(&mut state, &fork, &ctx, code, vec![], 1_000);

    assert!(result.is_success());
    assert_eq!(result.gas_remaining, 1_000 - 5);
}

#[test]
fn test_sstore_sload_same_frame() {
    // SSTORE(5, 42) then SLOAD(5), return the loaded word.
    let mut code = Vec::new();
    code.extend(push1(42));
    code.extend(push1(5));
    code.push(0x55); // SSTORE
    code.extend(push1(5));
    code.push(0x54); // SLOAD
    code.extend(push1(0));
    code.push(0x52); // MSTORE
    code.extend(push1(0x20));
    code.extend(push1(0));
    code.push(0xF3); // RETURN

    let mut state = JournaledState::new();
    state.begin_transaction();
    let fork = ForkSpec::istanbul();
    let ctx = TransactionContext::default();
    let result = run_code(&mut state, &fork, &ctx, code, vec![], 100_000);

    assert!(result.is_success());
    assert_eq!(
        U256::from_big_endian(result.output.as_slice()),
        U256::from(42)
    );
    assert_eq!(
        state.get_storage(addr(TARGET), U256::from(5)),
        U256::from(42)
    );
}

// =============================================================================
// SEED SCENARIO 1-2: ECRECOVER THROUGH THE CALL PATH
// =============================================================================

fn ecrecover_input(v: u8) -> Vec<u8> {
    let mut input = hex::decode(
        "47173285a8d7341e5e972fc677286384f802f8ef42a5ec5f03bbfa254cb01fad\
         000000000000000000000000000000000000000000000000000000000000001b\
         650acf9d3f5f0a2c799776a1254355d5f4061762a237396a99a0e0e3fc2bcd67\
         29514a0dacb2e623ac4abd157cb18163ff942280db4d5caad66ddf941ba12e03",
    )
    .unwrap();
    input[63] = v;
    input
}

#[test]
fn test_ecrecover_happy_path() {
    let mut state = JournaledState::new();
    let fork = ForkSpec::homestead();
    let ctx = TransactionContext::default();

    // Message straight at the precompile address with exactly its cost.
    let msg = Message::call(
        addr(SENDER),
        Address::new({
            let mut a = [0u8; 20];
            a[19] = 1;
            a
        }),
        U256::zero(),
        Bytes::from_vec(ecrecover_input(27)),
        3_000,
        Bytes::new(),
    );
    let result = apply_message(&mut state, &fork, &ctx, msg);

    assert!(result.is_success());
    assert_eq!(result.gas_remaining, 0);
    assert_eq!(
        result.output.as_slice(),
        &hex::decode("000000000000000000000000c08b5542d177ac6686946920409741463a15dddb")
            .unwrap()[..]
    );
}

#[test]
fn test_ecrecover_bad_v_is_success_with_empty_output() {
    // The caller CALLs the precompile with v = 29 and returns
    // (status, returndatasize): the push is 1 and the return data empty.
    let mut code = Vec::new();
    // Copy the full 128-byte calldata to memory.
    code.extend(push1(0x80));
    code.extend(push1(0));
    code.extend(push1(0));
    code.push(0x37); // CALLDATACOPY
    // CALL(gas=3000, to=0x01, value=0, in=0..128, out=nothing)
    code.extend(push1(0)); // out_len
    code.extend(push1(0)); // out_off
    code.extend(push1(0x80)); // in_len
    code.extend(push1(0)); // in_off
    code.extend(push1(0)); // value
    code.extend(push1(1)); // to
    code.extend(vec![0x61, 0x0B, 0xB8]); // PUSH2 3000
    code.push(0xF1); // CALL
    // mem[0..32] = status
    code.extend(push1(0));
    code.push(0x52); // MSTORE
    // mem[32..64] = RETURNDATASIZE
    code.push(0x3D); // RETURNDATASIZE
    code.extend(push1(0x20));
    code.push(0x52); // MSTORE
    code.extend(push1(0x40));
    code.extend(push1(0));
    code.push(0xF3); // RETURN

    let mut state = JournaledState::new();
    let fork = ForkSpec::byzantium();
    let ctx = TransactionContext::default();
    let result = run_code(&mut state, &fork, &ctx, code, ecrecover_input(29), 100_000);

    assert!(result.is_success());
    let status = U256::from_big_endian(&result.output.as_slice()[..32]);
    let returndata_len = U256::from_big_endian(&result.output.as_slice()[32..]);
    // Validation failure inside the precompile is success to the caller,
    // with nothing returned.
    assert_eq!(status, U256::one());
    assert_eq!(returndata_len, U256::zero());
}

// =============================================================================
// SEED SCENARIO 3: THE HOMESTEAD CODE-DEPOSIT RULE
// =============================================================================

/// Init code that returns 100 bytes of (zero) contract code.
fn hundred_byte_init_code() -> Bytes {
    let mut code = Vec::new();
    code.extend(push1(100));
    code.extend(push1(0));
    code.push(0xF3); // RETURN
    Bytes::from_vec(code)
}

fn run_create(fork: &ForkSpec, gas: u64) -> (ComputationResult, JournaledState, Address) {
    let mut state = JournaledState::new();
    state.set_balance(addr(SENDER), U256::from(1_000));

    let contract = create_address(addr(SENDER), 0);
    let ctx = TransactionContext::default();
    let msg = Message::create(
        addr(SENDER),
        contract,
        U256::one(),
        hundred_byte_init_code(),
        gas,
    );
    let result = apply_create_message(&mut state, fork, &ctx, msg);
    (result, state, contract)
}

#[test]
fn test_create_deposit_shortfall_reverts_under_homestead() {
    // Enough gas to run the init code, nothing left for the 20000-gas
    // code deposit.
    let (result, state, contract) = run_create(&ForkSpec::homestead(), 100);

    assert!(result.is_error());
    assert_eq!(result.error, Some(VmError::OutOfGas));
    // The whole creation rolled back: no account, value back home.
    assert!(!state.account_exists(contract));
    assert_eq!(state.get_balance(addr(SENDER)), U256::from(1_000));
}

#[test]
fn test_create_deposit_shortfall_commits_empty_under_frontier() {
    let (result, state, contract) = run_create(&ForkSpec::frontier(), 100);

    // Frontier commits the account, just without code.
    assert!(result.is_success());
    assert!(state.account_exists(contract));
    assert!(state.get_code(contract).is_empty());
    assert_eq!(state.get_balance(contract), U256::one());
    assert_eq!(state.get_balance(addr(SENDER)), U256::from(999));
}

#[test]
fn test_create_deposit_paid_sets_code() {
    let (result, state, contract) = run_create(&ForkSpec::homestead(), 30_000);

    assert!(result.is_success());
    assert_eq!(state.get_code(contract).len(), 100);
    assert_eq!(result.output.len(), 100);
    assert_eq!(result.created_address, Some(contract));
}

// =============================================================================
// SEED SCENARIO 4: THE SPURIOUS DRAGON EMPTY-ACCOUNT SWEEP
// =============================================================================

#[test]
fn test_empty_account_sweep() {
    let account_a = addr(0xAA);
    let account_b = addr(0xBB);
    let contract_c = addr(0xCC);

    let mut state = JournaledState::new();
    state.set_balance(addr(SENDER), U256::from(10_000_000u64));
    // A and B exist and are empty.
    state.set_balance(account_a, U256::zero());
    state.set_balance(account_b, U256::zero());

    // C: BALANCE(B), POP, CALL(A, value 0), POP, STOP.
    let mut code = Vec::new();
    code.extend(push20(account_b));
    code.push(0x31); // BALANCE
    code.push(0x50); // POP
    code.extend(push1(0)); // out_len
    code.extend(push1(0)); // out_off
    code.extend(push1(0)); // in_len
    code.extend(push1(0)); // in_off
    code.extend(push1(0)); // value
    code.extend(push20(account_a));
    code.extend(vec![0x61, 0x20, 0x00]); // PUSH2 0x2000 gas
    code.push(0xF1); // CALL
    code.push(0x50); // POP
    code.push(0x00); // STOP
    state.set_code(contract_c, Bytes::from_vec(code));

    let config = ChainConfig::single(1, ForkSpec::spurious_dragon());
    let ctx = TransactionContext::default();
    let tx = Transaction {
        nonce: 0,
        gas_price: U256::zero(),
        gas_limit: 200_000,
        to: Some(contract_c),
        value: U256::zero(),
        data: Bytes::new(),
    };

    let mut executor = TransactionExecutor::new(&mut state, &config, ctx);
    let receipt = executor.execute(addr(SENDER), &tx).unwrap();
    assert!(receipt.success);

    // Both touched empty accounts were deleted; the contract survives.
    assert!(!state.account_exists(account_a));
    assert!(!state.account_exists(account_b));
    assert!(state.account_exists(contract_c));
}

#[test]
fn test_no_sweep_before_spurious_dragon() {
    let account_a = addr(0xAA);

    let mut state = JournaledState::new();
    state.set_balance(addr(SENDER), U256::from(10_000_000u64));
    state.set_balance(account_a, U256::zero());

    let config = ChainConfig::single(1, ForkSpec::homestead());
    let tx = Transaction {
        nonce: 0,
        gas_price: U256::zero(),
        gas_limit: 100_000,
        to: Some(account_a),
        value: U256::zero(),
        data: Bytes::new(),
    };

    let mut executor = TransactionExecutor::new(&mut state, &config, TransactionContext::default());
    let receipt = executor.execute(addr(SENDER), &tx).unwrap();
    assert!(receipt.success);

    // Touched and empty, but the clearing rule is not active yet.
    assert!(state.account_exists(account_a));
}

// =============================================================================
// SEED SCENARIO 5: CALLDATACOPY PADDING AND GAS
// =============================================================================

#[test]
fn test_calldatacopy_out_of_range_source() {
    // calldata = 4 bytes; copy 10 bytes from offset 2 to memory 0.
    let mut code = Vec::new();
    code.extend(push1(10)); // len
    code.extend(push1(2)); // src
    code.extend(push1(0)); // dest
    code.push(0x37); // CALLDATACOPY
    code.extend(push1(0x20));
    code.extend(push1(0));
    code.push(0xF3); // RETURN

    let mut state = JournaledState::new();
    let fork = ForkSpec::homestead();
    let ctx = TransactionContext::default();
    let result = run_code(
        &mut state,
        &fork,
        &ctx,
        code,
        vec![0x11, 0x22, 0x33, 0x44],
        100_000,
    );

    assert!(result.is_success());
    let out = result.output.as_slice();
    assert_eq!(&out[0..2], &[0x33, 0x44]);
    assert_eq!(&out[2..10], &[0u8; 8]);

    // Three pushes (9) + CALLDATACOPY static 3 + one copied word 3 +
    // expansion to one word 3, then two pushes (6) + free RETURN.
    assert_eq!(100_000 - result.gas_remaining, 24);
}

// =============================================================================
// SEED SCENARIO 6: RETURNDATACOPY BOUNDS
// =============================================================================

#[test]
fn test_returndatacopy_past_end_fails() {
    let callee = addr(0xDD);

    let mut state = JournaledState::new();
    // Callee returns 8 bytes.
    let mut callee_code = Vec::new();
    callee_code.extend(push1(8));
    callee_code.extend(push1(0));
    callee_code.push(0xF3); // RETURN
    state.set_code(callee, Bytes::from_vec(callee_code));

    // Caller: CALL the callee, then RETURNDATACOPY(0, 0, 16).
    let mut code = Vec::new();
    code.extend(push1(0)); // out_len
    code.extend(push1(0)); // out_off
    code.extend(push1(0)); // in_len
    code.extend(push1(0)); // in_off
    code.extend(push1(0)); // value
    code.extend(push20(callee));
    code.extend(vec![0x61, 0x20, 0x00]); // PUSH2 gas
    code.push(0xF1); // CALL
    code.push(0x50); // POP status
    code.extend(push1(16)); // size
    code.extend(push1(0)); // src
    code.extend(push1(0)); // dest
    code.push(0x3E); // RETURNDATACOPY
    code.push(0x00); // STOP

    let fork = ForkSpec::byzantium();
    let ctx = TransactionContext::default();
    let result = run_code(&mut state, &fork, &ctx, code, vec![], 100_000);

    assert!(result.is_error());
    assert!(matches!(
        result.error,
        Some(VmError::OutOfBoundsRead {
            offset: 0,
            size: 16,
            available: 8
        })
    ));
    // Exceptional halts burn the frame's gas and return nothing.
    assert_eq!(result.gas_remaining, 0);
    assert!(result.output.is_empty());
}

#[test]
fn test_returndatacopy_in_bounds_copies() {
    let callee = addr(0xDD);

    let mut state = JournaledState::new();
    // Callee stores a marker and returns 32 bytes.
    let mut callee_code = Vec::new();
    callee_code.extend(push32([0x5A; 32]));
    callee_code.extend(push1(0));
    callee_code.push(0x52); // MSTORE
    callee_code.extend(push1(32));
    callee_code.extend(push1(0));
    callee_code.push(0xF3); // RETURN
    state.set_code(callee, Bytes::from_vec(callee_code));

    let mut code = Vec::new();
    code.extend(push1(0)); // out_len
    code.extend(push1(0)); // out_off
    code.extend(push1(0)); // in_len
    code.extend(push1(0)); // in_off
    code.extend(push1(0)); // value
    code.extend(push20(callee));
    code.extend(vec![0x61, 0x20, 0x00]);
    code.push(0xF1); // CALL
    code.push(0x50); // POP
    code.extend(push1(32)); // size
    code.extend(push1(0)); // src
    code.extend(push1(0)); // dest
    code.push(0x3E); // RETURNDATACOPY
    code.extend(push1(32));
    code.extend(push1(0));
    code.push(0xF3); // RETURN

    let fork = ForkSpec::byzantium();
    let ctx = TransactionContext::default();
    let result = run_code(&mut state, &fork, &ctx, code, vec![], 200_000);

    assert!(result.is_success());
    assert_eq!(result.output.as_slice(), &[0x5A; 32]);
}

// =============================================================================
// SEED SCENARIO 7: PARIS PREVRANDAO
// =============================================================================

#[test]
fn test_paris_difficulty_reads_mix_hash() {
    let mix_hash = Hash::new([0xAB; 32]);

    let ctx = TransactionContext {
        difficulty: U256::from(131_072u64),
        mix_hash: Some(mix_hash),
        ..TransactionContext::default()
    };

    // 0x44, MSTORE at 0, return the word.
    let mut code = vec![0x44];
    code.extend(push1(0));
    code.push(0x52); // MSTORE
    code.extend(push1(0x20));
    code.extend(push1(0));
    code.push(0xF3); // RETURN

    // Paris reads the mix hash.
    let mut state = JournaledState::new();
    let paris = ForkSpec::paris();
    let result = run_code(&mut state, &paris, &ctx, code.clone(), vec![], 100_000);
    assert!(result.is_success());
    assert_eq!(result.output.as_slice(), mix_hash.as_bytes());

    // London still reads the difficulty from the same context.
    let london = ForkSpec::london();
    let result = run_code(&mut state, &london, &ctx, code, vec![], 100_000);
    assert!(result.is_success());
    assert_eq!(
        U256::from_big_endian(result.output.as_slice()),
        U256::from(131_072u64)
    );
}

// =============================================================================
// STATIC FRAMES
// =============================================================================

#[test]
fn test_staticcall_blocks_sstore_in_callee() {
    let callee = addr(0xEE);

    let mut state = JournaledState::new();
    state.begin_transaction();
    // Callee tries SSTORE(0, 1).
    let mut callee_code = Vec::new();
    callee_code.extend(push1(1));
    callee_code.extend(push1(0));
    callee_code.push(0x55); // SSTORE
    callee_code.push(0x00); // STOP
    state.set_code(callee, Bytes::from_vec(callee_code));

    // Caller STATICCALLs and returns the status word.
    let mut code = Vec::new();
    code.extend(push1(0)); // out_len
    code.extend(push1(0)); // out_off
    code.extend(push1(0)); // in_len
    code.extend(push1(0)); // in_off
    code.extend(push20(callee));
    code.extend(vec![0x61, 0x20, 0x00]);
    code.push(0xFA); // STATICCALL
    code.extend(push1(0));
    code.push(0x52); // MSTORE
    code.extend(push1(0x20));
    code.extend(push1(0));
    code.push(0xF3); // RETURN

    let fork = ForkSpec::byzantium();
    let ctx = TransactionContext::default();
    let result = run_code(&mut state, &fork, &ctx, code, vec![], 200_000);

    assert!(result.is_success());
    // The child failed with write protection: the caller sees a 0 push.
    assert_eq!(U256::from_big_endian(result.output.as_slice()), U256::zero());
    assert_eq!(state.get_storage(callee, U256::zero()), U256::zero());
}

// =============================================================================
// TRANSACTION-LEVEL SCENARIOS
// =============================================================================

#[test]
fn test_plain_transfer_receipt_and_balances() {
    let recipient = addr(0x44);

    let mut state = JournaledState::new();
    state.set_balance(addr(SENDER), U256::from(10_000_000u64));

    let config = ChainConfig::single(1, ForkSpec::london());
    let ctx = TransactionContext {
        coinbase: addr(0xC0),
        base_fee: U256::from(2),
        ..TransactionContext::default()
    };
    let tx = Transaction {
        nonce: 0,
        gas_price: U256::from(3),
        gas_limit: 30_000,
        to: Some(recipient),
        value: U256::from(1_234),
        data: Bytes::new(),
    };

    let mut executor = TransactionExecutor::new(&mut state, &config, ctx);
    let receipt = executor.execute(addr(SENDER), &tx).unwrap();

    assert!(receipt.success);
    assert_eq!(receipt.gas_used, 21_000);
    assert!(receipt.logs.is_empty());
    assert_eq!(receipt.contract_address, None);

    assert_eq!(state.get_balance(recipient), U256::from(1_234));
    // Sender paid value plus 21000 gas at the full price.
    assert_eq!(
        state.get_balance(addr(SENDER)),
        U256::from(10_000_000u64 - 1_234 - 21_000 * 3)
    );
    // Coinbase earned only the priority fee (price - base fee = 1).
    assert_eq!(state.get_balance(addr(0xC0)), U256::from(21_000));
    assert_eq!(state.get_nonce(addr(SENDER)), 1);
}

#[test]
fn test_creation_transaction_deploys_code() {
    let mut state = JournaledState::new();
    state.set_balance(addr(SENDER), U256::from(100_000_000u64));

    // Init code: CODECOPY the 2-byte runtime tail to memory and return it.
    // Runtime: STOP STOP.
    let mut init = Vec::new();
    init.extend(push1(2)); // len
    init.extend(push1(12)); // code offset of the tail
    init.extend(push1(0)); // dest
    init.push(0x39); // CODECOPY
    init.extend(push1(2));
    init.extend(push1(0));
    init.push(0xF3); // RETURN
    init.extend(vec![0x00, 0x00]); // the runtime code

    let config = ChainConfig::single(1, ForkSpec::shanghai());
    let tx = Transaction {
        nonce: 0,
        gas_price: U256::one(),
        gas_limit: 200_000,
        to: None,
        value: U256::zero(),
        data: Bytes::from_vec(init),
    };

    let mut executor = TransactionExecutor::new(&mut state, &config, TransactionContext::default());
    let receipt = executor.execute(addr(SENDER), &tx).unwrap();

    assert!(receipt.success);
    let deployed = receipt.contract_address.expect("creation receipt");
    assert_eq!(deployed, create_address(addr(SENDER), 0));
    assert_eq!(state.get_code(deployed).as_slice(), &[0x00, 0x00]);
    // EIP-161: the fresh contract starts at nonce 1.
    assert_eq!(state.get_nonce(deployed), 1);
}

#[test]
fn test_reverting_transaction_keeps_output_and_state() {
    let contract = addr(0x77);

    let mut state = JournaledState::new();
    state.set_balance(addr(SENDER), U256::from(10_000_000u64));

    // SSTORE(0, 1) then REVERT with a 4-byte reason from memory.
    let mut code = Vec::new();
    code.extend(push1(1));
    code.extend(push1(0));
    code.push(0x55); // SSTORE
    code.extend(push32({
        let mut w = [0u8; 32];
        w[..4].copy_from_slice(&[0xDE, 0xAD, 0xBE, 0xEF]);
        w
    }));
    code.extend(push1(0));
    code.push(0x52); // MSTORE
    code.extend(push1(4));
    code.extend(push1(0));
    code.push(0xFD); // REVERT
    state.set_code(contract, Bytes::from_vec(code));

    let config = ChainConfig::single(1, ForkSpec::london());
    let tx = Transaction {
        nonce: 0,
        gas_price: U256::zero(),
        gas_limit: 100_000,
        to: Some(contract),
        value: U256::zero(),
        data: Bytes::new(),
    };

    let mut executor = TransactionExecutor::new(&mut state, &config, TransactionContext::default());
    let receipt = executor.execute(addr(SENDER), &tx).unwrap();

    assert!(!receipt.success);
    assert_eq!(receipt.output.as_slice(), &[0xDE, 0xAD, 0xBE, 0xEF]);
    assert!(receipt.logs.is_empty());
    // The SSTORE rolled back, and the revert returned unused gas.
    assert_eq!(state.get_storage(contract, U256::zero()), U256::zero());
    assert!(receipt.gas_used < 100_000);
    assert!(receipt.gas_used > 21_000);
}

#[test]
fn test_invalid_nonce_rejected_before_any_state_change() {
    let mut state = JournaledState::new();
    state.set_balance(addr(SENDER), U256::from(1_000_000u64));

    let config = ChainConfig::single(1, ForkSpec::london());
    let tx = Transaction {
        nonce: 5,
        gas_price: U256::zero(),
        gas_limit: 30_000,
        to: Some(addr(0x01)),
        value: U256::zero(),
        data: Bytes::new(),
    };

    let mut executor = TransactionExecutor::new(&mut state, &config, TransactionContext::default());
    let err = executor.execute(addr(SENDER), &tx).unwrap_err();

    assert!(matches!(err, TxError::InvalidNonce { expected: 0, got: 5 }));
    assert_eq!(state.get_nonce(addr(SENDER)), 0);
    assert_eq!(state.get_balance(addr(SENDER)), U256::from(1_000_000u64));
}

#[test]
fn test_intrinsic_gas_too_low_rejected() {
    let mut state = JournaledState::new();
    state.set_balance(addr(SENDER), U256::from(1_000_000u64));

    let config = ChainConfig::single(1, ForkSpec::london());
    let tx = Transaction {
        nonce: 0,
        gas_price: U256::zero(),
        gas_limit: 20_999,
        to: Some(addr(0x44)),
        value: U256::zero(),
        data: Bytes::new(),
    };

    let mut executor = TransactionExecutor::new(&mut state, &config, TransactionContext::default());
    assert!(matches!(
        executor.execute(addr(SENDER), &tx),
        Err(TxError::IntrinsicGasTooLow { .. })
    ));
}

#[test]
fn test_out_of_gas_transaction_burns_the_limit() {
    let contract = addr(0x88);

    let mut state = JournaledState::new();
    state.set_balance(addr(SENDER), U256::from(100_000_000u64));

    // An infinite loop: JUMPDEST, PUSH1 0, JUMP.
    let code = vec![0x5B, 0x60, 0x00, 0x56];
    state.set_code(contract, Bytes::from_vec(code));

    let config = ChainConfig::single(1, ForkSpec::london());
    let tx = Transaction {
        nonce: 0,
        gas_price: U256::one(),
        gas_limit: 50_000,
        to: Some(contract),
        value: U256::zero(),
        data: Bytes::new(),
    };

    let mut executor = TransactionExecutor::new(&mut state, &config, TransactionContext::default());
    let receipt = executor.execute(addr(SENDER), &tx).unwrap();

    assert!(!receipt.success);
    assert!(receipt.output.is_empty());
    assert_eq!(receipt.gas_used, 50_000);
    assert_eq!(
        state.get_balance(addr(SENDER)),
        U256::from(100_000_000u64 - 50_000)
    );
}

// =============================================================================
// NESTED CALLS AND VALUE FLOW
// =============================================================================

#[test]
fn test_call_with_value_moves_balance_and_grants_stipend() {
    let callee = addr(0x99);

    let mut state = JournaledState::new();
    state.set_balance(addr(TARGET), U256::from(500));
    // Callee does nothing; the stipend is more than enough for STOP.
    state.set_code(callee, Bytes::from_vec(vec![0x00]));

    // CALL(callee, value 200, no data, zero forwarded gas).
    let mut code = Vec::new();
    code.extend(push1(0)); // out_len
    code.extend(push1(0)); // out_off
    code.extend(push1(0)); // in_len
    code.extend(push1(0)); // in_off
    code.extend(vec![0x60, 200]); // value
    code.extend(push20(callee));
    code.extend(push1(0)); // gas: the stipend carries the child
    code.push(0xF1); // CALL
    code.extend(push1(0));
    code.push(0x52); // MSTORE status
    code.extend(push1(0x20));
    code.extend(push1(0));
    code.push(0xF3); // RETURN

    let fork = ForkSpec::tangerine();
    let ctx = TransactionContext::default();
    let result = run_code(&mut state, &fork, &ctx, code, vec![], 100_000);

    assert!(result.is_success());
    assert_eq!(U256::from_big_endian(result.output.as_slice()), U256::one());
    assert_eq!(state.get_balance(callee), U256::from(200));
    assert_eq!(state.get_balance(addr(TARGET)), U256::from(300));
}

#[test]
fn test_insufficient_funds_child_fails_parent_continues() {
    let callee = addr(0x99);

    let mut state = JournaledState::new();
    // The caller has nothing to send.
    state.set_code(callee, Bytes::from_vec(vec![0x00]));

    let mut code = Vec::new();
    code.extend(push1(0));
    code.extend(push1(0));
    code.extend(push1(0));
    code.extend(push1(0));
    code.extend(vec![0x60, 200]); // value the caller does not have
    code.extend(push20(callee));
    code.extend(push1(0));
    code.push(0xF1); // CALL
    code.extend(push1(0));
    code.push(0x52); // MSTORE
    code.extend(push1(0x20));
    code.extend(push1(0));
    code.push(0xF3); // RETURN

    let fork = ForkSpec::tangerine();
    let ctx = TransactionContext::default();
    let result = run_code(&mut state, &fork, &ctx, code, vec![], 100_000);

    // The child failed; the parent saw 0 and carried on to its RETURN.
    assert!(result.is_success());
    assert_eq!(U256::from_big_endian(result.output.as_slice()), U256::zero());
    assert_eq!(state.get_balance(callee), U256::zero());
}

#[test]
fn test_delegatecall_writes_caller_storage() {
    let library = addr(0x4B);

    let mut state = JournaledState::new();
    state.begin_transaction();
    // Library code: SSTORE(1, 77).
    let mut lib_code = Vec::new();
    lib_code.extend(vec![0x60, 77]);
    lib_code.extend(push1(1));
    lib_code.push(0x55); // SSTORE
    lib_code.push(0x00); // STOP
    state.set_code(library, Bytes::from_vec(lib_code));

    // DELEGATECALL(library).
    let mut code = Vec::new();
    code.extend(push1(0)); // out_len
    code.extend(push1(0)); // out_off
    code.extend(push1(0)); // in_len
    code.extend(push1(0)); // in_off
    code.extend(push20(library));
    code.extend(vec![0x61, 0xFF, 0xFF]); // PUSH2 gas
    code.push(0xF4); // DELEGATECALL
    code.push(0x50); // POP
    code.push(0x00); // STOP

    let fork = ForkSpec::istanbul();
    let ctx = TransactionContext::default();
    let result = run_code(&mut state, &fork, &ctx, code, vec![], 200_000);

    assert!(result.is_success());
    // The write landed in the caller's storage, not the library's.
    assert_eq!(state.get_storage(addr(TARGET), U256::one()), U256::from(77));
    assert_eq!(state.get_storage(library, U256::one()), U256::zero());
}

#[test]
fn test_selfdestruct_moves_balance_and_deletes_at_finalization() {
    let contract = addr(0x66);
    let beneficiary = addr(0x67);

    let mut state = JournaledState::new();
    state.set_balance(addr(SENDER), U256::from(10_000_000u64));
    state.set_balance(contract, U256::from(4_000));

    // SELFDESTRUCT(beneficiary).
    let mut code = Vec::new();
    code.extend(push20(beneficiary));
    code.push(0xFF); // SELFDESTRUCT
    state.set_code(contract, Bytes::from_vec(code));

    let config = ChainConfig::single(1, ForkSpec::spurious_dragon());
    let tx = Transaction {
        nonce: 0,
        gas_price: U256::zero(),
        gas_limit: 100_000,
        to: Some(contract),
        value: U256::zero(),
        data: Bytes::new(),
    };

    let mut executor = TransactionExecutor::new(&mut state, &config, TransactionContext::default());
    let receipt = executor.execute(addr(SENDER), &tx).unwrap();

    assert!(receipt.success);
    assert_eq!(state.get_balance(beneficiary), U256::from(4_000));
    assert!(!state.account_exists(contract));
}
