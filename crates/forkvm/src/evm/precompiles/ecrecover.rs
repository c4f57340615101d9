//! # Ecrecover Precompile (0x01)
//!
//! Recovers the signer address from an ECDSA signature over secp256k1.
//!
//! Input, right-padded to 128 bytes:
//! - bytes 0..32: message hash
//! - bytes 32..64: v (27 or 28, big-endian)
//! - bytes 64..96: r
//! - bytes 96..128: s
//!
//! Every validation failure consumes the gas and returns empty output;
//! the caller still sees a successful call.

use super::{Precompile, PrecompileOutput};
use crate::domain::services::address_from_pubkey;
use crate::domain::value_objects::U256;
use crate::errors::PrecompileError;
use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use k256::elliptic_curve::sec1::ToEncodedPoint;

/// Fixed gas cost.
const ECRECOVER_GAS: u64 = 3000;

/// secp256k1 curve order n.
const SECP256K1_ORDER: [u8; 32] = [
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFE,
    0xBA, 0xAE, 0xDC, 0xE6, 0xAF, 0x48, 0xA0, 0x3B, 0xBF, 0xD2, 0x5E, 0x8C, 0xD0, 0x36, 0x41, 0x41,
];

/// The ecrecover precompile.
pub struct EcRecover;

impl Precompile for EcRecover {
    fn execute(&self, input: &[u8], gas_limit: u64) -> Result<PrecompileOutput, PrecompileError> {
        if ECRECOVER_GAS > gas_limit {
            return Err(PrecompileError::OutOfGas);
        }

        let mut padded = [0u8; 128];
        let len = input.len().min(128);
        padded[..len].copy_from_slice(&input[..len]);

        let hash = &padded[0..32];
        let v = &padded[32..64];
        let r = &padded[64..96];
        let s = &padded[96..128];

        // v must be exactly 27 or 28.
        if v[..31] != [0u8; 31] || !(v[31] == 27 || v[31] == 28) {
            return Ok(PrecompileOutput::empty(ECRECOVER_GAS));
        }

        // 0 < r < n, 0 < s < n.
        let order = U256::from_big_endian(&SECP256K1_ORDER);
        let r_scalar = U256::from_big_endian(r);
        let s_scalar = U256::from_big_endian(s);
        if r_scalar.is_zero() || r_scalar >= order || s_scalar.is_zero() || s_scalar >= order {
            return Ok(PrecompileOutput::empty(ECRECOVER_GAS));
        }

        match recover(hash, r, s, v[31] - 27) {
            Some(address) => {
                let mut output = vec![0u8; 32];
                output[12..].copy_from_slice(&address);
                Ok(PrecompileOutput::new(ECRECOVER_GAS, output))
            }
            None => Ok(PrecompileOutput::empty(ECRECOVER_GAS)),
        }
    }
}

/// Public-key recovery; None for anything the curve rejects.
fn recover(hash: &[u8], r: &[u8], s: &[u8], recovery_id: u8) -> Option<[u8; 20]> {
    let mut rs = [0u8; 64];
    rs[..32].copy_from_slice(r);
    rs[32..].copy_from_slice(s);

    let mut signature = Signature::from_slice(&rs).ok()?;
    let mut recovery_id = recovery_id;

    // The recovery routine wants a low-s signature; flipping s flips the
    // recovered point's parity.
    if let Some(normalized) = signature.normalize_s() {
        signature = normalized;
        recovery_id ^= 1;
    }

    let recovery_id = RecoveryId::from_byte(recovery_id)?;
    let key = VerifyingKey::recover_from_prehash(hash, &signature, recovery_id).ok()?;

    // Uncompressed point without the 0x04 tag is the 64-byte public key.
    let point = key.to_encoded_point(false);
    Some(*address_from_pubkey(&point.as_bytes()[1..]).as_bytes())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn run(input: &[u8]) -> Vec<u8> {
        EcRecover
            .execute(input, ECRECOVER_GAS)
            .unwrap()
            .output
            .into_vec()
    }

    #[test]
    fn test_ecrecover_known_signature() {
        let input = hex::decode(
            "47173285a8d7341e5e972fc677286384f802f8ef42a5ec5f03bbfa254cb01fad\
             000000000000000000000000000000000000000000000000000000000000001b\
             650acf9d3f5f0a2c799776a1254355d5f4061762a237396a99a0e0e3fc2bcd67\
             29514a0dacb2e623ac4abd157cb18163ff942280db4d5caad66ddf941ba12e03",
        )
        .unwrap();
        let expected =
            hex::decode("000000000000000000000000c08b5542d177ac6686946920409741463a15dddb")
                .unwrap();
        assert_eq!(run(&input), expected);
    }

    #[test]
    fn test_ecrecover_v28() {
        let input = hex::decode(
            "18c547e4f7b0f325ad1e56f57e26c745b09a3e503d86e00e5255ff7f715d3d1c\
             000000000000000000000000000000000000000000000000000000000000001c\
             73b1693892219d736caba55bdb67216e485557ea6b6af75f37096c9aa6a5a75f\
             eeb940b1d03b21e36b0e47e79769f095fe2ab855bd91e3a38756b7d75a9c4549",
        )
        .unwrap();
        let expected =
            hex::decode("000000000000000000000000a94f5374fce5edbc8e2a8697c15331677e6ebf0b")
                .unwrap();
        assert_eq!(run(&input), expected);
    }

    #[test]
    fn test_ecrecover_bad_v_returns_empty() {
        let mut input = hex::decode(
            "47173285a8d7341e5e972fc677286384f802f8ef42a5ec5f03bbfa254cb01fad\
             000000000000000000000000000000000000000000000000000000000000001b\
             650acf9d3f5f0a2c799776a1254355d5f4061762a237396a99a0e0e3fc2bcd67\
             29514a0dacb2e623ac4abd157cb18163ff942280db4d5caad66ddf941ba12e03",
        )
        .unwrap();
        input[63] = 29;

        let out = EcRecover.execute(&input, ECRECOVER_GAS).unwrap();
        // The gas is consumed even though nothing is recovered.
        assert_eq!(out.gas_used, ECRECOVER_GAS);
        assert!(out.output.is_empty());
    }

    #[test]
    fn test_ecrecover_v_with_high_bytes_returns_empty() {
        let mut input = vec![0u8; 128];
        input[32] = 1; // garbage in the high bytes of v
        input[63] = 27;
        input[95] = 1;
        input[127] = 1;
        assert!(run(&input).is_empty());
    }

    #[test]
    fn test_ecrecover_zero_r_or_s_returns_empty() {
        let mut input = vec![0u8; 128];
        input[63] = 27;
        // r = 0, s = 1
        input[127] = 1;
        assert!(run(&input).is_empty());

        // r = 1, s = 0
        let mut input = vec![0u8; 128];
        input[63] = 27;
        input[95] = 1;
        assert!(run(&input).is_empty());
    }

    #[test]
    fn test_ecrecover_out_of_range_s_returns_empty() {
        let mut input = vec![0u8; 128];
        input[63] = 27;
        input[95] = 1;
        // s = 0xffff...ff, beyond the curve order.
        for byte in &mut input[96..128] {
            *byte = 0xFF;
        }
        assert!(run(&input).is_empty());
    }

    #[test]
    fn test_ecrecover_short_input_is_padded() {
        // Truncated input acts as if right-padded with zeros: v becomes 0,
        // which fails validation softly.
        let out = EcRecover.execute(&[0x11; 40], ECRECOVER_GAS).unwrap();
        assert!(out.output.is_empty());
    }

    #[test]
    fn test_ecrecover_out_of_gas() {
        assert!(matches!(
            EcRecover.execute(&[], 2_999),
            Err(PrecompileError::OutOfGas)
        ));
    }
}
