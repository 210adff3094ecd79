//! Uniswap V4 pool state, read straight from PoolManager storage.
//!
//! The PoolManager keeps `mapping(PoolId => Pool.State) pools` at slot 6.
//! The first word of `Pool.State` is the packed `Slot0`:
//!
//! ```text
//! bits   0..160  sqrtPriceX96  (uint160)
//! bits 160..184  tick          (int24)
//! bits 184..208  protocolFee   (uint24)
//! bits 208..232  lpFee         (uint24)
//! ```

use alloy_primitives::{keccak256, B256, U256};
use serde::{Deserialize, Serialize};

/// Storage slot of the `pools` mapping in the V4 PoolManager
pub const POOLS_SLOT: u64 = 6;

/// Position of one packed field inside the word
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldLayout {
    pub offset: usize,
    pub width: usize,
    pub signed: bool,
}

impl FieldLayout {
    pub const fn new(offset: usize, width: usize, signed: bool) -> Self {
        Self { offset, width, signed }
    }

    pub fn mask(&self) -> U256 {
        (U256::from(1u64) << self.width) - U256::from(1u64)
    }

    /// Unsigned field value: shift right, then mask
    pub fn extract(&self, word: U256) -> U256 {
        (word >> self.offset) & self.mask()
    }

    /// Field value placed back at its offset (input is masked first)
    #[cfg(test)]
    pub fn place(&self, value: U256) -> U256 {
        (value & self.mask()) << self.offset
    }
}

pub const SQRT_PRICE: FieldLayout = FieldLayout::new(0, 160, false);
pub const TICK: FieldLayout = FieldLayout::new(160, 24, true);
pub const PROTOCOL_FEE: FieldLayout = FieldLayout::new(184, 24, false);
pub const LP_FEE: FieldLayout = FieldLayout::new(208, 24, false);

const TICK_MAX_POSITIVE: u32 = 0x7F_FFFF;
const TICK_MODULUS: i64 = 0x100_0000;

/// Storage key of `pools[pool_id]`: keccak256(abi.encode(poolId, POOLS_SLOT))
pub fn pool_state_slot(pool_id: B256) -> B256 {
    let mut preimage = [0u8; 64];
    preimage[..32].copy_from_slice(pool_id.as_slice());
    preimage[32..].copy_from_slice(&U256::from(POOLS_SLOT).to_be_bytes::<32>());
    keccak256(preimage)
}

/// Reinterpret a raw 24-bit field as twos-complement
pub fn decode_tick(raw: u32) -> i32 {
    let raw = raw & 0xFF_FFFF;
    if raw > TICK_MAX_POSITIVE {
        (raw as i64 - TICK_MODULUS) as i32
    } else {
        raw as i32
    }
}

/// Decoded Slot0 snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolState {
    #[serde(with = "crate::decimal")]
    pub sqrt_price_x96: U256,
    pub tick: i32,
    pub protocol_fee: u32,
    pub lp_fee: u32,
}

impl PoolState {
    /// Decode a packed Slot0 word. Total over every 256-bit input.
    pub fn decode(word: U256) -> Self {
        let raw_tick = TICK.extract(word).to::<u32>();

        Self {
            sqrt_price_x96: SQRT_PRICE.extract(word),
            tick: decode_tick(raw_tick),
            protocol_fee: PROTOCOL_FEE.extract(word).to::<u32>(),
            lp_fee: LP_FEE.extract(word).to::<u32>(),
        }
    }

    /// Pack the four fields back into a word (bits above 232 are zero)
    #[cfg(test)]
    pub fn encode(&self) -> U256 {
        let tick_bits = (self.tick as i64).rem_euclid(TICK_MODULUS) as u64;

        SQRT_PRICE.place(self.sqrt_price_x96)
            | TICK.place(U256::from(tick_bits))
            | PROTOCOL_FEE.place(U256::from(self.protocol_fee))
            | LP_FEE.place(U256::from(self.lp_fee))
    }

    /// A zero price means the pool was never initialized
    pub fn is_initialized(&self) -> bool {
        !self.sqrt_price_x96.is_zero()
    }

    /// Raw token1/token0 price (no decimal adjustment)
    pub fn price(&self) -> f64 {
        let sp: f64 = self.sqrt_price_x96.to_string().parse().unwrap_or(0.0);
        if sp == 0.0 {
            return 0.0;
        }
        (sp / 2_f64.powi(96)).powi(2)
    }

    /// LP fee in percent (fees are in hundredths of a bip)
    pub fn lp_fee_pct(&self) -> f64 {
        self.lp_fee as f64 / 10_000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    /// Bits covered by the four fields
    fn field_bits() -> U256 {
        (U256::from(1u64) << 232) - U256::from(1u64)
    }

    #[test]
    fn test_decode_known_word() {
        // price 2^96 (1.0), tick -1, protocol fee 0, lp fee 3000
        let word = (U256::from(3000u64) << 208)
            | (U256::from(0xFF_FFFFu64) << 160)
            | (U256::from(1u64) << 96);
        let state = PoolState::decode(word);

        assert_eq!(state.sqrt_price_x96, U256::from(1u64) << 96);
        assert_eq!(state.tick, -1);
        assert_eq!(state.protocol_fee, 0);
        assert_eq!(state.lp_fee, 3000);
        assert!((state.price() - 1.0).abs() < 1e-12);
        assert!((state.lp_fee_pct() - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_tick_sign_boundary() {
        assert_eq!(decode_tick(0), 0);
        assert_eq!(decode_tick(0x7F_FFFF), 8_388_607);
        assert_eq!(decode_tick(0x80_0000), -8_388_608);
        assert_eq!(decode_tick(0xFF_FFFF), -1);
        assert_eq!(decode_tick(0x80_0001), 0x80_0001 - 0x100_0000);
    }

    #[test]
    fn test_round_trip_preserves_field_bits() {
        let words = [
            U256::ZERO,
            U256::MAX,
            U256::from_str("0x000000000bb8000000fffc4a0000000000000000000000000000000000000001").unwrap(),
            U256::from_str("0xdeadbeef0000123456abcdef7fffff0123456789abcdef0123456789abcdef01").unwrap(),
            U256::from_str("0x00000000000001f4000064800000000000000000000000000000000000000000").unwrap(),
        ];

        for word in words {
            let decoded = PoolState::decode(word);
            assert_eq!(decoded.encode(), word & field_bits(), "word {:#x}", word);
        }
    }

    #[test]
    fn test_garbage_high_bits_are_ignored() {
        let clean = PoolState {
            sqrt_price_x96: U256::from(79228162514264337593543950336u128),
            tick: -887272,
            protocol_fee: 0,
            lp_fee: 500,
        };
        let dirty = clean.encode() | (U256::from(0xABu64) << 240);
        assert_eq!(PoolState::decode(dirty), clean);
    }

    #[test]
    fn test_pool_slot_is_deterministic() {
        let pool_id = B256::repeat_byte(0x42);
        let a = pool_state_slot(pool_id);
        let b = pool_state_slot(pool_id);
        assert_eq!(a, b);
        assert_ne!(a, pool_state_slot(B256::repeat_byte(0x43)));

        let mut preimage = Vec::with_capacity(64);
        preimage.extend_from_slice(pool_id.as_slice());
        preimage.extend_from_slice(&[0u8; 31]);
        preimage.push(6);
        assert_eq!(a, keccak256(&preimage));
    }

    #[test]
    fn test_uninitialized_pool() {
        let state = PoolState::decode(U256::ZERO);
        assert!(!state.is_initialized());
        assert_eq!(state.price(), 0.0);
    }
}
