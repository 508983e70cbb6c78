//! Seed derivation for independent RNG streams.

/// One step of the SplitMix64 output function.
///
/// Bijective on `u64`, so distinct inputs never collide.
#[inline]
pub fn splitmix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Derives the seed for stream `stream` from a base seed.
///
/// Used to give each parallel sampling chunk its own generator:
///
/// ```rust
/// use sim_core::rng::derive_seed;
///
/// let seeds: Vec<u64> = (0..4).map(|i| derive_seed(42, i)).collect();
/// assert_eq!(seeds, (0..4).map(|i| derive_seed(42, i)).collect::<Vec<_>>());
/// assert_ne!(seeds[0], seeds[1]);
/// ```
#[inline]
pub fn derive_seed(base_seed: u64, stream: u64) -> u64 {
    splitmix64(splitmix64(base_seed) ^ stream.wrapping_mul(0xD1B5_4A32_D192_ED03))
}
