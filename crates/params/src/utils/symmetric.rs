//! Constants for symmetric block ciphers and their backends

/// AES-128 key size in bytes
pub const AES128_KEY_SIZE: usize = 16;

/// AES-192 key size in bytes
pub const AES192_KEY_SIZE: usize = 24;

/// AES-256 key size in bytes
pub const AES256_KEY_SIZE: usize = 32;

/// Every AES key size, ascending
pub const AES_KEY_SIZES: [usize; 3] = [AES128_KEY_SIZE, AES192_KEY_SIZE, AES256_KEY_SIZE];

/// AES block size in bytes
pub const AES_BLOCK_SIZE: usize = 16;

/// Largest block size of any supported cipher
pub const MAX_BLOCK_SIZE: usize = 16;

/// Length of the all-zero key used by capability probes
pub const PROBE_KEY_SIZE: usize = 32;

/// Single-shot limit of offload engines that cannot loop internally
/// (e.g. Marvell CESA for AES: 121 blocks).
///
/// Default answer of `max_chunk_size` for integrators of the
/// `KernelOffload` backend kind that have no better figure for their engine.
pub const OFFLOAD_MAX_CHUNK_SIZE: usize = 1936;
