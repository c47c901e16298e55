//! Constant-time operations to prevent timing attacks

use subtle::{Choice, ConstantTimeEq, ConstantTimeGreater, ConstantTimeLess};

/// XOR `src` into `dst` byte by byte
///
/// # Panics
/// If the slices differ in length.
pub fn ct_xor_into(dst: &mut [u8], src: &[u8]) {
    assert_eq!(dst.len(), src.len());
    for (d, s) in dst.iter_mut().zip(src) {
        *d ^= *s;
    }
}

/// Choice set when `lo <= x <= hi`
pub fn ct_in_range(x: u8, lo: u8, hi: u8) -> Choice {
    !x.ct_lt(&lo) & !x.ct_gt(&hi)
}

/// Choice set when every byte in the last `len` positions of `block`,
/// excluding the final byte itself, equals `expected`.
///
/// Every byte of the block is inspected whatever `len` is, so the running
/// time depends only on the block length. Blocks longer than 255 bytes are
/// not supported.
pub fn ct_suffix_eq(block: &[u8], len: u8, expected: u8) -> Choice {
    debug_assert!(block.len() <= u8::MAX as usize);
    let n = block.len();
    let mut ok = Choice::from(1u8);

    for (i, byte) in block.iter().enumerate().take(n.saturating_sub(1)) {
        // 1 for the final byte, 2 for the one before it, ...
        let distance = (n - i) as u8;
        let covered = !distance.ct_gt(&len);
        ok &= !covered | byte.ct_eq(&expected);
    }

    ok
}
