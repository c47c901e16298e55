//! Padding engine
//!
//! Padding only ever touches the final block of a message. On encrypt,
//! [`pad`] turns the trailing partial block into the block that goes to the
//! cipher last (or reports that no extra block is needed). On decrypt,
//! [`unpad`] checks the last decrypted block and reports how many bytes of
//! the message are data.
//!
//! | Mode     | Extra block when aligned | Fill bytes              |
//! |----------|--------------------------|-------------------------|
//! | None     | no (partial input fails) | none                    |
//! | Zeros    | no                       | `0x00`                  |
//! | PKCS7    | yes                      | pad length              |
//! | ANSIX923 | yes                      | `0x00`, then pad length |
//! | ISO10126 | yes                      | random, then pad length |
//!
//! Verification for the strict modes runs over the whole block with
//! constant-time masks and fails with a detail-free [`Error::BadPadding`].

use rand::{CryptoRng, RngCore};
use zeroize::Zeroizing;

use api::error::{Error, Result};
use api::PaddingMode;
use internal::constant_time::{ct_in_range, ct_suffix_eq};

/// Number of bytes [`pad`] adds to a message of `len` bytes
pub fn padding_len(mode: PaddingMode, len: usize, block_size: usize) -> Result<usize> {
    let rem = len % block_size;
    match mode {
        PaddingMode::None if rem != 0 => Err(Error::InvalidBlockLength {
            context: "final block without padding",
            block_size,
            actual: len,
        }),
        PaddingMode::None => Ok(0),
        PaddingMode::Zeros if rem == 0 => Ok(0),
        _ => Ok(block_size - rem),
    }
}

/// Build the final block for `tail`, the bytes after the last full block.
///
/// `tail` must be shorter than one block. Returns `None` when the message
/// already ends on a block boundary and the mode adds nothing (`None`,
/// `Zeros`), otherwise the full block to encrypt last.
pub fn pad<R>(
    mode: PaddingMode,
    tail: &[u8],
    block_size: usize,
    rng: &mut R,
) -> Result<Option<Zeroizing<Vec<u8>>>>
where
    R: RngCore + CryptoRng + ?Sized,
{
    if block_size == 0 || block_size > u8::MAX as usize {
        return Err(Error::param("block size", "must be between 1 and 255 bytes"));
    }
    if tail.len() >= block_size {
        return Err(Error::InvalidLength {
            context: "padding tail",
            expected: block_size - 1,
            actual: tail.len(),
        });
    }

    let pad_len = padding_len(mode, tail.len(), block_size)?;
    if pad_len == 0 {
        return Ok(None);
    }

    let mut block = Zeroizing::new(vec![0u8; block_size]);
    block[..tail.len()].copy_from_slice(tail);
    let fill = &mut block[tail.len()..];
    let marker = pad_len as u8;

    match mode {
        PaddingMode::None | PaddingMode::Zeros => {}
        PaddingMode::Pkcs7 => fill.fill(marker),
        PaddingMode::AnsiX923 => {
            if let Some(last) = fill.last_mut() {
                *last = marker;
            }
        }
        PaddingMode::Iso10126 => {
            rng.fill_bytes(fill);
            if let Some(last) = fill.last_mut() {
                *last = marker;
            }
        }
    }

    Ok(Some(block))
}

/// Length of the data in a decrypted message once padding is removed.
///
/// `data` is the complete tail of the decrypted message, at least its last
/// block. `None` and `Zeros` never remove anything. The strict modes need a
/// non-empty, block aligned input and inspect only its last block.
pub fn unpad(mode: PaddingMode, data: &[u8], block_size: usize) -> Result<usize> {
    if !mode.is_strict() {
        return Ok(data.len());
    }
    if data.is_empty() || block_size == 0 || data.len() % block_size != 0 {
        return Err(Error::BadPadding {
            context: "final block missing",
        });
    }
    if block_size > u8::MAX as usize {
        return Err(Error::param("block size", "must be between 1 and 255 bytes"));
    }

    let block = &data[data.len() - block_size..];
    let pad = block[block_size - 1];
    let mut ok = ct_in_range(pad, 1, block_size as u8);

    match mode {
        PaddingMode::Pkcs7 => ok &= ct_suffix_eq(block, pad, pad),
        PaddingMode::AnsiX923 => ok &= ct_suffix_eq(block, pad, 0),
        // interior bytes are arbitrary by definition
        _ => {}
    }

    if bool::from(ok) {
        Ok(data.len() - pad as usize)
    } else {
        Err(Error::BadPadding {
            context: "final block",
        })
    }
}
