//! Identifiers shared by transforms, backends and the selector

use core::fmt;
use core::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use params::utils::symmetric::{AES_BLOCK_SIZE, AES_KEY_SIZES};

/// Operation direction a session is bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Direction {
    Encrypt,
    Decrypt,
}

impl Direction {
    pub fn is_encrypt(self) -> bool {
        matches!(self, Direction::Encrypt)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Encrypt => f.write_str("encrypt"),
            Direction::Decrypt => f.write_str("decrypt"),
        }
    }
}

/// Block chaining mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CipherMode {
    /// Cipher block chaining, carries an IV between blocks
    #[default]
    Cbc,
    /// Electronic codebook, every block independent
    Ecb,
}

impl CipherMode {
    /// Whether the mode carries a chain value between blocks
    pub fn is_chained(self) -> bool {
        matches!(self, CipherMode::Cbc)
    }
}

impl fmt::Display for CipherMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CipherMode::Cbc => f.write_str("CBC"),
            CipherMode::Ecb => f.write_str("ECB"),
        }
    }
}

/// Padding applied to (or removed from) the final block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PaddingMode {
    /// No padding, input must be block aligned
    None,
    /// Zero fill up to the block boundary, never removed on decrypt
    Zeros,
    /// Every pad byte holds the pad length
    #[default]
    Pkcs7,
    /// Zero bytes followed by the pad length
    AnsiX923,
    /// Random bytes followed by the pad length
    Iso10126,
}

impl PaddingMode {
    /// Strict modes always add a padding block and strip it again on decrypt
    pub fn is_strict(self) -> bool {
        !matches!(self, PaddingMode::None | PaddingMode::Zeros)
    }
}

impl fmt::Display for PaddingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PaddingMode::None => "None",
            PaddingMode::Zeros => "Zeros",
            PaddingMode::Pkcs7 => "PKCS7",
            PaddingMode::AnsiX923 => "ANSIX923",
            PaddingMode::Iso10126 => "ISO10126",
        };
        f.write_str(name)
    }
}

/// Block cipher family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[non_exhaustive]
pub enum BlockAlgorithm {
    Aes,
}

impl BlockAlgorithm {
    /// Resolve a caller-facing algorithm name.
    ///
    /// `AES`, `Rijndael` and `AesManaged` all name the AES family; matching
    /// ignores ASCII case.
    pub fn from_name(name: &str) -> Result<Self> {
        let name = name.trim();
        if ["aes", "rijndael", "aesmanaged"]
            .iter()
            .any(|known| name.eq_ignore_ascii_case(known))
        {
            return Ok(BlockAlgorithm::Aes);
        }
        Err(Error::param("algorithm name", format!("unknown block cipher '{}'", name)))
    }

    pub fn name(self) -> &'static str {
        match self {
            BlockAlgorithm::Aes => "AES",
        }
    }

    pub fn block_size(self) -> usize {
        match self {
            BlockAlgorithm::Aes => AES_BLOCK_SIZE,
        }
    }

    /// Supported key lengths in bytes, ascending
    pub fn key_sizes(self) -> &'static [usize] {
        match self {
            BlockAlgorithm::Aes => &AES_KEY_SIZES,
        }
    }

    pub fn is_valid_key_len(self, len: usize) -> bool {
        self.key_sizes().contains(&len)
    }

    /// Largest supported key length, used for capability probes
    pub fn max_key_size(self) -> usize {
        self.key_sizes().iter().copied().max().unwrap_or(0)
    }
}

impl fmt::Display for BlockAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BlockAlgorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s)
    }
}

/// An (algorithm, mode) pair; the unit of capability probing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AlgorithmId {
    pub algorithm: BlockAlgorithm,
    pub mode: CipherMode,
}

impl AlgorithmId {
    pub const fn new(algorithm: BlockAlgorithm, mode: CipherMode) -> Self {
        Self { algorithm, mode }
    }

    pub fn block_size(&self) -> usize {
        self.algorithm.block_size()
    }
}

impl fmt::Display for AlgorithmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.algorithm, self.mode)
    }
}

/// Kind of raw block cipher backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum BackendKind {
    /// Kernel crypto device (cryptodev style session ioctls)
    KernelDevice,
    /// Hardware offload variant of the kernel device, usually chunk limited
    KernelOffload,
    /// Native cryptography library
    NativeLibrary,
    /// Pure software fallback, always available
    Software,
}

impl BackendKind {
    pub fn as_str(self) -> &'static str {
        match self {
            BackendKind::KernelDevice => "kernel-device",
            BackendKind::KernelOffload => "kernel-offload",
            BackendKind::NativeLibrary => "native-library",
            BackendKind::Software => "software",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "kernel-device" => Ok(BackendKind::KernelDevice),
            "kernel-offload" => Ok(BackendKind::KernelOffload),
            "native-library" => Ok(BackendKind::NativeLibrary),
            "software" => Ok(BackendKind::Software),
            other => Err(Error::param(
                "backend kind",
                format!("unknown backend kind '{}'", other),
            )),
        }
    }
}

/// Error code reported by a backend's native call (errno, library code, ...)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NativeCode(pub i32);

impl NativeCode {
    /// `EINVAL`, reported by in-process backends for malformed requests
    pub const INVALID_ARGUMENT: NativeCode = NativeCode(-22);

    /// `EBADF`, reported for calls on a session that was already closed
    pub const BAD_DESCRIPTOR: NativeCode = NativeCode(-9);
}

impl fmt::Display for NativeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "native error code {}", self.0)
    }
}
