//! Testing utilities and benchmarks for cryptsel
//!
//! [`mock`] provides backends that wrap the software implementation and
//! record what the core asks of them.


use cryptsel_symmetric::{PaddingMode, Registry};

/// Every padding mode, strict ones last
pub const ALL_PADDINGS: [PaddingMode; 5] = [
    PaddingMode::None,
    PaddingMode::Zeros,
    PaddingMode::Pkcs7,
    PaddingMode::AnsiX923,
    PaddingMode::Iso10126,
];

/// Padding modes that always add and strip a padding block
pub const STRICT_PADDINGS: [PaddingMode; 3] = [
    PaddingMode::Pkcs7,
    PaddingMode::AnsiX923,
    PaddingMode::Iso10126,
];

/// Deterministic test message of `len` bytes
pub fn message(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 7 + 3) as u8).collect()
}

/// Registry holding only the software backend
pub fn software_registry() -> Registry {
    Registry::default()
}
