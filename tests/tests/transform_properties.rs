//! End-to-end behavior of transforms built through the registry

use cryptsel_symmetric::{
    BlockAlgorithm, CipherMode, Error, PaddingMode, TransformParams, TransformState,
};
use cryptsel_tests::{message, software_registry, ALL_PADDINGS, STRICT_PADDINGS};

const BS: usize = 16;
const KEY: [u8; 16] = [0x0F; 16];
const IV: [u8; 16] = [0xA5; 16];

fn params(mode: CipherMode, padding: PaddingMode) -> TransformParams<'static> {
    TransformParams::new(BlockAlgorithm::Aes, &KEY)
        .iv(&IV)
        .mode(mode)
        .padding(padding)
}

fn seal(p: &TransformParams<'_>, data: &[u8]) -> cryptsel_symmetric::Result<Vec<u8>> {
    software_registry().encryptor(p)?.finalize(data)
}

fn open(p: &TransformParams<'_>, data: &[u8]) -> cryptsel_symmetric::Result<Vec<u8>> {
    software_registry().decryptor(p)?.finalize(data)
}

#[test]
fn test_round_trip_at_block_boundaries() {
    for padding in STRICT_PADDINGS {
        for mode in [CipherMode::Cbc, CipherMode::Ecb] {
            let p = params(mode, padding);
            for len in [0, BS - 1, BS, 3 * BS + 1] {
                let m = message(len);
                let c = seal(&p, &m).unwrap();
                assert_eq!(c.len() % BS, 0);
                assert!(c.len() > m.len());
                assert_eq!(open(&p, &c).unwrap(), m, "{padding} {mode} len {len}");
            }
        }
    }
}

#[test]
fn test_zeros_round_trip_keeps_fill() {
    let p = params(CipherMode::Cbc, PaddingMode::Zeros);
    for len in [0, BS - 1, BS, 3 * BS + 1] {
        let m = message(len);
        let c = seal(&p, &m).unwrap();
        assert_eq!(c.len(), (len + BS - 1) / BS * BS);

        let mut expected = m.clone();
        expected.resize(c.len(), 0);
        assert_eq!(open(&p, &c).unwrap(), expected);
    }
}

#[test]
fn test_none_padding_needs_whole_blocks() {
    let p = params(CipherMode::Cbc, PaddingMode::None);
    for len in [1, BS - 1, BS + 1, 3 * BS + 1] {
        assert!(matches!(
            seal(&p, &message(len)),
            Err(Error::InvalidBlockLength { .. })
        ));
    }
    for len in [0, BS, 4 * BS] {
        let m = message(len);
        let c = seal(&p, &m).unwrap();
        assert_eq!(c.len(), len);
        assert_eq!(open(&p, &c).unwrap(), m);
    }
}

#[test]
fn test_one_block_ciphertext_sizes() {
    for padding in [PaddingMode::Pkcs7, PaddingMode::AnsiX923] {
        let c = seal(&params(CipherMode::Cbc, padding), &message(BS)).unwrap();
        assert_eq!(c.len(), 2 * BS);
    }
    let c = seal(&params(CipherMode::Cbc, PaddingMode::Zeros), &message(BS)).unwrap();
    assert_eq!(c.len(), BS);
}

#[test]
fn test_flipped_padding_bytes_are_detected() {
    // CBC: flipping byte i of the second to last ciphertext block flips
    // byte i of the last plaintext block
    for padding in [PaddingMode::Pkcs7, PaddingMode::AnsiX923] {
        let p = params(CipherMode::Cbc, padding);
        let m = message(2 * BS + 5);
        let c = seal(&p, &m).unwrap();
        let pad_len = BS - 5;
        let prev = c.len() - 2 * BS;

        for offset in (BS - pad_len)..BS {
            for bit in [0x10u8, 0x80] {
                let mut tampered = c.clone();
                tampered[prev + offset] ^= bit;
                assert!(
                    matches!(open(&p, &tampered), Err(Error::BadPadding { .. })),
                    "{padding} offset {offset} bit {bit:#x}"
                );
            }
        }
    }
}

#[test]
fn test_iso10126_detects_only_length_byte_damage() {
    let p = params(CipherMode::Cbc, PaddingMode::Iso10126);
    let m = message(BS + 3);
    let c = seal(&p, &m).unwrap();
    let prev = c.len() - 2 * BS;

    // random fill is not checked
    let mut interior = c.clone();
    interior[prev + 5] ^= 0xFF;
    assert_eq!(open(&p, &interior).unwrap().len(), m.len());

    // a length byte above the block size is
    let mut length = c.clone();
    length[prev + BS - 1] ^= 0x80;
    assert!(matches!(open(&p, &length), Err(Error::BadPadding { .. })));
}

#[test]
fn test_fips197_ecb_known_answer_through_registry() {
    let key = hex::decode("2b7e151628aed2a6abf7158809cf4f3c").unwrap();
    let zero_iv = [0u8; 16];
    let p = TransformParams::by_name("AES", &key)
        .unwrap()
        .mode(CipherMode::Ecb)
        .padding(PaddingMode::None)
        .iv(&zero_iv);

    let c = seal(&p, &hex::decode("3243f6a8885a308d313198a2e0370734").unwrap()).unwrap();
    assert_eq!(hex::encode(c), "3925841d02dc09fbdc118597196a0b32");
}

#[test]
fn test_every_padding_rejects_misaligned_updates() {
    let registry = software_registry();
    for padding in ALL_PADDINGS {
        let mut t = registry.encryptor(&params(CipherMode::Cbc, padding)).unwrap();
        assert!(matches!(
            t.update(&message(BS + 1)),
            Err(Error::InvalidBlockLength { .. })
        ));
        assert_eq!(t.state(), TransformState::Idle);
    }
}

#[test]
fn test_random_iv_is_reported() {
    let registry = software_registry();
    let p = TransformParams::new(BlockAlgorithm::Aes, &KEY);
    let mut enc = registry.encryptor(&p).unwrap();
    let iv = enc.initial_iv().unwrap().to_vec();
    let c = enc.finalize(b"generated iv").unwrap();

    let p = p.iv(&iv);
    assert_eq!(open(&p, &c).unwrap(), b"generated iv");
}
