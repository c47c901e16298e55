//! Chunking invariance: the same message gives the same ciphertext however
//! it is split across update calls and backend chunk limits

use proptest::prelude::*;

use cryptsel_symmetric::{
    BackendCandidate, BackendKind, BlockAlgorithm, BlockTransform, CipherMode, PaddingMode,
    RegistryBuilder, TransformParams,
};
use cryptsel_params::utils::symmetric::OFFLOAD_MAX_CHUNK_SIZE;
use cryptsel_tests::mock::MockBackend;
use cryptsel_tests::{message, software_registry};

const BS: usize = 16;

/// Feed `data` through `t` in pieces of the given block counts, then
/// finalize with whatever is left
fn drive(t: &mut BlockTransform, data: &[u8], splits: &[usize]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut rest = data;
    for &blocks in splits {
        let take = (blocks * BS).min(rest.len() - rest.len() % BS);
        let (now, later) = rest.split_at(take);
        out.extend(t.update(now).unwrap());
        rest = later;
    }
    out.extend(t.finalize(rest).unwrap());
    out
}

fn one_shot(p: &TransformParams<'_>, data: &[u8]) -> Vec<u8> {
    software_registry().encryptor(p).unwrap().finalize(data).unwrap()
}

proptest! {
    #[test]
    fn test_cbc_split_updates_match_one_shot(
        key in any::<[u8; 16]>(),
        iv in any::<[u8; 16]>(),
        data in prop::collection::vec(any::<u8>(), 0..400),
        splits in prop::collection::vec(0usize..5, 0..8),
    ) {
        let p = TransformParams::new(BlockAlgorithm::Aes, &key).iv(&iv);
        let registry = software_registry();

        let expected = one_shot(&p, &data);
        let mut enc = registry.encryptor(&p).unwrap();
        let split = drive(&mut enc, &data, &splits);
        prop_assert_eq!(&split, &expected);

        let mut dec = registry.decryptor(&p).unwrap();
        let plain = drive(&mut dec, &expected, &splits);
        prop_assert_eq!(plain, data);
    }

    #[test]
    fn test_padding_round_trip_any_length(
        key in any::<[u8; 32]>(),
        data in prop::collection::vec(any::<u8>(), 0..200),
        padding in prop_oneof![
            Just(PaddingMode::Pkcs7),
            Just(PaddingMode::AnsiX923),
            Just(PaddingMode::Iso10126),
        ],
        mode in prop_oneof![Just(CipherMode::Cbc), Just(CipherMode::Ecb)],
    ) {
        let iv = [7u8; 16];
        let p = TransformParams::new(BlockAlgorithm::Aes, &key)
            .iv(&iv)
            .mode(mode)
            .padding(padding);
        let registry = software_registry();

        let c = registry.encryptor(&p).unwrap().finalize(&data).unwrap();
        prop_assert_eq!(c.len(), (data.len() / BS + 1) * BS);
        let m = registry.decryptor(&p).unwrap().finalize(&c).unwrap();
        prop_assert_eq!(m, data);
    }

    #[test]
    fn test_backend_chunk_limit_is_invisible(
        limit_blocks in 1usize..8,
        data in prop::collection::vec(any::<u8>(), 0..300),
    ) {
        let key = [0x3Cu8; 24];
        let iv = [0xC3u8; 16];
        let p = TransformParams::new(BlockAlgorithm::Aes, &key).iv(&iv);

        let offload = MockBackend::new(BackendKind::KernelOffload).with_max_chunk(limit_blocks * BS + 3);
        let counters = offload.counters();
        let registry = RegistryBuilder::new()
            .register(BackendCandidate::new(BlockAlgorithm::Aes, offload))
            .unwrap()
            .build();

        let c = registry.encryptor(&p).unwrap().finalize(&data).unwrap();
        prop_assert_eq!(&c, &one_shot(&p, &data));
        let m = registry.decryptor(&p).unwrap().finalize(&c).unwrap();
        prop_assert_eq!(m, data);

        for len in counters.chunks() {
            prop_assert!(len <= limit_blocks * BS);
            prop_assert_eq!(len % BS, 0);
        }
    }
}

#[test]
fn test_offload_limit_splits_large_messages() {
    let key = [1u8; 16];
    let iv = [2u8; 16];
    let p = TransformParams::new(BlockAlgorithm::Aes, &key).iv(&iv);
    let offload = MockBackend::new(BackendKind::KernelOffload).with_max_chunk(OFFLOAD_MAX_CHUNK_SIZE);
    let counters = offload.counters();
    let registry = RegistryBuilder::new()
        .register(BackendCandidate::new(BlockAlgorithm::Aes, offload))
        .unwrap()
        .build();

    let data = message(10_000);
    let c = registry.encryptor(&p).unwrap().finalize(&data).unwrap();
    assert_eq!(c, one_shot(&p, &data));

    let chunks = counters.chunks();
    assert_eq!(chunks.iter().sum::<usize>(), c.len());
    assert!(chunks.iter().all(|&len| len <= OFFLOAD_MAX_CHUNK_SIZE));
    assert_eq!(chunks[0], OFFLOAD_MAX_CHUNK_SIZE);
}
