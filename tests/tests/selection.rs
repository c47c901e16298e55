//! Backend selection across threads, probe failures and session lifetimes

use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use cryptsel_symmetric::{
    AlgorithmId, BackendCandidate, BackendKind, BlockAlgorithm, CipherMode, Error, PaddingMode,
    Registry, RegistryBuilder, SelectorConfig, TransformParams, TransformState,
};
use cryptsel_tests::mock::{MockBackend, ProbeBehavior, MOCK_IO_ERROR};
use cryptsel_tests::{message, software_registry};

const KEY: [u8; 16] = [0x42; 16];
const IV: [u8; 16] = [0x24; 16];

fn params() -> TransformParams<'static> {
    TransformParams::new(BlockAlgorithm::Aes, &KEY).iv(&IV)
}

fn single(backend: MockBackend) -> Registry {
    RegistryBuilder::new()
        .register(BackendCandidate::new(BlockAlgorithm::Aes, backend))
        .unwrap()
        .build()
}

#[test]
fn test_concurrent_first_use_probes_once() {
    const THREADS: usize = 12;
    let device = MockBackend::new(BackendKind::KernelDevice)
        .with_probe_delay(Duration::from_millis(50));
    let counters = device.counters();
    let registry = Arc::new(single(device));
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let registry = registry.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                let mut t = registry.encryptor(&params()).unwrap();
                (t.backend(), t.finalize(&message(40)).unwrap())
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(counters.probes(), 1);
    assert_eq!(counters.opens(), THREADS);
    assert!(results.iter().all(|(kind, _)| *kind == BackendKind::KernelDevice));
    assert!(results.windows(2).all(|w| w[0].1 == w[1].1));
}

#[test]
fn test_panicking_probe_means_unavailable() {
    let device = MockBackend::new(BackendKind::KernelDevice).with_probe(ProbeBehavior::Panic);
    let counters = device.counters();
    let registry = single(device);

    let resolution = registry.resolve(BlockAlgorithm::Aes, CipherMode::Cbc);
    assert!(resolution.is_fallback());
    assert_eq!(
        registry.availability(
            AlgorithmId::new(BlockAlgorithm::Aes, CipherMode::Cbc),
            BackendKind::KernelDevice
        ),
        Some(false)
    );

    // a second mode reprobes, the same mode does not
    registry.resolve(BlockAlgorithm::Aes, CipherMode::Cbc);
    registry.resolve(BlockAlgorithm::Aes, CipherMode::Ecb);
    assert_eq!(counters.probes(), 2);

    let c = registry.encryptor(&params()).unwrap().finalize(b"still works").unwrap();
    assert_eq!(c.len(), 16);
}

#[test]
fn test_failing_probe_falls_through_to_next_candidate() {
    let device = MockBackend::new(BackendKind::KernelDevice).with_probe(ProbeBehavior::Fail);
    let library = MockBackend::new(BackendKind::NativeLibrary);
    let registry = RegistryBuilder::new()
        .register(BackendCandidate::new(BlockAlgorithm::Aes, device))
        .unwrap()
        .register(BackendCandidate::new(BlockAlgorithm::Aes, library))
        .unwrap()
        .build();

    let t = registry.encryptor(&params()).unwrap();
    assert_eq!(t.backend(), BackendKind::NativeLibrary);
}

#[test]
fn test_dispose_mid_stream_closes_session() {
    let device = MockBackend::new(BackendKind::KernelDevice);
    let counters = device.counters();
    let registry = single(device);

    let mut t = registry.encryptor(&params()).unwrap();
    t.update(&message(64)).unwrap();
    assert_eq!(counters.closes(), 0);
    t.dispose().unwrap();
    assert_eq!(counters.closes(), 1);
}

#[test]
fn test_dropping_a_transform_closes_its_session_once() {
    let device = MockBackend::new(BackendKind::KernelDevice);
    let counters = device.counters();
    let registry = single(device);

    let mut finished = registry.encryptor(&params()).unwrap();
    finished.finalize(b"done").unwrap();
    assert_eq!(counters.closes(), 1);
    drop(finished);
    assert_eq!(counters.closes(), 1);

    let abandoned = registry.decryptor(&params()).unwrap();
    drop(abandoned);
    assert_eq!(counters.closes(), 2);
}

#[test]
fn test_raw_call_failure_surfaces_native_code() {
    let device = MockBackend::new(BackendKind::KernelOffload)
        .with_max_chunk(32)
        .failing_on_call(1);
    let counters = device.counters();
    let registry = single(device);

    let mut t = registry.encryptor(&params()).unwrap();
    let err = t.update(&message(96)).unwrap_err();
    assert!(matches!(
        err,
        Error::BackendOperationFailed {
            backend: BackendKind::KernelOffload,
            code,
        } if code == MOCK_IO_ERROR
    ));
    assert_eq!(t.state(), TransformState::Finalized);
    assert!(matches!(
        t.finalize(&[]),
        Err(Error::AlreadyFinalized { .. })
    ));

    // first chunk went through before the failure, nothing after it
    assert_eq!(counters.chunks(), vec![32]);
    drop(t);
    assert_eq!(counters.closes(), 1);
}

#[test]
fn test_refused_session_falls_back_to_software() {
    let device = MockBackend::new(BackendKind::KernelDevice).with_open_failure();
    let counters = device.counters();
    let registry = single(device);

    let mut t = registry.encryptor(&params()).unwrap();
    assert_eq!(t.backend(), BackendKind::Software);
    let c = t.finalize(&message(20)).unwrap();
    assert_eq!(c, software_registry().encryptor(&params()).unwrap().finalize(&message(20)).unwrap());

    let resolution = registry.resolve(BlockAlgorithm::Aes, CipherMode::Cbc);
    assert_eq!(resolution.kind(), BackendKind::Software);
    assert!(resolution.is_fallback());
    assert_eq!(counters.probes(), 1);
}

#[test]
fn test_refused_session_is_not_retried() {
    let device = MockBackend::new(BackendKind::KernelDevice).with_open_failure();
    let counters = device.counters();
    let registry = single(device);

    for _ in 0..5 {
        let t = registry.encryptor(&params()).unwrap();
        assert_eq!(t.backend(), BackendKind::Software);
    }
    assert_eq!(counters.probes(), 1);
    assert_eq!(counters.opens(), 1);
    assert_eq!(
        registry.availability(
            AlgorithmId::new(BlockAlgorithm::Aes, CipherMode::Cbc),
            BackendKind::KernelDevice
        ),
        Some(false)
    );
}

#[test]
fn test_concurrent_refused_sessions_settle_once() {
    const THREADS: usize = 8;
    let device = MockBackend::new(BackendKind::KernelDevice).with_open_failure();
    let counters = device.counters();
    let registry = Arc::new(single(device));
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let registry = registry.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                registry.encryptor(&params()).unwrap().backend()
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), BackendKind::Software);
    }
    // racing threads may each see the device before it is demoted
    assert!(counters.opens() <= THREADS);
    let before = counters.opens();
    registry.encryptor(&params()).unwrap();
    assert_eq!(counters.opens(), before);
    assert_eq!(counters.probes(), 1);
}

#[test]
fn test_config_from_values_disables_and_caps() {
    let config = SelectorConfig::from_values(Some("kernel-device, kernel-offload"), Some("50")).unwrap();
    let device = MockBackend::new(BackendKind::KernelDevice);
    let library = MockBackend::new(BackendKind::NativeLibrary);
    let device_counters = device.counters();
    let library_counters = library.counters();

    let registry = RegistryBuilder::new()
        .config(config)
        .register(BackendCandidate::new(BlockAlgorithm::Aes, device))
        .unwrap()
        .register(BackendCandidate::new(BlockAlgorithm::Aes, library))
        .unwrap()
        .build();

    let mut t = registry
        .encryptor(&params().padding(PaddingMode::None))
        .unwrap();
    assert_eq!(t.backend(), BackendKind::NativeLibrary);
    assert_eq!(t.max_chunk_size(), 48);
    t.finalize(&message(128)).unwrap();

    assert_eq!(device_counters.probes(), 0);
    assert_eq!(library_counters.chunks(), vec![48, 48, 32]);
}

#[test]
fn test_config_rejects_bad_values() {
    assert!(SelectorConfig::from_values(Some("software"), None).is_err());
    assert!(SelectorConfig::from_values(Some("quantum"), None).is_err());
    assert!(SelectorConfig::from_values(None, Some("0")).is_err());
    assert!(SelectorConfig::from_values(None, Some("lots")).is_err());
    assert_eq!(
        SelectorConfig::from_values(None, None).unwrap(),
        SelectorConfig::default()
    );
}
