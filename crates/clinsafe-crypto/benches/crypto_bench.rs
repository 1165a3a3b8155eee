// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for AEAD sealing, integrity hashing, and the secure
// object store in the clinsafe-crypto crate.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use clinsafe_crypto::{
    AeadProvider, DerivedKeyProvider, GcmProvider, KeyManager, MemorySecretStore,
    SecureObjectStore, sha256_hex,
};

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

/// Benchmark a full seal-then-open round trip on a 10 KiB payload, for both
/// the native GCM path and the derived-keystream fallback.
fn bench_seal_open_roundtrip(c: &mut Criterion) {
    let key = [0x42u8; 32];
    let plaintext = vec![0x42u8; 10 * 1024]; // 10 KiB

    let providers: [(&str, Box<dyn AeadProvider>); 2] = [
        ("gcm_v2", Box::new(GcmProvider)),
        ("derived_v1", Box::new(DerivedKeyProvider)),
    ];

    let mut group = c.benchmark_group("seal_open_roundtrip (10 KiB)");
    for (label, provider) in providers {
        group.bench_function(label, |b| {
            b.iter(|| {
                let payload = provider.seal(&key, black_box(&plaintext)).expect("seal failed");
                let opened = provider.open(&key, &payload).expect("open failed");
                assert_eq!(opened.len(), plaintext.len());
                black_box(opened);
            });
        });
    }
    group.finish();
}

/// Benchmark SHA-256 hashing at various artifact sizes.
///
/// Sizes: 1 KiB, 10 KiB, 100 KiB, 1 MiB -- covering the range from condition
/// lists to full biometric capture artifacts.
fn bench_integrity_hash(c: &mut Criterion) {
    let sizes: &[(&str, usize)] = &[
        ("1 KiB", 1024),
        ("10 KiB", 10 * 1024),
        ("100 KiB", 100 * 1024),
        ("1 MiB", 1024 * 1024),
    ];

    let mut group = c.benchmark_group("integrity_hash_sha256");
    for &(label, size) in sizes {
        let data = vec![0xABu8; size];
        group.bench_function(label, |b| {
            b.iter(|| {
                let hex = sha256_hex(black_box(&data));
                black_box(hex);
            });
        });
    }
    group.finish();
}

/// Benchmark encrypting a typical health-profile object into its envelope.
fn bench_encrypt_object(c: &mut Criterion) {
    let secrets = MemorySecretStore::new();
    let key = KeyManager::get_or_create(&secrets).expect("key setup failed");
    let store = SecureObjectStore::new(key);

    let profile: Vec<String> = (0..24).map(|i| format!("condition_{i}")).collect();

    c.bench_function("encrypt_object (health profile)", |b| {
        b.iter(|| {
            let envelope = store.encrypt_object(black_box(&profile)).expect("encrypt failed");
            black_box(envelope);
        });
    });
}

criterion_group!(
    benches,
    bench_seal_open_roundtrip,
    bench_integrity_hash,
    bench_encrypt_object,
);
criterion_main!(benches);
