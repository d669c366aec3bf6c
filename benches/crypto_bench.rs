use criterion::{black_box, criterion_group, criterion_main, Criterion};
use vaultkeep::{core::crypto::hashing::hash_blob, storage::BlobCipher};

fn bench_blob_cipher(c: &mut Criterion) {
    let cipher = BlobCipher::new();
    let plaintext = b"rats like cheese".repeat(64);
    let blob = cipher.encrypt("ilikerats", 3, &plaintext).unwrap();

    // Both directions are dominated by key derivation.
    let mut group = c.benchmark_group("blob_cipher");
    group.sample_size(10);
    group.bench_function("encrypt_1k", |b| {
        b.iter(|| cipher.encrypt(black_box("ilikerats"), 3, black_box(&plaintext)).unwrap())
    });
    group.bench_function("decrypt_1k", |b| {
        b.iter(|| cipher.decrypt(black_box("ilikerats"), 3, black_box(&blob)).unwrap())
    });
    group.bench_function("reject_wrong_password", |b| {
        b.iter(|| cipher.decrypt(black_box("ilikemice"), 3, black_box(&blob)).is_err())
    });
    group.finish();

    let large = vec![7u8; 1 << 20];
    c.bench_function("hash_blob_1m", |b| b.iter(|| hash_blob(black_box(&large))));
}

criterion_group!(crypto_benches, bench_blob_cipher);
criterion_main!(crypto_benches);
