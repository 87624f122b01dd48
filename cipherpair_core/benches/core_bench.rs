use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use cipherpair_core::{
    BigUint, BlockCipher, DEFAULT_PRIMALITY_ROUNDS, QuadraticResidueCryptosystem, generate_prime,
    is_probably_prime, seeded_rng,
};

fn bench_key_schedule(c: &mut Criterion) {
    let mut group = c.benchmark_group("block-cipher");
    group.bench_function("key-schedule", |b| {
        b.iter(|| BlockCipher::new(black_box(b"benchmark-session-key")).unwrap())
    });
    group.finish();
}

fn bench_block_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("block-cipher-throughput");
    let cipher = BlockCipher::new(b"benchmark-session-key").unwrap();
    for size in [64usize, 1024, 16 * 1024] {
        let plaintext = vec![0x5Au8; size];
        let ciphertext = cipher.encrypt(&plaintext);
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::new("encrypt", size), &plaintext, |b, data| {
            b.iter(|| cipher.encrypt(black_box(data)))
        });
        group.bench_with_input(BenchmarkId::new("decrypt", size), &ciphertext, |b, data| {
            b.iter(|| cipher.decrypt(black_box(data)).unwrap())
        });
    }
    group.finish();
}

fn bench_primality(c: &mut Criterion) {
    let mut group = c.benchmark_group("primality");
    let mut rng = seeded_rng(b"bench-primality");
    let prime = generate_prime(256, DEFAULT_PRIMALITY_ROUNDS, &mut rng);
    let composite = &prime * BigUint::from(3u8);
    group.bench_function("miller-rabin-256-prime", |b| {
        b.iter(|| is_probably_prime(black_box(&prime), DEFAULT_PRIMALITY_ROUNDS, &mut rng))
    });
    group.bench_function("miller-rabin-258-composite", |b| {
        b.iter(|| is_probably_prime(black_box(&composite), DEFAULT_PRIMALITY_ROUNDS, &mut rng))
    });
    group.finish();
}

fn bench_quadratic(c: &mut Criterion) {
    let mut group = c.benchmark_group("quadratic");
    group.sample_size(10);
    for key_size in [256u64, 512] {
        group.bench_with_input(BenchmarkId::new("keygen", key_size), &key_size, |b, &bits| {
            let mut rng = seeded_rng(b"bench-quadratic-keygen");
            b.iter(|| QuadraticResidueCryptosystem::with_rng(bits, DEFAULT_PRIMALITY_ROUNDS, &mut rng))
        });

        let mut rng = seeded_rng(b"bench-quadratic-key");
        let system =
            QuadraticResidueCryptosystem::with_rng(key_size, DEFAULT_PRIMALITY_ROUNDS, &mut rng)
                .unwrap();
        let message = b"benchmark session key bytes!";
        let ciphertext = system.encrypt(message).unwrap();
        group.bench_with_input(BenchmarkId::new("encrypt", key_size), message, |b, data| {
            b.iter(|| system.encrypt(black_box(data)).unwrap())
        });
        group.bench_with_input(BenchmarkId::new("decrypt", key_size), &ciphertext, |b, data| {
            b.iter(|| system.decrypt(black_box(data)))
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_key_schedule,
    bench_block_throughput,
    bench_primality,
    bench_quadratic
);
criterion_main!(benches);
