use divan::{black_box, AllocProfiler, Bencher};
use rsa_scheme::{RsaParamSet, RsaScheme};
use sweep::{
    bench_message, report, SignatureScheme, SignedMessage, TrackingAllocator,
    BENCH_MESSAGE_SIZES,
};

static DIVAN_ALLOC: AllocProfiler = AllocProfiler::system();

#[global_allocator]
static ALLOC: TrackingAllocator<AllocProfiler> =
    TrackingAllocator::new(&DIVAN_ALLOC);

// Prime generation dominates; a handful of samples is enough.
#[divan::bench(args = RsaParamSet::ALL, sample_count = 10, sample_size = 1)]
fn keygen(bencher: Bencher, param_set: RsaParamSet) {
    let scheme = RsaScheme::new(param_set);

    bencher.bench(|| {
        black_box(scheme.generate_keypair().unwrap());
    });
}

#[divan::bench(args = BENCH_MESSAGE_SIZES)]
fn sign(bencher: Bencher, message_size: usize) {
    let scheme = rsa_scheme::RSA_3072;
    let keypair = scheme.generate_keypair().unwrap();
    let message = bench_message(message_size);

    bencher.bench(|| {
        let mut signed =
            SignedMessage::for_message(&scheme.sizes(), message.len());
        scheme
            .sign(
                black_box(keypair.secret_key()),
                black_box(&message),
                &mut signed,
            )
            .expect("rsa sign benchmark input should always be valid");
        black_box(signed);
    });
}

#[divan::bench(args = BENCH_MESSAGE_SIZES)]
fn verify(bencher: Bencher, message_size: usize) {
    let scheme = rsa_scheme::RSA_3072;
    let keypair = scheme.generate_keypair().unwrap();
    let message = bench_message(message_size);
    let mut signed = SignedMessage::for_message(&scheme.sizes(), message_size);
    scheme
        .sign(keypair.secret_key(), &message, &mut signed)
        .expect("benchmark setup should sign message");

    bencher.bench(|| {
        let opened = scheme
            .verify(
                black_box(keypair.public_key()),
                black_box(signed.as_bytes()),
            )
            .expect("rsa verify benchmark input should always be valid");
        black_box(opened);
    });
}

fn main() {
    for param_set in RsaParamSet::ALL {
        let scheme = RsaScheme::new(param_set);
        report::print_sizes(&scheme).expect("size report should sign");
        report::print_memory_usage(&scheme).expect("heap report should sign");
    }
    divan::main();
}
