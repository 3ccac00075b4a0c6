//! Console summaries printed by the divan benches before they run.

use crate::error::SchemeError;
use crate::memory;
use crate::message::{bench_message, BENCH_MESSAGE_SIZES};
use crate::scheme::{KeyPair, SignatureScheme, SignedMessage};

/// Size of the signed message minus the message itself, per bench size.
pub fn signature_sizes(
    scheme: &dyn SignatureScheme,
    keypair: &KeyPair,
) -> Result<Vec<(usize, usize)>, SchemeError> {
    BENCH_MESSAGE_SIZES
        .into_iter()
        .map(|message_size| {
            let message = bench_message(message_size);
            let mut signed =
                SignedMessage::for_message(&scheme.sizes(), message.len());
            scheme.sign(keypair.secret_key(), &message, &mut signed)?;
            Ok((message_size, signed.len().saturating_sub(message_size)))
        })
        .collect()
}

/// Sign and verify heap peaks per bench size.
pub fn peak_heap(
    scheme: &dyn SignatureScheme,
    keypair: &KeyPair,
) -> Result<Vec<(usize, usize, usize)>, SchemeError> {
    let mut peaks = Vec::with_capacity(BENCH_MESSAGE_SIZES.len());
    for message_size in BENCH_MESSAGE_SIZES {
        let message = bench_message(message_size);
        let mut signed =
            SignedMessage::for_message(&scheme.sizes(), message.len());

        let (signed_result, sign_peak) = memory::measure_peak(|| {
            scheme.sign(keypair.secret_key(), &message, &mut signed)
        });
        signed_result?;

        let (opened, verify_peak) = memory::measure_peak(|| {
            scheme.verify(keypair.public_key(), signed.as_bytes())
        });
        opened?;

        peaks.push((message_size, sign_peak, verify_peak));
    }
    Ok(peaks)
}

pub fn print_sizes(scheme: &dyn SignatureScheme) -> Result<(), SchemeError> {
    let sizes = scheme.sizes();
    let keypair = scheme.generate_keypair()?;
    println!("{} sizes:", scheme.algorithm_name());
    println!("  Public key: {} bytes", keypair.public_key().len());
    println!("  Secret key: {} bytes", keypair.secret_key().len());
    println!("  Max signature: {} bytes", sizes.max_signature_bytes);

    for (message_size, signature_size) in signature_sizes(scheme, &keypair)? {
        println!(
            "  Signature (message {} bytes): {} bytes",
            message_size, signature_size
        );
    }
    Ok(())
}

/// Peaks read as zero unless the caller installed
/// [`TrackingAllocator`](crate::TrackingAllocator).
pub fn print_memory_usage(
    scheme: &dyn SignatureScheme,
) -> Result<(), SchemeError> {
    println!("{} peak heap usage:", scheme.algorithm_name());
    let keypair = scheme.generate_keypair()?;
    for (message_size, sign_peak, verify_peak) in peak_heap(scheme, &keypair)? {
        println!(
            "  Message {} bytes: sign={} bytes, verify={} bytes",
            message_size, sign_peak, verify_peak
        );
    }
    Ok(())
}
