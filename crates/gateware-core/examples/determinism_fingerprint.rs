//! Deterministic output fingerprint used for cross-host comparison.

use gateware_core::{boot_sequence, PllConfig, ScriptedMaster, SimConfig, Simulator};
use proptest as _;
use rstest as _;
#[cfg(feature = "serde")]
use serde as _;
use thiserror as _;
use tracing as _;

const SYNC_TICKS: u64 = 40_000;

fn hash_bytes(hash: &mut u64, bytes: &[u8]) {
    for byte in bytes {
        *hash ^= u64::from(*byte);
        *hash = hash.wrapping_mul(0x1000_0000_01B3);
    }
}

fn pack(bits: &[bool]) -> Vec<u8> {
    bits.chunks(8)
        .map(|chunk| {
            chunk
                .iter()
                .enumerate()
                .fold(0u8, |byte, (i, &bit)| byte | (u8::from(bit) << i))
        })
        .collect()
}

fn fingerprint() -> String {
    let config = SimConfig {
        pll: Some(PllConfig {
            output_mhz: 33.3,
            ..PllConfig::default()
        }),
        ..SimConfig::default()
    };
    let master = ScriptedMaster::new(boot_sequence(33e6, 440.0, b"nco"));
    let mut sim = Simulator::new(&config, &[], master).expect("reference design should build");
    sim.record_streams(true);
    let stats = sim.run(SYNC_TICKS);

    let mut hash = 0xcbf2_9ce4_8422_2325_u64;
    hash_bytes(&mut hash, &stats.sync_ticks.to_le_bytes());
    hash_bytes(&mut hash, &stats.signal_ticks.to_le_bytes());
    hash_bytes(&mut hash, &stats.signal_reset_ticks.to_le_bytes());
    hash_bytes(&mut hash, &stats.time_ps.to_le_bytes());
    if let Some(streams) = sim.streams() {
        hash_bytes(&mut hash, &pack(&streams.sine));
        hash_bytes(&mut hash, &pack(&streams.cosine));
    }
    hash_bytes(&mut hash, sim.top().uart().sent());
    hash_bytes(&mut hash, &sim.top().nco().phase().to_le_bytes());

    format!("{hash:016x}")
}

fn main() {
    println!("{}", fingerprint());
}
