//! Simulator runs across one and two clock domains.

use gateware_core::bus::UART_TX_ADDR;
use gateware_core::{
    boot_sequence, BusOp, ConfigError, LedDriver, NcoConfig, NcoDriver, PllConfig, ScriptedMaster,
    SimConfig, Simulator,
};
use proptest as _;
use rstest::rstest;
#[cfg(feature = "serde")]
use serde as _;
use thiserror as _;
use tracing as _;

fn with_pll(output_mhz: f64, lock_ticks: u32) -> SimConfig {
    SimConfig {
        pll: Some(PllConfig {
            output_mhz,
            lock_ticks,
            ..PllConfig::default()
        }),
        ..SimConfig::default()
    }
}

fn idle(config: &SimConfig) -> Simulator<ScriptedMaster> {
    Simulator::new(config, &[], ScriptedMaster::default()).expect("valid design")
}

#[rstest]
#[case(50.0, 1_600, 5_000)]
#[case(48.0, 1_000, 3_000)]
#[case(16.0, 500, 500)]
fn signal_edges_follow_the_pll_ratio(
    #[case] output_mhz: f64,
    #[case] sync_ticks: u64,
    #[case] signal_ticks: u64,
) {
    let mut sim = idle(&with_pll(output_mhz, 16));
    let stats = sim.run(sync_ticks);
    assert_eq!(stats.sync_ticks, sync_ticks);
    assert_eq!(stats.signal_ticks, signal_ticks);
    assert_eq!(stats.time_ps, sync_ticks * 62_500);
}

#[test]
fn signal_domain_is_silent_until_lock_propagates() {
    let mut sim = idle(&with_pll(50.0, 16));
    sim.record_streams(true);
    let stats = sim.run(200);
    let streams = sim.streams().expect("recording");
    let held = usize::try_from(stats.signal_reset_ticks).expect("fits");

    assert!(held >= 16 * 3);
    assert!(streams.sine[..held].iter().all(|&bit| !bit));
    assert!(streams.cosine[..held].iter().all(|&bit| !bit));
    assert!(streams.sine[held..].iter().any(|&bit| bit));
    assert!(!sim.signal_in_reset());
}

#[test]
fn recorded_streams_agree_with_counters() {
    let master = ScriptedMaster::new(boot_sequence(16e6, 10_000.0, b""));
    let mut sim = Simulator::new(&SimConfig::default(), &[], master).expect("default design");
    sim.record_streams(true);
    let stats = sim.run(5_000);
    let streams = sim.streams().expect("recording");

    assert_eq!(streams.sine.len() as u64, stats.signal_ticks);
    assert_eq!(
        streams.sine.iter().filter(|&&bit| bit).count() as u64,
        stats.sine_ones
    );
    assert_eq!(
        streams.cosine.iter().filter(|&&bit| bit).count() as u64,
        stats.cosine_ones
    );
    assert!((stats.sine_density() - 0.5).abs() < 0.05);
}

#[test]
fn boot_sequence_sends_its_message() {
    let master = ScriptedMaster::new(boot_sequence(16e6, 1_000.0, b"hi\n"));
    let mut sim = Simulator::new(&SimConfig::default(), &[], master).expect("default design");
    sim.run(4 * 10 * 1667);

    assert!(sim.master().is_done());
    assert!(sim.top().led());
    assert_eq!(sim.top().uart().sent(), b"hi\n");
    assert!(sim.top().uart_line());
}

#[rstest]
#[case(false, true)]
#[case(true, false)]
fn enable_policy_decides_whether_a_tuned_nco_runs(
    #[case] honor_enable: bool,
    #[case] expect_motion: bool,
) {
    let config = SimConfig {
        nco: NcoConfig {
            honor_enable,
            ..NcoConfig::default()
        },
        ..SimConfig::default()
    };
    let master = ScriptedMaster::new([NcoDriver::default().set_frequency(1_000.0)]);
    let mut sim = Simulator::new(&config, &[], master).expect("valid design");
    sim.run(100);
    assert_eq!(sim.top().nco().phase() != 0, expect_motion);

    sim.master_mut().push(NcoDriver::default().enable(true));
    sim.run(100);
    assert_ne!(sim.top().nco().phase(), 0);
}

#[test]
fn identical_runs_produce_identical_bitstreams() {
    let run = || {
        let master = ScriptedMaster::new(boot_sequence(16e6, 3_000.0, b"x"));
        let mut sim = Simulator::new(&with_pll(33.3, 8), &[], master).expect("valid design");
        sim.record_streams(true);
        sim.run(2_000);
        (sim.stats(), sim.streams().cloned())
    };
    assert_eq!(run(), run());
}

#[test]
fn queued_operations_run_after_earlier_ones() {
    let mut sim = idle(&SimConfig::default());
    sim.master_mut().push(BusOp::Write {
        address: UART_TX_ADDR,
        data: u32::from(b'!'),
    });
    sim.master_mut().push(BusOp::Idle { ticks: 3 });
    sim.master_mut().push(LedDriver.enable(true));
    sim.run(50);
    assert!(sim.master().is_done());
    assert_eq!(sim.master().completions().len(), 2);
    assert!(sim.top().led());
}

#[rstest]
#[case(300.0, ConfigError::PllOutputOutOfRange { f_req_mhz: 300.0 })]
#[case(10.0, ConfigError::PllOutputOutOfRange { f_req_mhz: 10.0 })]
fn unreachable_pll_requests_fail_construction(
    #[case] output_mhz: f64,
    #[case] expected: ConfigError,
) {
    let result = Simulator::new(&with_pll(output_mhz, 4), &[], ScriptedMaster::default());
    assert_eq!(result.err(), Some(expected));
}
