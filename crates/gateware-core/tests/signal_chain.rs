//! Oscillator into modulator: periodicity and output density.

use gateware_core::{BitVector, Nco, NcoControl, SigmaDeltaDac};
use proptest::prelude::*;
use rstest::rstest;
#[cfg(feature = "serde")]
use serde as _;
use thiserror as _;
use tracing as _;

const ONE_ADDRESS_PER_TICK: u32 = 1 << 20;

fn running(step: u32) -> NcoControl {
    NcoControl { step, enable: true }
}

#[test]
fn power_of_two_step_repeats_after_the_phase_wraps() {
    let mut nco = Nco::new(12, 1024, false).expect("valid nco");
    let period = 1usize << 12;
    let first: Vec<_> = (0..period)
        .map(|_| {
            let sample = nco.outputs();
            nco.tick(running(ONE_ADDRESS_PER_TICK));
            sample
        })
        .collect();
    assert_eq!(nco.phase(), 0);
    for expected in first {
        assert_eq!(nco.outputs(), expected);
        nco.tick(running(ONE_ADDRESS_PER_TICK));
    }
}

#[test]
fn address_tracks_top_phase_bits() {
    let mut nco = Nco::new(12, 256, false).expect("valid nco");
    assert_eq!(nco.table().address_bits(), 10);
    for tick in 1..=50_u32 {
        nco.tick(running(1 << 22));
        assert_eq!(nco.address(), tick);
    }
}

#[rstest]
#[case(false, 10)]
#[case(true, 0)]
fn enable_bit_gates_only_when_honoured(#[case] honor_enable: bool, #[case] expected_ticks: u32) {
    let mut nco = Nco::new(12, 1024, honor_enable).expect("valid nco");
    for _ in 0..10 {
        nco.tick(NcoControl {
            step: 7,
            enable: false,
        });
    }
    assert_eq!(nco.phase(), 7 * expected_ticks);
}

#[rstest]
#[case(8, 256)]
#[case(12, 1024)]
fn full_scale_sine_averages_to_half_density(#[case] width: u32, #[case] samples: usize) {
    let mut nco = Nco::new(width, samples, false).expect("valid nco");
    let mut sine = SigmaDeltaDac::new(width).expect("valid dac");
    let mut cosine = SigmaDeltaDac::new(width).expect("valid dac");
    let step = 1u32 << (32 - nco.table().address_bits());
    let ticks = 4 * (4 * samples);

    let (mut sine_ones, mut cosine_ones) = (0usize, 0usize);
    for _ in 0..ticks {
        let outputs = nco.outputs();
        sine_ones += usize::from(sine.tick(outputs.sin));
        cosine_ones += usize::from(cosine.tick(outputs.cos));
        nco.tick(running(step));
    }

    let half = ticks / 2;
    assert!(sine_ones.abs_diff(half) <= ticks / 100);
    assert!(cosine_ones.abs_diff(half) <= ticks / 100);
}

#[test]
fn positive_half_cycle_is_denser_than_negative() {
    let samples = 256;
    let mut nco = Nco::new(10, samples, false).expect("valid nco");
    let mut dac = SigmaDeltaDac::new(10).expect("valid dac");
    let step = 1u32 << (32 - nco.table().address_bits());

    let mut ones = [0usize; 2];
    for tick in 0..4 * samples {
        let half = tick / (2 * samples);
        ones[half] += usize::from(dac.tick(nco.outputs().sin));
        nco.tick(running(step));
    }
    assert!(ones[0] > 3 * ones[1]);
}

proptest! {
    #[test]
    fn constant_input_density_is_exact(width in 1u32..=12, raw in any::<u64>()) {
        let input = BitVector::new(width, raw);
        let mut dac = SigmaDeltaDac::new(width).expect("valid dac");
        let period = 1u64 << width;
        let ones = (0..period).filter(|_| dac.tick(input)).count();
        prop_assert_eq!(u64::try_from(ones).expect("fits"), input.as_u64());
        prop_assert_eq!(dac.accumulator().slice(0, width).as_u64(), 0);
    }

    #[test]
    fn wider_inputs_are_truncated_to_the_dac_width(value in any::<u16>()) {
        let mut narrow = SigmaDeltaDac::new(8).expect("valid dac");
        let mut reference = SigmaDeltaDac::new(8).expect("valid dac");
        let wide = BitVector::new(16, u64::from(value));
        let low = BitVector::new(8, u64::from(value & 0xFF));
        for _ in 0..64 {
            prop_assert_eq!(narrow.tick(wide), reference.tick(low));
        }
    }
}
