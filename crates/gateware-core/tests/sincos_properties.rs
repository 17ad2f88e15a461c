//! Quarter-wave table properties over a range of table sizes.

use gateware_core::{ConfigError, QuarterWaveTable};
use proptest::prelude::*;
use rstest::rstest;
#[cfg(feature = "serde")]
use serde as _;
use thiserror as _;
use tracing as _;

fn table_strategy() -> impl Strategy<Value = QuarterWaveTable> {
    (4u32..=16, 0u32..=10).prop_map(|(width, log2_samples)| {
        QuarterWaveTable::new(width, 1 << log2_samples).expect("valid table")
    })
}

proptest! {
    #[test]
    fn cosine_is_sine_advanced_one_quadrant(table in table_strategy(), raw in any::<u32>()) {
        let period = u32::try_from(table.samples() * 4).expect("period fits u32");
        let address = raw % period;
        let advanced = (address + u32::try_from(table.samples()).expect("fits")) % period;
        prop_assert_eq!(table.cos(address), table.sin(advanced));
    }

    #[test]
    fn quarter_table_is_monotonic_and_bounded(table in table_strategy()) {
        let max = (1u32 << (table.out_width() - 1)) - 1;
        prop_assert_eq!(table.amplitude(0), Some(0));
        for pair in table.amplitudes().windows(2) {
            prop_assert!(pair[0] <= pair[1]);
        }
        prop_assert!(table.amplitudes().iter().all(|&value| value <= max));
    }

    #[test]
    fn samples_have_declared_width(table in table_strategy(), raw in any::<u32>()) {
        let sample = table.sin(raw);
        prop_assert_eq!(sample.width(), table.out_width());
        prop_assert!(sample.as_u64() < 1u64 << table.out_width());
    }

    #[test]
    fn second_quadrant_mirrors_first(table in table_strategy(), raw in any::<u32>()) {
        let quarter = u32::try_from(table.samples()).expect("fits");
        let offset = raw % quarter;
        prop_assert_eq!(table.sin(offset), table.sin(2 * quarter - 1 - offset));
    }
}

#[test]
fn last_entry_saturates_at_full_scale_for_fine_tables() {
    for log2_samples in 6..=12 {
        let table = QuarterWaveTable::new(12, 1 << log2_samples).expect("valid table");
        assert_eq!(table.amplitude(table.samples() - 1), Some(2047));
    }
}

#[rstest]
#[case(3)]
#[case(6)]
#[case(1000)]
#[case(1023)]
fn non_power_of_two_tables_are_configuration_errors(#[case] samples: usize) {
    assert_eq!(
        QuarterWaveTable::new(12, samples),
        Err(ConfigError::SampleCountNotPowerOfTwo { samples })
    );
}
