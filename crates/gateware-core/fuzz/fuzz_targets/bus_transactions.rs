#![no_main]

use gateware_core::{
    solve, BusRequest, BusSignals, BusState, QuarterWaveTable, SigmaDeltaDac, SimConfig, Top,
};
use libfuzzer_sys::fuzz_target;

fn signals(chunk: &[u8]) -> BusSignals {
    let address = u32::from_le_bytes([chunk[1], chunk[2], chunk[3], chunk[4]]);
    let data = u32::from_le_bytes([chunk[5], chunk[6], chunk[7], chunk[8]]);
    BusSignals {
        valid: chunk[0] & 0x80 != 0,
        request: BusRequest {
            address,
            write_strobe: chunk[0] & 0x0F,
            data,
        },
    }
}

fuzz_target!(|data: &[u8]| {
    if data.len() < 9 {
        return;
    }

    let Ok(mut top) = Top::new(&SimConfig::default(), &data[..data.len().min(64)]) else {
        return;
    };
    for chunk in data.chunks_exact(9) {
        let before = top.mediator().state();
        let response = top.tick(signals(chunk));
        if response.ready {
            assert_ne!(before, BusState::Ready);
        }
    }

    let width = u32::from(data[0] % 34);
    let samples = 1usize << (data[1] % 12);
    if let Ok(table) = QuarterWaveTable::new(width, samples) {
        let address = u32::from_le_bytes([data[2], data[3], data[4], data[5]]);
        assert_eq!(table.sin(address).width(), width);
    }
    let _ = SigmaDeltaDac::new(width);
    let _ = solve(f64::from(data[6]), f64::from(data[7]) + f64::from(data[8]));
});
