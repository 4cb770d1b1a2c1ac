#![no_main]
use libfuzzer_sys::fuzz_target;
use trunkline_ir::Trace;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(trace) = trunkline_conformance::load_trace_str(s) {
            let once: Trace = trunkline_conformance::normalize(&trace);
            assert!(once.is_normalized());
            assert_eq!(once, trunkline_conformance::normalize(&once));
            for index in 0..once.steps.len() {
                let _ = trunkline_conformance::diff::step_diff(index, &once.steps);
            }
        }
    }
});
