#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        // The loader must reject, never panic.
        let _ = trunkline_conformance::load_trace_str(s);
    }
});
