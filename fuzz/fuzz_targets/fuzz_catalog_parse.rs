#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes must parse or fail cleanly, never panic
    if let Ok(records) = savor::catalog::parse_catalog(data) {
        let _ = savor::index::build_index(&records);
        let _ = savor::catalog::filter_options(&records);
    }
});
