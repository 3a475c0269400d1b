#![no_main]

use libfuzzer_sys::fuzz_target;
use runqa::detector::RunQualityAnalyzer;
use runqa::energy::Energy;
use runqa::store::ProfileStore;

fuzz_target!(|data: &[u8]| {
    // Loading and checking an arbitrary store must never panic
    if let Ok(input) = std::str::from_utf8(data) {
        if let Ok(store) = ProfileStore::from_json_str(input, Some(Energy::Gev14.run_range())) {
            let analyzer = RunQualityAnalyzer::default();
            for name in store.names() {
                if let Ok(profile) = store.get(name) {
                    let _ = analyzer.check(&profile);
                }
            }
        }
    }
});
