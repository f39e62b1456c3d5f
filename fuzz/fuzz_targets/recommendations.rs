#![no_main]

use libfuzzer_sys::fuzz_target;
use scoutpost_scout::{format_recommendations, normalize_recommendations};

fuzz_target!(|data: &[u8]| {
    let Ok(value) = serde_json::from_slice::<serde_json::Value>(data) else {
        return;
    };
    let records = normalize_recommendations(&value);
    for record in &records {
        assert!(!record.kind.is_empty());
        assert!(record.extra.keys().all(|k| !k.starts_with('_')));
    }
    let text = format_recommendations(&records, None);
    assert!(!text.is_empty());
});
