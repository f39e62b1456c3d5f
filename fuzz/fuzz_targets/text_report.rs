#![no_main]

use libfuzzer_sys::fuzz_target;
use scoutpost_scout::TextReportParser;

fuzz_target!(|data: &[u8]| {
    let Ok(content) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(parser) = TextReportParser::new() else {
        return;
    };
    let report = parser.parse(content);

    // (id, package) 쌍은 중복되지 않아야 함
    for (i, a) in report.vulnerabilities.iter().enumerate() {
        for b in &report.vulnerabilities[i + 1..] {
            assert!(a.id != b.id || a.package != b.package);
        }
    }
});
