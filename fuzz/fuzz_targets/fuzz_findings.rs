// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

#![no_main]

use libfuzzer_sys::fuzz_target;
use pulmo::analysis::vision::parse_findings;

fuzz_target!(|reply: &str| {
    if let Ok(entries) = parse_findings(reply) {
        assert!(!entries.is_empty());
        assert!(entries.iter().all(|e| e.confidence_score <= 100));
    }
});
