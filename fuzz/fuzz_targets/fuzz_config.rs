//! Fuzz target: configuration document parsing
//!
//! Arbitrary bytes are parsed as a `MonitorConfig` JSON document.  Parsing
//! must never panic, and anything that parses and validates must survive a
//! serialise/parse cycle unchanged.
//!
//! cargo fuzz run fuzz_config

#![no_main]

use co2monitor::config::MonitorConfig;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(config) = serde_json::from_slice::<MonitorConfig>(data) else {
        return;
    };
    if config.validate().is_err() {
        return;
    }
    let Ok(encoded) = serde_json::to_vec(&config) else {
        return;
    };
    let reparsed: MonitorConfig =
        serde_json::from_slice(&encoded).expect("re-encoded config must parse");
    assert_eq!(reparsed, config);
});
