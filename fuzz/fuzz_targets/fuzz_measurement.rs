//! Fuzz target: SCD4x frame decoding into the telemetry model
//!
//! Feeds arbitrary 9-byte frames through `decode_measurement` and every
//! decoded sample into `TelemetryModel::ingest_sample`.  Neither may panic,
//! and an accepted reading must carry a comfort index exactly when it has
//! both climate values.
//!
//! cargo fuzz run fuzz_measurement

#![no_main]

use co2monitor::drivers::scd4x::decode_measurement;
use co2monitor::telemetry::TelemetryModel;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut model = TelemetryModel::new();

    for chunk in data.chunks_exact(9) {
        let mut frame = [0u8; 9];
        frame.copy_from_slice(chunk);

        let Ok(sample) = decode_measurement(&frame) else {
            continue;
        };
        let before = model.latest().copied();
        match model.ingest_sample(sample) {
            Ok(reading) => assert_eq!(
                reading.comfort_index.is_some(),
                reading.temperature_c.is_some() && reading.humidity_percent.is_some()
            ),
            Err(_) => assert_eq!(model.latest().copied(), before),
        }
    }
});
