//! Peripheral drivers.
//!
//! | Driver       | Implements     | Hardware                      |
//! |--------------|----------------|-------------------------------|
//! | `scd4x`      | SensorPort     | Sensirion SCD4x over I2C      |
//! | `tm1637`     | DisplayPort    | TM1637 4-digit 7-segment      |
//! | `status_led` | IndicatorPort  | Single GPIO LED               |
//! | `watchdog`   | WatchdogPort   | ESP-IDF task watchdog (TWDT)  |

pub mod scd4x;
pub mod status_led;
pub mod tm1637;
pub mod watchdog;
