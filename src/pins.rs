//! GPIO / peripheral pin assignments for the monitor board.
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.  `main` must pick the matching `gpioN` fields
//! from `Peripherals`; the constants are what gets logged at boot.

// ---------------------------------------------------------------------------
// SCD4x CO2 sensor (I2C0)
// ---------------------------------------------------------------------------

pub const I2C_SDA_GPIO: i32 = 21;
pub const I2C_SCL_GPIO: i32 = 22;
/// Standard-mode; the SCD4x tops out at 100 kHz.
pub const I2C_BAUDRATE_HZ: u32 = 100_000;

// ---------------------------------------------------------------------------
// TM1637 4-digit display (bit-banged)
// ---------------------------------------------------------------------------

pub const DISPLAY_CLK_GPIO: i32 = 18;
pub const DISPLAY_DIO_GPIO: i32 = 19;

// ---------------------------------------------------------------------------
// Liveness LED
// ---------------------------------------------------------------------------

/// On-board LED of most ESP32 DevKit boards.
pub const STATUS_LED_GPIO: i32 = 2;
