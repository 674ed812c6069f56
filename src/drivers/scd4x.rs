//! Sensirion SCD4x CO2 / temperature / humidity sensor (I2C, 0x62).
//!
//! Runs the sensor in periodic-measurement mode (one sample every ~5 s) and
//! implements [`SensorPort`] over any `embedded-hal` 1.0 I2C bus.
//!
//! ## Wire format
//!
//! Every 16-bit word on the bus is followed by a CRC-8 (poly `0x31`,
//! init `0xFF`).  A measurement is three words: CO2 (ppm), temperature,
//! relative humidity.
//!
//! ```text
//!  T  = -45 + 175 · raw / 65535   (°C)
//!  RH =       100 · raw / 65535   (%)
//! ```

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use crate::app::ports::SensorPort;
use crate::error::SensorError;
use crate::telemetry::RawSample;

pub const SCD4X_ADDRESS: u8 = 0x62;

const CMD_START_PERIODIC: u16 = 0x21B1;
const CMD_STOP_PERIODIC: u16 = 0x3F86;
const CMD_READ_MEASUREMENT: u16 = 0xEC05;
const CMD_GET_DATA_READY: u16 = 0xE4B8;

/// Settling time after stopping periodic measurement.
const STOP_DELAY_MS: u32 = 500;
/// Execution time of read-type commands.
const COMMAND_DELAY_MS: u32 = 1;

/// CRC-8 as used by Sensirion sensors.
pub fn crc8(data: &[u8]) -> u8 {
    let mut crc: u8 = 0xFF;
    for byte in data {
        crc ^= byte;
        for _ in 0..8 {
            crc = if crc & 0x80 != 0 {
                (crc << 1) ^ 0x31
            } else {
                crc << 1
            };
        }
    }
    crc
}

/// Check and strip the CRC from a 3-byte word.
fn word(chunk: &[u8]) -> Result<u16, SensorError> {
    match chunk {
        [hi, lo, crc] if crc8(&[*hi, *lo]) == *crc => Ok(u16::from_be_bytes([*hi, *lo])),
        [_, _, _] => Err(SensorError::Crc),
        _ => Err(SensorError::Bus),
    }
}

/// Decode a 9-byte measurement frame into a sample.
pub fn decode_measurement(frame: &[u8; 9]) -> Result<RawSample, SensorError> {
    let co2 = word(&frame[0..3])?;
    let t_raw = word(&frame[3..6])?;
    let rh_raw = word(&frame[6..9])?;
    Ok(RawSample {
        co2_ppm: Some(i32::from(co2)),
        temperature_c: Some(-45.0 + 175.0 * f32::from(t_raw) / 65535.0),
        humidity_percent: Some(100.0 * f32::from(rh_raw) / 65535.0),
    })
}

pub struct Scd4x<I, D> {
    i2c: I,
    delay: D,
}

impl<I: I2c, D: DelayNs> Scd4x<I, D> {
    pub fn new(i2c: I, delay: D) -> Self {
        Self { i2c, delay }
    }

    /// Give the bus back (e.g. when the sensor is dropped).
    pub fn release(self) -> (I, D) {
        (self.i2c, self.delay)
    }

    fn command(&mut self, cmd: u16) -> Result<(), SensorError> {
        self.i2c
            .write(SCD4X_ADDRESS, &cmd.to_be_bytes())
            .map_err(|_| SensorError::Bus)
    }

    fn read_words(&mut self, cmd: u16, buf: &mut [u8]) -> Result<(), SensorError> {
        self.command(cmd)?;
        self.delay.delay_ms(COMMAND_DELAY_MS);
        self.i2c
            .read(SCD4X_ADDRESS, buf)
            .map_err(|_| SensorError::Bus)
    }
}

impl<I: I2c, D: DelayNs> SensorPort for Scd4x<I, D> {
    fn data_ready(&mut self) -> Result<bool, SensorError> {
        let mut buf = [0u8; 3];
        self.read_words(CMD_GET_DATA_READY, &mut buf)?;
        Ok(word(&buf)? & 0x07FF != 0)
    }

    fn read(&mut self) -> Result<RawSample, SensorError> {
        let mut frame = [0u8; 9];
        self.read_words(CMD_READ_MEASUREMENT, &mut frame)?;
        decode_measurement(&frame)
    }

    /// Stop (if running) and restart periodic measurement.
    fn reset(&mut self) -> Result<(), SensorError> {
        self.command(CMD_STOP_PERIODIC)?;
        self.delay.delay_ms(STOP_DELAY_MS);
        self.command(CMD_START_PERIODIC)
    }
}
