//! TM1637 4-digit 7-segment display driver (bit-banged CLK/DIO).
//!
//! Implements [`DisplayPort`] over two `embedded-hal` output pins and a
//! delay.  The chip's two-wire protocol looks like I2C but is LSB-first
//! and has no address byte.
//!
//! Segment bit order: `0bDGFEDCBA` with bit 7 as the colon/decimal point.
//!
//! ```text
//!   ─A─
//!  F   B
//!   ─G─
//!  E   C
//!   ─D─
//! ```

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

use crate::app::ports::DisplayPort;
use crate::error::DisplayError;

const CMD_DATA_AUTO_INCREMENT: u8 = 0x40;
const CMD_ADDRESS_FIRST: u8 = 0xC0;
const CMD_DISPLAY_ON: u8 = 0x88;

const MAX_BRIGHTNESS: u8 = 7;
const BIT_DELAY_US: u32 = 5;

pub const DIGITS: usize = 4;

const DIGIT_SEGMENTS: [u8; 10] = [
    0x3F, 0x06, 0x5B, 0x4F, 0x66, 0x6D, 0x7D, 0x07, 0x7F, 0x6F,
];

/// Segments for one character.  Unknown characters render blank.
pub fn glyph(c: char) -> u8 {
    match c {
        '0'..='9' => DIGIT_SEGMENTS[(c as u8 - b'0') as usize],
        'A' | 'a' => 0x77,
        'b' => 0x7C,
        'C' => 0x39,
        'c' => 0x58,
        'd' => 0x5E,
        'E' | 'e' => 0x79,
        'F' | 'f' => 0x71,
        'H' => 0x76,
        'h' => 0x74,
        'i' => 0x10,
        'I' => 0x06,
        'L' => 0x38,
        'n' => 0x54,
        'o' => 0x5C,
        'P' | 'p' => 0x73,
        'r' => 0x50,
        't' => 0x78,
        'U' => 0x3E,
        'u' => 0x1C,
        '-' => 0x40,
        '_' => 0x08,
        _ => 0x00,
    }
}

/// Left-aligned text, truncated to four positions.
pub fn encode_text(text: &str) -> [u8; DIGITS] {
    let mut segments = [0u8; DIGITS];
    for (slot, c) in segments.iter_mut().zip(text.chars()) {
        *slot = glyph(c);
    }
    segments
}

/// Right-aligned integer, clamped to what four positions can show.
pub fn encode_number(value: i32) -> [u8; DIGITS] {
    let value = value.clamp(-999, 9999);
    let mut segments = [0u8; DIGITS];
    let mut magnitude = value.unsigned_abs();
    let mut pos = DIGITS;
    loop {
        pos -= 1;
        segments[pos] = DIGIT_SEGMENTS[(magnitude % 10) as usize];
        magnitude /= 10;
        if magnitude == 0 || pos == 0 {
            break;
        }
    }
    if value < 0 && pos > 0 {
        segments[pos - 1] = glyph('-');
    }
    segments
}

pub struct Tm1637<CLK, DIO, D> {
    clk: CLK,
    dio: DIO,
    delay: D,
    brightness: u8,
}

impl<CLK, DIO, D> Tm1637<CLK, DIO, D>
where
    CLK: OutputPin,
    DIO: OutputPin,
    D: DelayNs,
{
    pub fn new(clk: CLK, dio: DIO, delay: D) -> Self {
        Self {
            clk,
            dio,
            delay,
            brightness: MAX_BRIGHTNESS,
        }
    }

    pub fn brightness(&self) -> u8 {
        self.brightness
    }

    /// Push four segment bytes and the display-control command.
    pub fn write_segments(&mut self, segments: &[u8; DIGITS]) -> Result<(), DisplayError> {
        self.frame(&[CMD_DATA_AUTO_INCREMENT])?;

        let mut data = [0u8; DIGITS + 1];
        data[0] = CMD_ADDRESS_FIRST;
        data[1..].copy_from_slice(segments);
        self.frame(&data)?;

        self.frame(&[CMD_DISPLAY_ON | self.brightness])
    }

    // ── Bus primitives ────────────────────────────────────────

    fn frame(&mut self, bytes: &[u8]) -> Result<(), DisplayError> {
        self.start()?;
        for &b in bytes {
            self.write_byte(b)?;
        }
        self.stop()
    }

    fn start(&mut self) -> Result<(), DisplayError> {
        self.clk.set_high().map_err(|_| DisplayError::Gpio)?;
        self.dio.set_high().map_err(|_| DisplayError::Gpio)?;
        self.delay.delay_us(BIT_DELAY_US);
        self.dio.set_low().map_err(|_| DisplayError::Gpio)?;
        self.delay.delay_us(BIT_DELAY_US);
        Ok(())
    }

    fn stop(&mut self) -> Result<(), DisplayError> {
        self.clk.set_low().map_err(|_| DisplayError::Gpio)?;
        self.dio.set_low().map_err(|_| DisplayError::Gpio)?;
        self.delay.delay_us(BIT_DELAY_US);
        self.clk.set_high().map_err(|_| DisplayError::Gpio)?;
        self.delay.delay_us(BIT_DELAY_US);
        self.dio.set_high().map_err(|_| DisplayError::Gpio)?;
        Ok(())
    }

    fn write_byte(&mut self, byte: u8) -> Result<(), DisplayError> {
        for bit in 0..8 {
            self.clk.set_low().map_err(|_| DisplayError::Gpio)?;
            let driven = if byte & (1 << bit) != 0 {
                self.dio.set_high()
            } else {
                self.dio.set_low()
            };
            driven.map_err(|_| DisplayError::Gpio)?;
            self.delay.delay_us(BIT_DELAY_US);
            self.clk.set_high().map_err(|_| DisplayError::Gpio)?;
            self.delay.delay_us(BIT_DELAY_US);
        }
        // ACK clock; DIO released, the ACK level itself is not read back.
        self.clk.set_low().map_err(|_| DisplayError::Gpio)?;
        self.dio.set_high().map_err(|_| DisplayError::Gpio)?;
        self.delay.delay_us(BIT_DELAY_US);
        self.clk.set_high().map_err(|_| DisplayError::Gpio)?;
        self.delay.delay_us(BIT_DELAY_US);
        self.clk.set_low().map_err(|_| DisplayError::Gpio)?;
        Ok(())
    }
}

impl<CLK, DIO, D> DisplayPort for Tm1637<CLK, DIO, D>
where
    CLK: OutputPin,
    DIO: OutputPin,
    D: DelayNs,
{
    fn show(&mut self, text: &str) -> Result<(), DisplayError> {
        self.write_segments(&encode_text(text))
    }

    fn show_number(&mut self, value: i32) -> Result<(), DisplayError> {
        self.write_segments(&encode_number(value))
    }

    fn set_brightness(&mut self, level: u8) -> Result<(), DisplayError> {
        if level > MAX_BRIGHTNESS {
            return Err(DisplayError::InvalidBrightness);
        }
        self.brightness = level;
        self.frame(&[CMD_DISPLAY_ON | level])
    }
}
