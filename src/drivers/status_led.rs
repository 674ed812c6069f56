//! Liveness LED driver.
//!
//! A single GPIO-driven LED, blinked once per loop pass so a human can see
//! the loop is alive.  Generic over any `embedded-hal` output pin.

use embedded_hal::digital::OutputPin;

use crate::app::ports::IndicatorPort;
use crate::error::Error;

pub struct StatusLed<P: OutputPin> {
    pin: P,
    lit: bool,
}

impl<P: OutputPin> StatusLed<P> {
    pub fn new(pin: P) -> Self {
        Self { pin, lit: false }
    }

    pub fn is_lit(&self) -> bool {
        self.lit
    }
}

impl<P: OutputPin> IndicatorPort for StatusLed<P> {
    fn set(&mut self, on: bool) -> Result<(), Error> {
        let result = if on { self.pin.set_high() } else { self.pin.set_low() };
        result.map_err(|_| Error::Hardware("status LED"))?;
        self.lit = on;
        Ok(())
    }
}
