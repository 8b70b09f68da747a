//! [`DigitalIo`] over `embedded-hal` 1.0 pins.
//!
//! Binds one input (the button) and one output (the LED) to logical
//! channels.  On ESP-IDF the pins are `esp_idf_hal::gpio::PinDriver`s; in
//! tests any `InputPin`/`OutputPin` implementation will do.  Driver errors
//! are reduced to [`IoError::Pin`] so the task layer stays `Copy`-only.

use embedded_hal::digital::{InputPin, OutputPin, PinState};
use log::warn;

use crate::app::ports::{ChannelId, DigitalIo, Level};
use crate::error::IoError;

pub struct HalIo<B, L> {
    button: B,
    button_ch: ChannelId,
    led: L,
    led_ch: ChannelId,
    led_level: Level,
}

impl<B: InputPin, L: OutputPin> HalIo<B, L> {
    pub fn new(button: B, button_ch: ChannelId, led: L, led_ch: ChannelId) -> Self {
        Self {
            button,
            button_ch,
            led,
            led_ch,
            led_level: Level::Low,
        }
    }

    /// Release the pins.
    pub fn into_inner(self) -> (B, L) {
        (self.button, self.led)
    }
}

impl<B: InputPin, L: OutputPin> DigitalIo for HalIo<B, L> {
    fn read_channel(&mut self, ch: ChannelId) -> Result<Level, IoError> {
        if ch == self.button_ch {
            return self.button.is_high().map(Level::from).map_err(|e| {
                warn!("gpio: read {} failed: {:?}", ch, e);
                IoError::Pin(ch)
            });
        }
        if ch == self.led_ch {
            // Output pins are not sampled; report what was last driven.
            return Ok(self.led_level);
        }
        Err(IoError::UnknownChannel(ch))
    }

    fn write_channel(&mut self, ch: ChannelId, level: Level) -> Result<(), IoError> {
        if ch == self.button_ch {
            return Err(IoError::NotWritable(ch));
        }
        if ch != self.led_ch {
            return Err(IoError::UnknownChannel(ch));
        }
        self.led
            .set_state(PinState::from(level.is_high()))
            .map_err(|e| {
                warn!("gpio: write {} failed: {:?}", ch, e);
                IoError::Pin(ch)
            })?;
        self.led_level = level;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;
    use embedded_hal::digital::{ErrorKind, ErrorType};

    struct FakeInput(bool);

    impl ErrorType for FakeInput {
        type Error = Infallible;
    }

    impl InputPin for FakeInput {
        fn is_high(&mut self) -> Result<bool, Infallible> {
            Ok(self.0)
        }
        fn is_low(&mut self) -> Result<bool, Infallible> {
            Ok(!self.0)
        }
    }

    #[derive(Default)]
    struct FakeOutput {
        high: bool,
        broken: bool,
    }

    impl ErrorType for FakeOutput {
        type Error = ErrorKind;
    }

    impl OutputPin for FakeOutput {
        fn set_low(&mut self) -> Result<(), ErrorKind> {
            if self.broken {
                return Err(ErrorKind::Other);
            }
            self.high = false;
            Ok(())
        }
        fn set_high(&mut self) -> Result<(), ErrorKind> {
            if self.broken {
                return Err(ErrorKind::Other);
            }
            self.high = true;
            Ok(())
        }
    }

    const BTN: ChannelId = ChannelId(0);
    const LED: ChannelId = ChannelId(1);

    #[test]
    fn reads_button_level() {
        let mut io = HalIo::new(FakeInput(false), BTN, FakeOutput::default(), LED);
        assert_eq!(io.read_channel(BTN), Ok(Level::Low));
    }

    #[test]
    fn drives_led_pin() {
        let mut io = HalIo::new(FakeInput(true), BTN, FakeOutput::default(), LED);
        io.write_channel(LED, Level::High).unwrap();
        assert_eq!(io.read_channel(LED), Ok(Level::High));
        let (_, led) = io.into_inner();
        assert!(led.high);
    }

    #[test]
    fn button_is_not_writable() {
        let mut io = HalIo::new(FakeInput(true), BTN, FakeOutput::default(), LED);
        assert_eq!(
            io.write_channel(BTN, Level::High),
            Err(IoError::NotWritable(BTN))
        );
    }

    #[test]
    fn pin_failure_maps_to_io_error() {
        let led = FakeOutput {
            broken: true,
            ..FakeOutput::default()
        };
        let mut io = HalIo::new(FakeInput(true), BTN, led, LED);
        assert_eq!(io.write_channel(LED, Level::High), Err(IoError::Pin(LED)));
        // Failed write leaves the recorded level untouched.
        assert_eq!(io.read_channel(LED), Ok(Level::Low));
    }

    #[test]
    fn unbound_channel() {
        let mut io = HalIo::new(FakeInput(true), BTN, FakeOutput::default(), LED);
        assert_eq!(
            io.read_channel(ChannelId(7)),
            Err(IoError::UnknownChannel(ChannelId(7)))
        );
    }
}
