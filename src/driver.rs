//! ST7305 panel driver.
//!
//! [`St7305`] ties a [`FrameBuffer`] to the SPI transport. Drawing only
//! touches the framebuffer; nothing reaches the panel until
//! [`St7305::flush`] streams the whole buffer.
//!
//! ```rust,ignore
//! let config = PanelConfig::from(PanelModel::Waveshare400x300);
//! let mut display = St7305::new(spi, dc, cs, Some(rst), config)?;
//! display.init(&mut delay)?;
//!
//! Text::new("Hello", Point::new(10, 20), style).draw(&mut display)?;
//! display.flush()?;
//! ```

use core::convert::Infallible;

use embedded_graphics::draw_target::DrawTarget;
use embedded_graphics::prelude::{OriginDimensions, Size};
use embedded_graphics::primitives::Rectangle;
use embedded_graphics::Pixel;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiBus;

use crate::command::{Instruction, INIT_SEQUENCE, WAKE_MS};
use crate::config::PanelConfig;
use crate::framebuffer::FrameBuffer;
use crate::interface::{NoResetPin, SpiInterface};
use crate::{Color, Error};

const RESET_HIGH_MS: u32 = 50;
const RESET_LOW_MS: u32 = 20;

/// Driver for one ST7305 panel.
///
/// Owns the bus, the DC, CS and optional reset lines, and the framebuffer.
/// Bring the controller up with [`init`](Self::init) before the first
/// [`flush`](Self::flush), and do not flush while the panel sleeps.
#[derive(Debug)]
pub struct St7305<SPI, DC, CS, RST> {
    interface: SpiInterface<SPI, DC, CS>,
    reset: Option<RST>,
    config: PanelConfig,
    framebuffer: FrameBuffer,
}

impl<SPI, DC, CS> St7305<SPI, DC, CS, NoResetPin>
where
    SPI: SpiBus<u8>,
    DC: OutputPin,
    CS: OutputPin,
{
    /// Creates a driver for a panel whose reset line is not wired.
    ///
    /// # Errors
    ///
    /// See [`St7305::new`].
    pub fn without_reset(spi: SPI, dc: DC, cs: CS, config: PanelConfig) -> Result<Self, Error> {
        Self::new(spi, dc, cs, None, config)
    }
}

impl<SPI, DC, CS, RST> St7305<SPI, DC, CS, RST>
where
    SPI: SpiBus<u8>,
    DC: OutputPin,
    CS: OutputPin,
    RST: OutputPin,
{
    /// Allocates the framebuffer and takes ownership of the bus and lines.
    ///
    /// Nothing is sent to the panel yet; call [`init`](Self::init) next.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Allocation`] when the framebuffer or its lookup tables
    /// cannot be allocated, and [`Error::Pin`] when DC or CS cannot be driven
    /// to their idle levels.
    pub fn new(
        spi: SPI,
        dc: DC,
        cs: CS,
        reset: Option<RST>,
        config: PanelConfig,
    ) -> Result<Self, Error> {
        let geometry = config.geometry();
        let framebuffer = FrameBuffer::new(geometry).inspect_err(|_| {
            error!(
                "failed to allocate {} byte framebuffer",
                geometry.buffer_size()
            );
        })?;
        let interface = SpiInterface::new(spi, dc, cs)?;
        info!(
            "ST7305 {}x{} {} panel, {} byte framebuffer, reset line {}",
            geometry.width(),
            geometry.height(),
            geometry.orientation(),
            geometry.buffer_size(),
            if reset.is_some() { "wired" } else { "absent" }
        );
        Ok(Self {
            interface,
            reset,
            config,
            framebuffer,
        })
    }

    /// Resets the controller and sends the bring-up sequence.
    ///
    /// Blocks for about 320 ms with a reset line and 200 ms without.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Bus`] or [`Error::Pin`] on transport failure. The
    /// sequence is not resumed; call `init` again to retry.
    pub fn init(&mut self, delay: &mut impl DelayNs) -> Result<(), Error> {
        self.hardware_reset(delay)?;
        debug!("sending {} bring-up steps", INIT_SEQUENCE.len());
        let mut scratch = [0; 2];
        for step in INIT_SEQUENCE {
            let params = step.params.resolve(&self.config, &mut scratch);
            self.interface.command_with_data(step.instruction, params)?;
            if step.settle_ms > 0 {
                delay.delay_ms(step.settle_ms);
            }
        }
        debug!("bring-up complete");
        Ok(())
    }

    fn hardware_reset(&mut self, delay: &mut impl DelayNs) -> Result<(), Error> {
        let Some(reset) = self.reset.as_mut() else {
            return Ok(());
        };
        debug!("pulsing reset line");
        reset.set_high().map_err(|_| Error::Pin)?;
        delay.delay_ms(RESET_HIGH_MS);
        reset.set_low().map_err(|_| Error::Pin)?;
        delay.delay_ms(RESET_LOW_MS);
        reset.set_high().map_err(|_| Error::Pin)?;
        delay.delay_ms(RESET_HIGH_MS);
        Ok(())
    }

    /// Streams the framebuffer to the panel.
    ///
    /// High power mode and the display are switched on first and the address
    /// window is re-sent, so a flush also recovers from
    /// [`low_power_mode`](Self::low_power_mode) and
    /// [`display_off`](Self::display_off).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Bus`] or [`Error::Pin`] on transport failure.
    pub fn flush(&mut self) -> Result<(), Error> {
        let window = self.config.address_window();
        self.interface.send_command(Instruction::HighPowerMode)?;
        self.interface.send_command(Instruction::DisplayOn)?;
        self.interface
            .command_with_data(Instruction::ColumnAddress, &window.columns())?;
        self.interface
            .command_with_data(Instruction::RowAddress, &window.rows())?;
        self.interface
            .write_memory(Instruction::MemoryWrite, self.framebuffer.as_bytes())
    }

    /// Enters sleep mode.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Bus`] or [`Error::Pin`] on transport failure.
    pub fn sleep(&mut self) -> Result<(), Error> {
        self.interface.send_command(Instruction::SleepIn)?;
        debug!("entered sleep mode");
        Ok(())
    }

    /// Leaves sleep mode and waits for the controller to settle.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Bus`] or [`Error::Pin`] on transport failure.
    pub fn wake(&mut self, delay: &mut impl DelayNs) -> Result<(), Error> {
        self.interface.send_command(Instruction::SleepOut)?;
        delay.delay_ms(WAKE_MS);
        debug!("exited sleep mode");
        Ok(())
    }

    /// Switches to low power mode.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Bus`] or [`Error::Pin`] on transport failure.
    pub fn low_power_mode(&mut self) -> Result<(), Error> {
        self.interface.send_command(Instruction::LowPowerMode)?;
        debug!("switched to low power mode");
        Ok(())
    }

    /// Switches to high power mode.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Bus`] or [`Error::Pin`] on transport failure.
    pub fn high_power_mode(&mut self) -> Result<(), Error> {
        self.interface.send_command(Instruction::HighPowerMode)?;
        debug!("switched to high power mode");
        Ok(())
    }

    /// Turns the display on.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Bus`] or [`Error::Pin`] on transport failure.
    pub fn display_on(&mut self) -> Result<(), Error> {
        self.interface.send_command(Instruction::DisplayOn)?;
        debug!("display on");
        Ok(())
    }

    /// Turns the display off. Controller RAM is retained.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Bus`] or [`Error::Pin`] on transport failure.
    pub fn display_off(&mut self) -> Result<(), Error> {
        self.interface.send_command(Instruction::DisplayOff)?;
        debug!("display off");
        Ok(())
    }

    /// Returns the bus and lines, dropping the framebuffer.
    pub fn release(self) -> (SPI, DC, CS, Option<RST>) {
        let (spi, dc, cs) = self.interface.release();
        (spi, dc, cs, self.reset)
    }
}

impl<SPI, DC, CS, RST> St7305<SPI, DC, CS, RST> {
    /// See [`FrameBuffer::set_pixel`].
    #[inline]
    pub fn set_pixel(&mut self, x: i32, y: i32, on: bool) {
        self.framebuffer.set_pixel(x, y, on);
    }

    /// See [`FrameBuffer::fill`].
    pub fn fill(&mut self, on: bool) {
        self.framebuffer.fill(on);
    }

    /// Panel width in pixels.
    #[must_use]
    pub fn width(&self) -> u16 {
        self.framebuffer.width()
    }

    /// Panel height in pixels.
    #[must_use]
    pub fn height(&self) -> u16 {
        self.framebuffer.height()
    }

    /// Panel parameters the driver was built with.
    #[must_use]
    pub fn config(&self) -> &PanelConfig {
        &self.config
    }

    /// The framebuffer flushed by [`flush`](Self::flush).
    #[must_use]
    pub fn framebuffer(&self) -> &FrameBuffer {
        &self.framebuffer
    }

    /// Mutable access to the framebuffer.
    pub fn framebuffer_mut(&mut self) -> &mut FrameBuffer {
        &mut self.framebuffer
    }
}

impl<SPI, DC, CS, RST> OriginDimensions for St7305<SPI, DC, CS, RST> {
    fn size(&self) -> Size {
        self.framebuffer.size()
    }
}

impl<SPI, DC, CS, RST> DrawTarget for St7305<SPI, DC, CS, RST> {
    type Color = Color;

    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        self.framebuffer.draw_iter(pixels)
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        self.framebuffer.fill_solid(area, color)
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        self.framebuffer.clear(color)
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use std::vec;
    use std::vec::Vec;

    use embedded_graphics::pixelcolor::BinaryColor;
    use embedded_graphics::prelude::*;
    use embedded_graphics::primitives::PrimitiveStyle;

    use super::*;
    use crate::config::{AddressWindow, PanelModel};
    use crate::geometry::Orientation;
    use crate::mock::{Event, FailingBus, FailingPin, Line, MockBus, MockPin, Recorder};

    type TestDriver = St7305<MockBus, MockPin, MockPin, MockPin>;

    fn driver(recorder: &Recorder, model: PanelModel) -> TestDriver {
        St7305::new(
            recorder.bus(),
            recorder.pin(Line::Dc),
            recorder.pin(Line::Cs),
            Some(recorder.pin(Line::Reset)),
            PanelConfig::from(model),
        )
        .unwrap()
    }

    fn waveshare_init_writes() -> Vec<Vec<u8>> {
        vec![
            vec![0xD6],
            vec![0x17, 0x02],
            vec![0xD1],
            vec![0x01],
            vec![0xC0],
            vec![0x11, 0x04],
            vec![0xC1],
            vec![0x69, 0x69, 0x69, 0x69],
            vec![0xC2],
            vec![0x19, 0x19, 0x19, 0x19],
            vec![0xC4],
            vec![0x4B, 0x4B, 0x4B, 0x4B],
            vec![0xC5],
            vec![0x19, 0x19, 0x19, 0x19],
            vec![0xD8],
            vec![0x80, 0xE9],
            vec![0xB2],
            vec![0x02],
            vec![0xB3],
            vec![0xE5, 0xF6, 0x05, 0x46, 0x77, 0x77, 0x77, 0x77, 0x76, 0x45],
            vec![0xB4],
            vec![0x05, 0x46, 0x77, 0x77, 0x77, 0x77, 0x76, 0x45],
            vec![0x62],
            vec![0x32, 0x03, 0x1F],
            vec![0xB7],
            vec![0x13],
            vec![0xB0],
            vec![0x64],
            vec![0x11],
            vec![0xC9],
            vec![0x00],
            vec![0x36],
            vec![0x48],
            vec![0x3A],
            vec![0x11],
            vec![0xB9],
            vec![0x20],
            vec![0xB8],
            vec![0x29],
            vec![0x21],
            vec![0x2A],
            vec![0x12, 0x2A],
            vec![0x2B],
            vec![0x00, 0xC7],
            vec![0x35],
            vec![0x00],
            vec![0xD0],
            vec![0xFF],
            vec![0x38],
            vec![0x29],
        ]
    }

    #[test]
    fn test_new_only_idles_lines() {
        let recorder = Recorder::new();
        let display = driver(&recorder, PanelModel::Waveshare400x300);
        assert_eq!(
            recorder.events(),
            vec![Event::Pin(Line::Cs, true), Event::Pin(Line::Dc, true)]
        );
        assert_eq!(display.width(), 400);
        assert_eq!(display.height(), 300);
        assert!(display.framebuffer().as_bytes().iter().all(|&b| b == 0xFF));
    }

    #[test]
    fn test_init_wire_bytes() {
        let recorder = Recorder::new();
        let mut display = driver(&recorder, PanelModel::Waveshare400x300);
        recorder.clear();

        display.init(&mut recorder.delay()).unwrap();
        assert_eq!(recorder.bus_writes(), waveshare_init_writes());
        assert_eq!(recorder.delays(), vec![50, 20, 50, 200]);
    }

    #[test]
    fn test_init_reset_pulse() {
        let recorder = Recorder::new();
        let mut display = driver(&recorder, PanelModel::Waveshare400x300);
        recorder.clear();

        display.init(&mut recorder.delay()).unwrap();
        let events = recorder.events();
        assert_eq!(
            events[..6],
            [
                Event::Pin(Line::Reset, true),
                Event::DelayMs(50),
                Event::Pin(Line::Reset, false),
                Event::DelayMs(20),
                Event::Pin(Line::Reset, true),
                Event::DelayMs(50),
            ]
        );
    }

    #[test]
    fn test_init_settles_after_sleep_out() {
        let recorder = Recorder::new();
        let mut display = driver(&recorder, PanelModel::Waveshare400x300);
        recorder.clear();

        display.init(&mut recorder.delay()).unwrap();
        let events = recorder.events();
        let sleep_out = events
            .iter()
            .position(|event| *event == Event::Write(vec![0x11]))
            .unwrap();
        // opcode, flush, CS release, then the settle delay
        assert_eq!(events[sleep_out + 3], Event::DelayMs(200));
        assert_eq!(events[sleep_out + 4], Event::Pin(Line::Dc, false));
    }

    #[test]
    fn test_init_without_reset_line() {
        let recorder = Recorder::new();
        let mut display = St7305::without_reset(
            recorder.bus(),
            recorder.pin(Line::Dc),
            recorder.pin(Line::Cs),
            PanelConfig::from(PanelModel::Waveshare400x300),
        )
        .unwrap();
        recorder.clear();

        display.init(&mut recorder.delay()).unwrap();
        assert_eq!(recorder.delays(), vec![200]);
        assert!(!recorder
            .events()
            .iter()
            .any(|event| matches!(event, Event::Pin(Line::Reset, _))));
        assert_eq!(recorder.bus_writes(), waveshare_init_writes());
    }

    #[test]
    fn test_init_osptek_parameters() {
        let recorder = Recorder::new();
        let mut display = driver(&recorder, PanelModel::Osptek200x200);
        recorder.clear();

        display.init(&mut recorder.delay()).unwrap();
        let writes = recorder.bus_writes();
        let after = |opcode: u8| {
            let idx = writes.iter().position(|w| *w == [opcode]).unwrap();
            writes[idx + 1].clone()
        };
        assert_eq!(after(0xB0), vec![0x32]);
        assert_eq!(after(0x2A), vec![0x13, 0x25]);
        assert_eq!(after(0x2B), vec![0x00, 0x63]);
    }

    #[test]
    fn test_init_custom_parameters() {
        let recorder = Recorder::new();
        let config = PanelConfig::custom(240, 120, Orientation::Portrait)
            .unwrap()
            .with_address_window(AddressWindow::new(0x01, 0x02, 0x03, 0x04));
        let mut display = St7305::without_reset(
            recorder.bus(),
            recorder.pin(Line::Dc),
            recorder.pin(Line::Cs),
            config,
        )
        .unwrap();
        recorder.clear();

        display.init(&mut recorder.delay()).unwrap();
        let writes = recorder.bus_writes();
        assert_eq!(writes[27], vec![40]);
        assert_eq!(writes[41], vec![0x01, 0x02]);
        assert_eq!(writes[43], vec![0x03, 0x04]);
    }

    #[test]
    fn test_flush_fresh_buffer() {
        let recorder = Recorder::new();
        let mut display = driver(&recorder, PanelModel::Waveshare400x300);
        recorder.clear();

        display.flush().unwrap();
        assert_eq!(
            recorder.bus_writes(),
            vec![
                vec![0x38],
                vec![0x29],
                vec![0x2A],
                vec![0x12, 0x2A],
                vec![0x2B],
                vec![0x00, 0xC7],
                vec![0x2C],
                vec![0xFF; 15_000],
            ]
        );
    }

    #[test]
    fn test_flush_holds_chip_select() {
        let recorder = Recorder::new();
        let mut display = driver(&recorder, PanelModel::Waveshare400x300);
        recorder.clear();

        display.flush().unwrap();
        let events = recorder.events();
        let opcode = events
            .iter()
            .position(|event| *event == Event::Write(vec![0x2C]))
            .unwrap();
        assert_eq!(events[opcode - 2], Event::Pin(Line::Dc, false));
        assert_eq!(events[opcode - 1], Event::Pin(Line::Cs, false));
        assert_eq!(
            events[opcode..],
            [
                Event::Write(vec![0x2C]),
                Event::Flush,
                Event::Pin(Line::Dc, true),
                Event::Write(vec![0xFF; 15_000]),
                Event::Flush,
                Event::Pin(Line::Cs, true),
            ]
        );
    }

    #[test]
    fn test_flush_repeatable() {
        let recorder = Recorder::new();
        let mut display = driver(&recorder, PanelModel::Osptek200x200);
        recorder.clear();

        display.flush().unwrap();
        let first = recorder.events();
        recorder.clear();
        display.flush().unwrap();
        assert_eq!(recorder.events(), first);
    }

    #[test]
    fn test_flush_sends_drawn_pixels() {
        let recorder = Recorder::new();
        let mut display = driver(&recorder, PanelModel::Waveshare400x300);
        Rectangle::new(Point::new(0, 296), Size::new(2, 4))
            .into_styled(PrimitiveStyle::with_fill(BinaryColor::On))
            .draw(&mut display)
            .unwrap();
        display.set_pixel(2, 299, true);
        recorder.clear();

        display.flush().unwrap();
        let writes = recorder.bus_writes();
        let data = writes.last().unwrap();
        assert_eq!(data.len(), 15_000);
        assert_eq!(data[0], 0x00);
        assert_eq!(data[75], 0x7F);
        assert!(data[1..75].iter().all(|&b| b == 0xFF));
    }

    #[test]
    fn test_draw_target_forwarding() {
        let recorder = Recorder::new();
        let mut display = driver(&recorder, PanelModel::Osptek200x200);
        assert_eq!(display.size(), Size::new(200, 200));

        display.clear(BinaryColor::On).unwrap();
        assert!(display.framebuffer().as_bytes().iter().all(|&b| b == 0x00));
        display.fill(false);
        assert!(display.framebuffer().as_bytes().iter().all(|&b| b == 0xFF));

        display.framebuffer_mut().set_pixel(3, 1, true);
        assert_eq!(display.framebuffer().as_bytes()[0], 0xFE);
        assert_eq!(display.config().gate_lines(), 0x32);
    }

    #[test]
    fn test_power_commands() {
        let recorder = Recorder::new();
        let mut display = driver(&recorder, PanelModel::Waveshare400x300);
        let mut delay = recorder.delay();
        recorder.clear();

        display.sleep().unwrap();
        display.wake(&mut delay).unwrap();
        display.low_power_mode().unwrap();
        display.high_power_mode().unwrap();
        display.display_off().unwrap();
        display.display_on().unwrap();
        assert_eq!(
            recorder.bus_writes(),
            vec![
                vec![0x10],
                vec![0x11],
                vec![0x39],
                vec![0x38],
                vec![0x28],
                vec![0x29]
            ]
        );
        assert_eq!(recorder.delays(), vec![120]);
    }

    #[test]
    fn test_repeated_mode_toggles() {
        let recorder = Recorder::new();
        let mut display = driver(&recorder, PanelModel::Waveshare400x300);
        recorder.clear();

        display.low_power_mode().unwrap();
        display.low_power_mode().unwrap();
        assert_eq!(recorder.bus_writes(), vec![vec![0x39], vec![0x39]]);
    }

    #[test]
    fn test_bus_failure_propagates() {
        let recorder = Recorder::new();
        let mut display = St7305::new(
            FailingBus,
            recorder.pin(Line::Dc),
            recorder.pin(Line::Cs),
            Some(recorder.pin(Line::Reset)),
            PanelConfig::from(PanelModel::Waveshare400x300),
        )
        .unwrap();

        assert_eq!(display.init(&mut recorder.delay()), Err(Error::Bus));
        assert_eq!(display.flush(), Err(Error::Bus));
        assert_eq!(display.sleep(), Err(Error::Bus));
    }

    #[test]
    fn test_reset_failure_propagates() {
        let recorder = Recorder::new();
        let mut display = St7305::new(
            recorder.bus(),
            recorder.pin(Line::Dc),
            recorder.pin(Line::Cs),
            Some(FailingPin),
            PanelConfig::from(PanelModel::Waveshare400x300),
        )
        .unwrap();
        recorder.clear();

        assert_eq!(display.init(&mut recorder.delay()), Err(Error::Pin));
        assert!(recorder.bus_writes().is_empty());
    }

    #[test]
    fn test_release_returns_parts() {
        let recorder = Recorder::new();
        let display = driver(&recorder, PanelModel::Waveshare400x300);
        let (_spi, _dc, _cs, reset) = display.release();
        assert!(reset.is_some());
    }
}
