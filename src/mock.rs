//! Recording bus, pin and delay doubles for wire-level tests.

extern crate std;

use core::cell::RefCell;
use core::convert::Infallible;

use std::rc::Rc;
use std::vec::Vec;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{self, OutputPin};
use embedded_hal::spi::{self, SpiBus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Line {
    Dc,
    Cs,
    Reset,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Write(Vec<u8>),
    Flush,
    Pin(Line, bool),
    DelayMs(u32),
    DelayNs(u32),
}

/// Shared, ordered log of everything the doubles observe.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    events: Rc<RefCell<Vec<Event>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bus(&self) -> MockBus {
        MockBus {
            events: self.events.clone(),
        }
    }

    pub fn pin(&self, line: Line) -> MockPin {
        MockPin {
            line,
            events: self.events.clone(),
        }
    }

    pub fn delay(&self) -> MockDelay {
        MockDelay {
            events: self.events.clone(),
        }
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.borrow().clone()
    }

    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }

    /// Every buffer written to the bus, in order.
    pub fn bus_writes(&self) -> Vec<Vec<u8>> {
        self.events
            .borrow()
            .iter()
            .filter_map(|event| match event {
                Event::Write(bytes) => Some(bytes.clone()),
                _ => None,
            })
            .collect()
    }

    /// Every millisecond delay, in order.
    pub fn delays(&self) -> Vec<u32> {
        self.events
            .borrow()
            .iter()
            .filter_map(|event| match event {
                Event::DelayMs(ms) => Some(*ms),
                _ => None,
            })
            .collect()
    }

    fn push(events: &RefCell<Vec<Event>>, event: Event) {
        events.borrow_mut().push(event);
    }
}

#[derive(Debug)]
pub struct MockBus {
    events: Rc<RefCell<Vec<Event>>>,
}

impl spi::ErrorType for MockBus {
    type Error = Infallible;
}

impl SpiBus<u8> for MockBus {
    fn read(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        words.fill(0);
        Ok(())
    }

    fn write(&mut self, words: &[u8]) -> Result<(), Self::Error> {
        Recorder::push(&self.events, Event::Write(words.to_vec()));
        Ok(())
    }

    fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Result<(), Self::Error> {
        read.fill(0);
        self.write(write)
    }

    fn transfer_in_place(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        Recorder::push(&self.events, Event::Write(words.to_vec()));
        words.fill(0);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Recorder::push(&self.events, Event::Flush);
        Ok(())
    }
}

#[derive(Debug)]
pub struct MockPin {
    line: Line,
    events: Rc<RefCell<Vec<Event>>>,
}

impl digital::ErrorType for MockPin {
    type Error = Infallible;
}

impl OutputPin for MockPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        Recorder::push(&self.events, Event::Pin(self.line, false));
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        Recorder::push(&self.events, Event::Pin(self.line, true));
        Ok(())
    }
}

#[derive(Debug)]
pub struct MockDelay {
    events: Rc<RefCell<Vec<Event>>>,
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        Recorder::push(&self.events, Event::DelayNs(ns));
    }

    fn delay_ms(&mut self, ms: u32) {
        Recorder::push(&self.events, Event::DelayMs(ms));
    }
}

/// Bus whose every operation fails.
#[derive(Debug, Default)]
pub struct FailingBus;

impl spi::ErrorType for FailingBus {
    type Error = spi::ErrorKind;
}

impl SpiBus<u8> for FailingBus {
    fn read(&mut self, _words: &mut [u8]) -> Result<(), Self::Error> {
        Err(spi::ErrorKind::Other)
    }

    fn write(&mut self, _words: &[u8]) -> Result<(), Self::Error> {
        Err(spi::ErrorKind::Other)
    }

    fn transfer(&mut self, _read: &mut [u8], _write: &[u8]) -> Result<(), Self::Error> {
        Err(spi::ErrorKind::Other)
    }

    fn transfer_in_place(&mut self, _words: &mut [u8]) -> Result<(), Self::Error> {
        Err(spi::ErrorKind::Other)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Err(spi::ErrorKind::Other)
    }
}

/// Pin that can never be driven.
#[derive(Debug, Default)]
pub struct FailingPin;

impl digital::ErrorType for FailingPin {
    type Error = digital::ErrorKind;
}

impl OutputPin for FailingPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        Err(digital::ErrorKind::Other)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        Err(digital::ErrorKind::Other)
    }
}
