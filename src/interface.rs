//! SPI transport with separate data/command and chip-select lines.
//!
//! Every command is its own transaction: DC is driven, CS is asserted, the
//! bytes are written and the bus is flushed before CS is released. A memory
//! write keeps CS asserted from the opcode through the last data byte, which
//! is why the interface drives CS itself instead of relying on an
//! `SpiDevice`.

use core::convert::Infallible;

use embedded_hal::digital::{ErrorType, OutputPin};
use embedded_hal::spi::SpiBus;

use crate::command::Instruction;
use crate::Error;

/// Stand-in for an unconnected reset line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NoResetPin;

impl ErrorType for NoResetPin {
    type Error = Infallible;
}

impl OutputPin for NoResetPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Owns the SPI bus and the DC and CS lines of one panel.
#[derive(Debug)]
pub struct SpiInterface<SPI, DC, CS> {
    spi: SPI,
    dc: DC,
    cs: CS,
}

impl<SPI, DC, CS> SpiInterface<SPI, DC, CS>
where
    SPI: SpiBus<u8>,
    DC: OutputPin,
    CS: OutputPin,
{
    /// Wraps the bus and lines. CS is released and DC left in data mode.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Pin`] when either line cannot be driven.
    pub fn new(spi: SPI, mut dc: DC, mut cs: CS) -> Result<Self, Error> {
        cs.set_high().map_err(|_| Error::Pin)?;
        dc.set_high().map_err(|_| Error::Pin)?;
        Ok(Self { spi, dc, cs })
    }

    /// Sends a bare opcode.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Bus`] or [`Error::Pin`] on transport failure.
    pub fn send_command(&mut self, instruction: Instruction) -> Result<(), Error> {
        trace!("command {:#x}", instruction.opcode());
        self.dc.set_low().map_err(|_| Error::Pin)?;
        self.transaction(&[instruction.opcode()])
    }

    /// Sends parameter bytes as one data transaction.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Bus`] or [`Error::Pin`] on transport failure.
    pub fn send_data(&mut self, data: &[u8]) -> Result<(), Error> {
        self.dc.set_high().map_err(|_| Error::Pin)?;
        self.transaction(data)
    }

    /// Sends an opcode followed by its parameters. Empty `data` sends the
    /// opcode alone.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Bus`] or [`Error::Pin`] on transport failure.
    pub fn command_with_data(
        &mut self,
        instruction: Instruction,
        data: &[u8],
    ) -> Result<(), Error> {
        self.send_command(instruction)?;
        if data.is_empty() {
            return Ok(());
        }
        self.send_data(data)
    }

    /// Sends `instruction` followed by `data` with CS held low throughout.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Bus`] or [`Error::Pin`] on transport failure. CS is
    /// released even when the bus fails.
    pub fn write_memory(&mut self, instruction: Instruction, data: &[u8]) -> Result<(), Error> {
        trace!(
            "memory write {:#x}, {} bytes",
            instruction.opcode(),
            data.len()
        );
        self.dc.set_low().map_err(|_| Error::Pin)?;
        self.cs.set_low().map_err(|_| Error::Pin)?;
        let result = self.stream(instruction.opcode(), data);
        self.cs.set_high().map_err(|_| Error::Pin)?;
        result
    }

    /// Returns the bus and lines.
    pub fn release(self) -> (SPI, DC, CS) {
        (self.spi, self.dc, self.cs)
    }

    fn stream(&mut self, opcode: u8, data: &[u8]) -> Result<(), Error> {
        self.spi.write(&[opcode]).map_err(|_| Error::Bus)?;
        self.spi.flush().map_err(|_| Error::Bus)?;
        self.dc.set_high().map_err(|_| Error::Pin)?;
        self.spi.write(data).map_err(|_| Error::Bus)?;
        self.spi.flush().map_err(|_| Error::Bus)
    }

    fn transaction(&mut self, bytes: &[u8]) -> Result<(), Error> {
        self.cs.set_low().map_err(|_| Error::Pin)?;
        let result = self
            .spi
            .write(bytes)
            .and_then(|()| self.spi.flush())
            .map_err(|_| Error::Bus);
        self.cs.set_high().map_err(|_| Error::Pin)?;
        result
    }
}
