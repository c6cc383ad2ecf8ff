//! Framebuffer and SPI driver for ST7305 monochrome reflective LCD panels.
//!
//! ## How the ST7305 Stores Pixels
//!
//! The ST7305 drives 1-bit reflective (memory-in-pixel style) LCD panels. Its
//! display RAM holds one bit per pixel, eight pixels per byte, but a byte does
//! not describe a horizontal run of pixels. Instead every byte covers a small
//! rectangular block, and the shape of that block depends on how the glass is
//! wired to the controller:
//!
//! - **Landscape** panels (e.g. the Waveshare 4.2" 400×300) pack 2 columns ×
//!   4 rows per byte and scan rows from the *bottom* of the panel up.
//! - **Portrait** panels (e.g. the Osptek 1.54" 200×200) pack 4 columns ×
//!   2 rows per byte and scan rows top-down.
//!
//! A bit value of `1` is a white (off) pixel and `0` is a black (on) pixel.
//!
//! Getting the block shape or the scan direction wrong does not fail loudly,
//! it just produces a scrambled or upside-down image, so the mapping lives in
//! one place ([`geometry`]) and is covered by exhaustive tests.
//!
//! ### Signal names
//! - **SCL / SDA** – SPI clock and data (mode 0, MSB first, up to 10 MHz)
//! - **CS** – Chip select (active LOW); must stay LOW for a command byte and
//!   all of its data bytes
//! - **DC** – Data/command select: LOW for a command byte, HIGH for data
//! - **RST** – Optional hardware reset (active LOW)
//!
//! ## Crate Layout
//!
//! 1. [`geometry`] – validated panel shapes and the precomputed
//!    pixel → (byte, bit) [`CoordinateMap`]
//! 2. [`framebuffer`] – the packed [`FrameBuffer`], an `embedded-graphics`
//!    [`DrawTarget`] with O(1) pixel writes
//! 3. [`command`], [`interface`] and [`driver`] – the controller instruction
//!    set, the bring-up table, and the [`St7305`] driver that resets, brings
//!    up, and flushes the panel over `embedded-hal` SPI
//!
//! Panel presets and custom panel parameters are described by
//! [`PanelConfig`] (see [`config`]).
//!
//! ## Example
//! ```rust
//! use embedded_graphics::pixelcolor::BinaryColor;
//! use embedded_graphics::prelude::*;
//! use embedded_graphics::primitives::{Circle, PrimitiveStyle};
//! use st7305_rlcd::{FrameBuffer, PanelConfig, PanelModel};
//!
//! let config = PanelConfig::from(PanelModel::Waveshare400x300);
//! let mut framebuffer = FrameBuffer::new(config.geometry()).unwrap();
//!
//! Circle::new(Point::new(150, 100), 100)
//!     .into_styled(PrimitiveStyle::with_fill(BinaryColor::On))
//!     .draw(&mut framebuffer)
//!     .unwrap();
//!
//! assert_eq!(framebuffer.as_bytes().len(), 15_000);
//! ```
//!
//! ## Available Feature Flags
//!
//! ### `defmt` Feature
//! Implements `defmt::Format` for the public types and routes the driver's
//! internal logging to `defmt`.
//!
//! ### `log` Feature
//! Routes the driver's internal logging to the `log` facade. Ignored when
//! `defmt` is also enabled.
#![no_std]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]

extern crate alloc;

// must stay first so the logging macros are visible to the other modules
mod fmt;

pub mod command;
pub mod config;
pub mod driver;
pub mod framebuffer;
pub mod geometry;
pub mod interface;

#[cfg(test)]
mod mock;

use embedded_graphics::pixelcolor::BinaryColor;

pub use config::{AddressWindow, PanelConfig, PanelModel};
pub use driver::St7305;
pub use embedded_graphics::draw_target::DrawTarget;
pub use framebuffer::FrameBuffer;
pub use geometry::{CoordinateMap, Orientation, PanelGeometry, PixelLocation};
pub use interface::{NoResetPin, SpiInterface};

/// Color type used in the framebuffer.
///
/// [`BinaryColor::On`] is a black (set) pixel, [`BinaryColor::Off`] is white.
pub type Color = BinaryColor;

/// Errors reported by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// The panel configuration was rejected before anything was allocated.
    Config(ConfigError),
    /// The framebuffer or the pixel lookup tables could not be allocated.
    Allocation,
    /// The SPI bus reported a failure.
    Bus,
    /// A DC, CS or reset line could not be driven.
    Pin,
}

/// Reasons a panel configuration is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Width or height is below [`geometry::MIN_DIMENSION`].
    TooSmall {
        /// Requested width.
        width: u16,
        /// Requested height.
        height: u16,
    },
    /// Width or height is not a whole number of packing blocks.
    Misaligned {
        /// Requested width.
        width: u16,
        /// Requested height.
        height: u16,
        /// Orientation whose block size was violated.
        orientation: Orientation,
    },
    /// The packed buffer would not be addressable with 16-bit offsets.
    BufferTooLarge {
        /// Buffer size the geometry would need, in bytes.
        size: usize,
    },
    /// The gate line setting derived from the height does not fit in a byte.
    GateLinesOutOfRange {
        /// Requested height.
        height: u16,
    },
}

impl From<ConfigError> for Error {
    fn from(error: ConfigError) -> Self {
        Error::Config(error)
    }
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ConfigError::TooSmall { width, height } => write!(
                f,
                "panel {width}x{height} is smaller than {min}x{min}",
                min = geometry::MIN_DIMENSION
            ),
            ConfigError::Misaligned {
                width,
                height,
                orientation,
            } => {
                let (cols, rows) = orientation.block_size();
                write!(
                    f,
                    "panel {width}x{height} does not align to {cols}x{rows} {orientation} blocks"
                )
            }
            ConfigError::BufferTooLarge { size } => write!(
                f,
                "framebuffer of {size} bytes exceeds {} bytes",
                geometry::MAX_BUFFER_SIZE
            ),
            ConfigError::GateLinesOutOfRange { height } => {
                write!(f, "gate lines for height {height} exceed 255")
            }
        }
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::Config(error) => write!(f, "invalid panel configuration: {error}"),
            Error::Allocation => f.write_str("framebuffer allocation failed"),
            Error::Bus => f.write_str("SPI bus error"),
            Error::Pin => f.write_str("GPIO pin error"),
        }
    }
}

impl core::error::Error for ConfigError {}

impl core::error::Error for Error {}
