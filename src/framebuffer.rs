//! Packed 1-bit framebuffer in the controller's native layout.
//!
//! The buffer is kept exactly as the controller expects it on the wire, so a
//! flush is a single memory write of [`FrameBuffer::as_bytes`]. A set bit is a
//! white pixel, a cleared bit is black.

use alloc::vec::Vec;
use core::convert::Infallible;

use embedded_dma::ReadBuffer;
use embedded_graphics::draw_target::DrawTarget;
use embedded_graphics::geometry::Dimensions;
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::{OriginDimensions, Size};
use embedded_graphics::primitives::{PointsIter, Rectangle};
use embedded_graphics::Pixel;

use crate::geometry::{CoordinateMap, PanelGeometry};
use crate::{Color, Error};

/// Byte value of eight white pixels.
const WHITE: u8 = 0xFF;
/// Byte value of eight black pixels.
const BLACK: u8 = 0x00;

/// Framebuffer for one ST7305 panel.
///
/// Owns the packed pixel bytes and the [`CoordinateMap`] used to address
/// them. Both are allocated once in [`FrameBuffer::new`] and never resized.
#[derive(Clone)]
pub struct FrameBuffer {
    map: CoordinateMap,
    buffer: Vec<u8>,
}

impl FrameBuffer {
    /// Allocates an all-white framebuffer and its lookup tables.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Allocation`] when the buffer or the tables cannot be
    /// allocated.
    ///
    /// # Example
    /// ```rust
    /// use st7305_rlcd::{FrameBuffer, Orientation, PanelGeometry};
    ///
    /// let geometry = PanelGeometry::new(200, 200, Orientation::Portrait).unwrap();
    /// let mut framebuffer = FrameBuffer::new(geometry).unwrap();
    /// framebuffer.set_pixel(3, 1, true);
    /// assert_eq!(framebuffer.as_bytes()[0], 0xFE);
    /// ```
    pub fn new(geometry: PanelGeometry) -> Result<Self, Error> {
        let size = geometry.buffer_size();
        let mut buffer = Vec::new();
        buffer
            .try_reserve_exact(size)
            .map_err(|_| Error::Allocation)?;
        buffer.resize(size, WHITE);
        let map = CoordinateMap::new(geometry)?;
        Ok(Self { map, buffer })
    }

    /// Sets (`on`, black) or clears (white) one pixel.
    ///
    /// Coordinates outside the panel, including negative ones, are ignored.
    #[inline]
    pub fn set_pixel(&mut self, x: i32, y: i32, on: bool) {
        let (Ok(x), Ok(y)) = (u16::try_from(x), u16::try_from(y)) else {
            return;
        };
        let Some(location) = self.map.resolve(x, y) else {
            return;
        };
        let byte = &mut self.buffer[location.offset as usize];
        if on {
            *byte &= !location.mask;
        } else {
            *byte |= location.mask;
        }
    }

    /// Returns `Some(true)` for a black pixel, `Some(false)` for a white one
    /// and `None` off the panel.
    #[must_use]
    pub fn pixel(&self, x: u16, y: u16) -> Option<bool> {
        let location = self.map.resolve(x, y)?;
        Some((self.buffer[location.offset as usize] & location.mask) == 0)
    }

    /// Sets every pixel black (`on`) or white.
    pub fn fill(&mut self, on: bool) {
        self.buffer.fill(if on { BLACK } else { WHITE });
    }

    /// Packed bytes in controller order.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Geometry of the panel the buffer was built for.
    #[must_use]
    pub fn geometry(&self) -> &PanelGeometry {
        self.map.geometry()
    }

    /// Panel width in pixels.
    #[must_use]
    pub fn width(&self) -> u16 {
        self.geometry().width()
    }

    /// Panel height in pixels.
    #[must_use]
    pub fn height(&self) -> u16 {
        self.geometry().height()
    }
}

impl OriginDimensions for FrameBuffer {
    fn size(&self) -> Size {
        Size::new(u32::from(self.width()), u32::from(self.height()))
    }
}

impl DrawTarget for FrameBuffer {
    type Color = Color;

    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            self.set_pixel(point.x, point.y, color.is_on());
        }
        Ok(())
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        let bounds = self.bounding_box();
        let area = area.intersection(&bounds);
        if area == bounds {
            return self.clear(color);
        }
        self.draw_iter(area.points().map(|point| Pixel(point, color)))
    }

    fn clear(&mut self, color: BinaryColor) -> Result<(), Self::Error> {
        self.fill(color.is_on());
        Ok(())
    }
}

unsafe impl ReadBuffer for FrameBuffer {
    type Word = u8;

    unsafe fn read_buffer(&self) -> (*const u8, usize) {
        (self.buffer.as_ptr(), self.buffer.len())
    }
}

unsafe impl ReadBuffer for &mut FrameBuffer {
    type Word = u8;

    unsafe fn read_buffer(&self) -> (*const u8, usize) {
        (self.buffer.as_ptr(), self.buffer.len())
    }
}

impl core::fmt::Debug for FrameBuffer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FrameBuffer")
            .field("geometry", self.geometry())
            .field("size", &self.buffer.len())
            .finish_non_exhaustive()
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for FrameBuffer {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "FrameBuffer {}x{} {} size: {}",
            self.width(),
            self.height(),
            self.geometry().orientation(),
            self.buffer.len()
        );
    }
}
