//! Pixel addressing for the ST7305 packed memory layout.
//!
//! The controller stores 8 pixels per byte, but the pixels of one byte are not
//! a horizontal run: each byte covers a small rectangular block of the panel.
//! Two block shapes are in use on shipping panels:
//!
//! - [`Orientation::Landscape`] packs a 2-column × 4-row block per byte. The
//!   vertical axis is addressed bottom-up: the row is complemented
//!   (`height - 1 - y`) before it is split into blocks.
//!
//!   ```text
//!            col0 col1
//!   row0      b7   b6
//!   row1      b5   b4
//!   row2      b3   b2
//!   row3      b1   b0
//!   ```
//!
//! - [`Orientation::Portrait`] packs a 4-column × 2-row block per byte and is
//!   addressed top-down.
//!
//!   ```text
//!            col0 col1 col2 col3
//!   row0      b7   b6   b5   b4
//!   row1      b3   b2   b1   b0
//!   ```
//!
//! Resolving a coordinate involves a handful of divisions, so
//! [`CoordinateMap`] precomputes the byte offset and bit mask of every pixel
//! once, turning each later pixel write into two table loads.

use alloc::vec::Vec;

use crate::{ConfigError, Error};

/// Smallest supported panel extent, in pixels, on either axis.
pub const MIN_DIMENSION: u16 = 8;

/// Largest framebuffer the 16-bit offset table can address, in bytes.
pub const MAX_BUFFER_SIZE: usize = u16::MAX as usize + 1;

/// Block-packing scheme used by the panel's controller RAM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Orientation {
    /// 2 columns × 4 rows per byte, rows addressed from the bottom.
    Landscape,
    /// 4 columns × 2 rows per byte, rows addressed from the top.
    Portrait,
}

impl Orientation {
    /// Returns the `(columns, rows)` covered by one byte of the buffer.
    #[must_use]
    pub const fn block_size(self) -> (u16, u16) {
        match self {
            Orientation::Landscape => (2, 4),
            Orientation::Portrait => (4, 2),
        }
    }

    /// Computes where pixel `(x, y)` lives in the packed buffer of a
    /// `width` × `height` panel.
    ///
    /// The geometry must be validated and the coordinate inside the panel.
    /// This is the formula the lookup tables are built from.
    pub(crate) const fn locate(self, width: u16, height: u16, x: u16, y: u16) -> PixelLocation {
        let (offset, bit) = match self {
            Orientation::Landscape => {
                let inv_y = height - 1 - y;
                let offset = (x as usize >> 1) * (height as usize >> 2) + (inv_y as usize >> 2);
                let bit = 7 - (((inv_y & 3) << 1) | (x & 1));
                (offset, bit)
            }
            Orientation::Portrait => {
                let offset = (y as usize >> 1) * (width as usize >> 2) + (x as usize >> 2);
                let bit = 7 - ((y & 1) * 4 + (x & 3));
                (offset, bit)
            }
        };
        PixelLocation {
            offset: offset as u16,
            mask: 1 << bit,
        }
    }
}

impl core::fmt::Display for Orientation {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Orientation::Landscape => f.write_str("landscape"),
            Orientation::Portrait => f.write_str("portrait"),
        }
    }
}

/// Byte offset and bit mask of a single pixel inside the packed buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PixelLocation {
    /// Index of the byte holding the pixel.
    pub offset: u16,
    /// Single-bit mask selecting the pixel within that byte.
    pub mask: u8,
}

/// Validated panel shape.
///
/// Outside this crate a `PanelGeometry` can only be obtained through
/// [`PanelGeometry::new`] or a panel preset, so every instance satisfies the
/// block-alignment rules and its buffer fits the 16-bit offset table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PanelGeometry {
    width: u16,
    height: u16,
    orientation: Orientation,
}

impl PanelGeometry {
    /// Validates and creates a panel geometry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when either extent is below
    /// [`MIN_DIMENSION`], is not a multiple of the orientation's block size, or
    /// when the resulting buffer exceeds [`MAX_BUFFER_SIZE`].
    ///
    /// # Example
    /// ```rust
    /// use st7305_rlcd::{Orientation, PanelGeometry};
    ///
    /// let geometry = PanelGeometry::new(400, 300, Orientation::Landscape).unwrap();
    /// assert_eq!(geometry.buffer_size(), 15_000);
    ///
    /// // 302 rows cannot be split into 4-row blocks
    /// assert!(PanelGeometry::new(400, 302, Orientation::Landscape).is_err());
    /// ```
    pub fn new(width: u16, height: u16, orientation: Orientation) -> Result<Self, Error> {
        if width < MIN_DIMENSION || height < MIN_DIMENSION {
            return Err(ConfigError::TooSmall { width, height }.into());
        }
        let (block_cols, block_rows) = orientation.block_size();
        if width % block_cols != 0 || height % block_rows != 0 {
            return Err(ConfigError::Misaligned {
                width,
                height,
                orientation,
            }
            .into());
        }
        let size = width as usize * height as usize / 8;
        if size > MAX_BUFFER_SIZE {
            return Err(ConfigError::BufferTooLarge { size }.into());
        }
        Ok(Self {
            width,
            height,
            orientation,
        })
    }

    /// Builds a geometry for dimensions known to pass [`PanelGeometry::new`].
    pub(crate) const fn preset(width: u16, height: u16, orientation: Orientation) -> Self {
        Self {
            width,
            height,
            orientation,
        }
    }

    /// Panel width in pixels.
    #[must_use]
    pub const fn width(&self) -> u16 {
        self.width
    }

    /// Panel height in pixels.
    #[must_use]
    pub const fn height(&self) -> u16 {
        self.height
    }

    /// Block-packing scheme of the panel.
    #[must_use]
    pub const fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Number of pixels on the panel.
    #[must_use]
    pub const fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Size of the packed framebuffer in bytes.
    #[must_use]
    pub const fn buffer_size(&self) -> usize {
        self.pixel_count() / 8
    }

    /// Returns `true` when `(x, y)` lies on the panel.
    #[must_use]
    pub const fn contains(&self, x: u16, y: u16) -> bool {
        x < self.width && y < self.height
    }

    /// Computes where pixel `(x, y)` lives in the packed buffer, or `None`
    /// when the pixel is off the panel.
    ///
    /// This evaluates the packing formula directly; [`CoordinateMap`] caches
    /// the same result for every pixel.
    ///
    /// # Example
    /// ```rust
    /// use st7305_rlcd::{Orientation, PanelGeometry, PixelLocation};
    ///
    /// let geometry = PanelGeometry::new(400, 300, Orientation::Landscape).unwrap();
    /// assert_eq!(geometry.locate(0, 299), Some(PixelLocation { offset: 0, mask: 0x80 }));
    /// assert_eq!(geometry.locate(0, 300), None);
    /// ```
    #[must_use]
    pub const fn locate(&self, x: u16, y: u16) -> Option<PixelLocation> {
        if !self.contains(x, y) {
            return None;
        }
        Some(self.orientation.locate(self.width, self.height, x, y))
    }
}

/// Precomputed pixel → (byte, bit) tables for one panel geometry.
///
/// Both tables are indexed by `x * height + y`.
#[derive(Clone)]
pub struct CoordinateMap {
    geometry: PanelGeometry,
    offsets: Vec<u16>,
    masks: Vec<u8>,
}

impl CoordinateMap {
    /// Builds the lookup tables for `geometry`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Allocation`] when either table cannot be allocated.
    pub fn new(geometry: PanelGeometry) -> Result<Self, Error> {
        let pixels = geometry.pixel_count();
        let mut offsets = Vec::new();
        offsets
            .try_reserve_exact(pixels)
            .map_err(|_| Error::Allocation)?;
        let mut masks = Vec::new();
        masks
            .try_reserve_exact(pixels)
            .map_err(|_| Error::Allocation)?;

        let width = geometry.width();
        let height = geometry.height();
        let orientation = geometry.orientation();
        debug!(
            "building {}x{} pixel tables ({:?})",
            width, height, orientation
        );
        // column-major to match the index layout
        for x in 0..width {
            for y in 0..height {
                let location = orientation.locate(width, height, x, y);
                offsets.push(location.offset);
                masks.push(location.mask);
            }
        }

        Ok(Self {
            geometry,
            offsets,
            masks,
        })
    }

    /// Geometry the tables were built for.
    #[must_use]
    pub const fn geometry(&self) -> &PanelGeometry {
        &self.geometry
    }

    /// Looks up the buffer location of `(x, y)`, or `None` when the pixel is
    /// off the panel.
    #[inline]
    #[must_use]
    pub fn resolve(&self, x: u16, y: u16) -> Option<PixelLocation> {
        if !self.geometry.contains(x, y) {
            return None;
        }
        let idx = x as usize * self.geometry.height() as usize + y as usize;
        Some(PixelLocation {
            offset: self.offsets[idx],
            mask: self.masks[idx],
        })
    }
}

impl core::fmt::Debug for CoordinateMap {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CoordinateMap")
            .field("geometry", &self.geometry)
            .field("entries", &self.offsets.len())
            .finish_non_exhaustive()
    }
}
