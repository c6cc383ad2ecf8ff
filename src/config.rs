//! Panel presets and custom panel parameters.
//!
//! Everything that differs between ST7305 panels is captured in a
//! [`PanelConfig`]: the pixel geometry, the controller-side address window and
//! the gate line setting. The bring-up table itself is shared by all panels.

use crate::geometry::{Orientation, PanelGeometry};
use crate::{ConfigError, Error};

/// Controller RAM window targeted by memory writes.
///
/// Sent with the column (0x2A) and row (0x2B) address commands during
/// bring-up and again before every flush.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AddressWindow {
    /// First source column group.
    pub column_start: u8,
    /// Last source column group.
    pub column_end: u8,
    /// First gate row group.
    pub row_start: u8,
    /// Last gate row group.
    pub row_end: u8,
}

impl AddressWindow {
    /// Creates a window from its column and row bounds.
    #[must_use]
    pub const fn new(column_start: u8, column_end: u8, row_start: u8, row_end: u8) -> Self {
        Self {
            column_start,
            column_end,
            row_start,
            row_end,
        }
    }

    /// Parameter bytes of the column address command.
    #[must_use]
    pub const fn columns(&self) -> [u8; 2] {
        [self.column_start, self.column_end]
    }

    /// Parameter bytes of the row address command.
    #[must_use]
    pub const fn rows(&self) -> [u8; 2] {
        [self.row_start, self.row_end]
    }
}

/// Panels with known-good parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PanelModel {
    /// Waveshare ESP32-S3-RLCD-4.2 (also `GooDisplay` GDTL042T71), 400×300,
    /// landscape packing.
    Waveshare400x300,
    /// Osptek YDP154H008, 200×200, portrait packing.
    Osptek200x200,
}

impl PanelModel {
    /// Human readable panel name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            PanelModel::Waveshare400x300 => "Waveshare 400x300",
            PanelModel::Osptek200x200 => "Osptek 200x200",
        }
    }
}

/// Window used by the Waveshare 4.2" panel and as the default for custom
/// panels.
const WAVESHARE_WINDOW: AddressWindow = AddressWindow::new(0x12, 0x2A, 0x00, 0xC7);

/// Estimated from the panel size; no vendor reference exists for it.
const OSPTEK_WINDOW: AddressWindow = AddressWindow::new(0x13, 0x25, 0x00, 0x63);

/// Everything the driver needs to know about a panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PanelConfig {
    geometry: PanelGeometry,
    window: AddressWindow,
    gate_lines: u8,
}

impl PanelConfig {
    /// Describes a panel that is not one of the [`PanelModel`] presets.
    ///
    /// The address window defaults to the Waveshare 4.2" window and the gate
    /// line setting to `height / 3`; override them with
    /// [`with_address_window`](Self::with_address_window) and
    /// [`with_gate_lines`](Self::with_gate_lines).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when the geometry is invalid or `height / 3`
    /// does not fit in the one-byte gate line register.
    ///
    /// # Example
    /// ```rust
    /// use st7305_rlcd::{AddressWindow, Orientation, PanelConfig};
    ///
    /// let config = PanelConfig::custom(300, 400, Orientation::Portrait)
    ///     .unwrap()
    ///     .with_address_window(AddressWindow::new(0x10, 0x30, 0x00, 0xC7));
    /// assert_eq!(config.gate_lines(), 133);
    /// ```
    pub fn custom(width: u16, height: u16, orientation: Orientation) -> Result<Self, Error> {
        let geometry = PanelGeometry::new(width, height, orientation)?;
        let gate_lines =
            u8::try_from(height / 3).map_err(|_| ConfigError::GateLinesOutOfRange { height })?;
        Ok(Self {
            geometry,
            window: WAVESHARE_WINDOW,
            gate_lines,
        })
    }

    /// Replaces the controller address window.
    #[must_use]
    pub const fn with_address_window(mut self, window: AddressWindow) -> Self {
        self.window = window;
        self
    }

    /// Replaces the gate line setting (register 0xB0).
    #[must_use]
    pub const fn with_gate_lines(mut self, gate_lines: u8) -> Self {
        self.gate_lines = gate_lines;
        self
    }

    /// Pixel geometry of the panel.
    #[must_use]
    pub const fn geometry(&self) -> PanelGeometry {
        self.geometry
    }

    /// Controller address window of the panel.
    #[must_use]
    pub const fn address_window(&self) -> AddressWindow {
        self.window
    }

    /// Gate line setting sent with register 0xB0.
    #[must_use]
    pub const fn gate_lines(&self) -> u8 {
        self.gate_lines
    }
}

impl From<PanelModel> for PanelConfig {
    fn from(model: PanelModel) -> Self {
        // preset dimensions are block aligned, so the geometry is built directly
        let (geometry, window, gate_lines) = match model {
            PanelModel::Waveshare400x300 => (
                PanelGeometry::preset(400, 300, Orientation::Landscape),
                WAVESHARE_WINDOW,
                0x64, // 100 * 3 = 300 lines
            ),
            PanelModel::Osptek200x200 => (
                PanelGeometry::preset(200, 200, Orientation::Portrait),
                OSPTEK_WINDOW,
                0x32, // 50 * 4 = 200 lines
            ),
        };
        Self {
            geometry,
            window,
            gate_lines,
        }
    }
}
