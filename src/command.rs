//! ST7305 instruction set and the panel bring-up table.
//!
//! The bring-up sequence is plain data: a list of [`Step`]s, each an
//! instruction, its parameters and an optional settle delay. Parameters that
//! differ between panels are [`Params`] placeholders filled in from the
//! [`PanelConfig`] when the step is sent.

use bitfield::bitfield;

use crate::config::PanelConfig;

/// Controller instructions used by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Instruction {
    /// Sleep in.
    SleepIn = 0x10,
    /// Sleep out; the controller needs a settle delay afterwards.
    SleepOut = 0x11,
    /// Display inversion on.
    InversionOn = 0x21,
    /// Display off. RAM content is retained.
    DisplayOff = 0x28,
    /// Display on.
    DisplayOn = 0x29,
    /// Column address window.
    ColumnAddress = 0x2A,
    /// Row address window.
    RowAddress = 0x2B,
    /// Memory write; followed by the packed framebuffer.
    MemoryWrite = 0x2C,
    /// Tearing effect line on.
    TearingEffectOn = 0x35,
    /// Memory data access control (MADCTL).
    MemoryAccess = 0x36,
    /// High power mode.
    HighPowerMode = 0x38,
    /// Low power mode.
    LowPowerMode = 0x39,
    /// Data format select.
    DataFormat = 0x3A,
    /// Gate timing control.
    GateTiming = 0x62,
    /// Gate line setting.
    GateLines = 0xB0,
    /// Frame rate control.
    FrameRate = 0xB2,
    /// Gate EQ control, high power mode.
    GateEqHigh = 0xB3,
    /// Gate EQ control, low power mode.
    GateEqLow = 0xB4,
    /// Source EQ enable.
    SourceEq = 0xB7,
    /// Panel setting.
    PanelSetting = 0xB8,
    /// Gamma mode setting.
    GammaMode = 0xB9,
    /// Gate voltage (VGH/VGL) setting.
    GateVoltage = 0xC0,
    /// Positive source voltage, high power mode.
    SourceHighPositive = 0xC1,
    /// Positive source voltage, low power mode.
    SourceLowPositive = 0xC2,
    /// Negative source voltage, high power mode.
    SourceHighNegative = 0xC4,
    /// Negative source voltage, low power mode.
    SourceLowNegative = 0xC5,
    /// Source voltage select.
    SourceVoltageSelect = 0xC9,
    /// Auto power down control.
    AutoPowerDown = 0xD0,
    /// Booster enable.
    BoosterEnable = 0xD1,
    /// NVM load control.
    NvmLoad = 0xD6,
    /// Oscillator setting.
    Oscillator = 0xD8,
}

impl Instruction {
    /// Opcode byte sent with DC low.
    #[must_use]
    pub const fn opcode(self) -> u8 {
        self as u8
    }
}

bitfield! {
    /// Memory data access control (MADCTL, 0x36) register.
    ///
    /// The bit layout is as follows:
    /// - Bit 7: Row address order (MY)
    /// - Bit 6: Column address order (MX)
    /// - Bit 5: Row/column exchange (MV)
    /// - Bit 3: Data order (DO)
    /// - Bit 2: Gate scan order (GS)
    #[derive(Clone, Copy, Default, PartialEq, Eq)]
    #[repr(transparent)]
    pub struct MemoryAccess(u8);
    impl Debug;
    /// MY
    pub row_order, set_row_order: 7;
    /// MX
    pub column_order, set_column_order: 6;
    /// MV
    pub exchange, set_exchange: 5;
    /// DO
    pub data_order, set_data_order: 3;
    /// GS
    pub gate_order, set_gate_order: 2;
}

impl MemoryAccess {
    /// Mirrored columns with reversed data order, as the packing tables
    /// expect (0x48).
    #[must_use]
    pub fn packed() -> Self {
        let mut value = Self(0);
        value.set_column_order(true);
        value.set_data_order(true);
        value
    }

    /// Raw register value.
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }
}

bitfield! {
    /// Data format select (0x3A) register.
    ///
    /// The bit layout is as follows:
    /// - Bit 4: Extended data enable (XDE)
    /// - Bit 0: One bit per pixel (BPS)
    #[derive(Clone, Copy, Default, PartialEq, Eq)]
    #[repr(transparent)]
    pub struct DataFormat(u8);
    impl Debug;
    /// XDE
    pub extended, set_extended: 4;
    /// BPS
    pub one_bit, set_one_bit: 0;
}

impl DataFormat {
    /// 1-bit monochrome format (0x11).
    #[must_use]
    pub fn monochrome() -> Self {
        let mut value = Self(0);
        value.set_extended(true);
        value.set_one_bit(true);
        value
    }

    /// Raw register value.
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }
}

/// Parameter bytes of a bring-up step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Params {
    /// The instruction takes no parameters.
    None,
    /// Bytes shared by every panel.
    Fixed(&'static [u8]),
    /// The panel's gate line setting.
    GateLines,
    /// The panel's column window.
    ColumnWindow,
    /// The panel's row window.
    RowWindow,
    /// [`MemoryAccess::packed`].
    MemoryAccess,
    /// [`DataFormat::monochrome`].
    DataFormat,
}

impl Params {
    /// Resolves the parameter bytes for `config`.
    ///
    /// Panel specific bytes are written into `scratch` and borrowed from it.
    pub fn resolve<'a>(self, config: &PanelConfig, scratch: &'a mut [u8; 2]) -> &'a [u8] {
        match self {
            Params::None => &[],
            Params::Fixed(bytes) => bytes,
            Params::GateLines => {
                scratch[0] = config.gate_lines();
                &scratch[..1]
            }
            Params::ColumnWindow => {
                *scratch = config.address_window().columns();
                &scratch[..]
            }
            Params::RowWindow => {
                *scratch = config.address_window().rows();
                &scratch[..]
            }
            Params::MemoryAccess => {
                scratch[0] = MemoryAccess::packed().bits();
                &scratch[..1]
            }
            Params::DataFormat => {
                scratch[0] = DataFormat::monochrome().bits();
                &scratch[..1]
            }
        }
    }
}

/// One entry of the bring-up table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    /// Instruction to send.
    pub instruction: Instruction,
    /// Its parameters.
    pub params: Params,
    /// Delay after the step, in milliseconds.
    pub settle_ms: u32,
}

impl Step {
    const fn new(instruction: Instruction, params: Params) -> Self {
        Self {
            instruction,
            params,
            settle_ms: 0,
        }
    }

    const fn settle(mut self, ms: u32) -> Self {
        self.settle_ms = ms;
        self
    }
}

/// Settle time after leaving sleep during bring-up.
pub const BRING_UP_SLEEP_OUT_MS: u32 = 200;

/// Settle time after leaving sleep from [`St7305::wake`](crate::St7305::wake).
pub const WAKE_MS: u32 = 120;

/// Controller bring-up, sent once after reset.
pub static INIT_SEQUENCE: &[Step] = &[
    Step::new(Instruction::NvmLoad, Params::Fixed(&[0x17, 0x02])),
    Step::new(Instruction::BoosterEnable, Params::Fixed(&[0x01])),
    Step::new(Instruction::GateVoltage, Params::Fixed(&[0x11, 0x04])),
    Step::new(Instruction::SourceHighPositive, Params::Fixed(&[0x69; 4])),
    Step::new(Instruction::SourceLowPositive, Params::Fixed(&[0x19; 4])),
    Step::new(Instruction::SourceHighNegative, Params::Fixed(&[0x4B; 4])),
    Step::new(Instruction::SourceLowNegative, Params::Fixed(&[0x19; 4])),
    Step::new(Instruction::Oscillator, Params::Fixed(&[0x80, 0xE9])),
    Step::new(Instruction::FrameRate, Params::Fixed(&[0x02])),
    Step::new(
        Instruction::GateEqHigh,
        Params::Fixed(&[0xE5, 0xF6, 0x05, 0x46, 0x77, 0x77, 0x77, 0x77, 0x76, 0x45]),
    ),
    Step::new(
        Instruction::GateEqLow,
        Params::Fixed(&[0x05, 0x46, 0x77, 0x77, 0x77, 0x77, 0x76, 0x45]),
    ),
    Step::new(Instruction::GateTiming, Params::Fixed(&[0x32, 0x03, 0x1F])),
    Step::new(Instruction::SourceEq, Params::Fixed(&[0x13])),
    Step::new(Instruction::GateLines, Params::GateLines),
    Step::new(Instruction::SleepOut, Params::None).settle(BRING_UP_SLEEP_OUT_MS),
    Step::new(Instruction::SourceVoltageSelect, Params::Fixed(&[0x00])),
    Step::new(Instruction::MemoryAccess, Params::MemoryAccess),
    Step::new(Instruction::DataFormat, Params::DataFormat),
    Step::new(Instruction::GammaMode, Params::Fixed(&[0x20])),
    // 1-dot inversion, frame inversion, interlace
    Step::new(Instruction::PanelSetting, Params::Fixed(&[0x29])),
    Step::new(Instruction::InversionOn, Params::None),
    Step::new(Instruction::ColumnAddress, Params::ColumnWindow),
    Step::new(Instruction::RowAddress, Params::RowWindow),
    Step::new(Instruction::TearingEffectOn, Params::Fixed(&[0x00])),
    Step::new(Instruction::AutoPowerDown, Params::Fixed(&[0xFF])),
    Step::new(Instruction::HighPowerMode, Params::None),
    Step::new(Instruction::DisplayOn, Params::None),
];
