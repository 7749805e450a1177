//! Input report parsing for SNES-style gamepads

use super::{
    AXIS_CENTER, AXIS_THRESHOLD, AXIS_X_OFFSET, AXIS_Y_OFFSET, BUTTONS_OFFSET, REPORT_SIZE,
    SnesProtocolError, SnesProtocolResult,
};
use core::fmt;

/// Position of one analog axis after thresholding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AxisPosition {
    /// Pushed toward the minimum (left or up).
    Low,
    #[default]
    Neutral,
    /// Pushed toward the maximum (right or down).
    High,
}

impl AxisPosition {
    pub const fn classify(value: u8) -> Self {
        if value < AXIS_CENTER - AXIS_THRESHOLD {
            Self::Low
        } else if value > AXIS_CENTER + AXIS_THRESHOLD {
            Self::High
        } else {
            Self::Neutral
        }
    }

    pub const fn is_low(self) -> bool {
        matches!(self, Self::Low)
    }

    pub const fn is_high(self) -> bool {
        matches!(self, Self::High)
    }
}

/// Physical buttons in the order of their bit in report byte 4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Button {
    X,
    A,
    B,
    Y,
    L,
    R,
    Select,
    Start,
}

impl Button {
    pub const ALL: [Button; 8] = [
        Button::X,
        Button::A,
        Button::B,
        Button::Y,
        Button::L,
        Button::R,
        Button::Select,
        Button::Start,
    ];

    pub const fn bit(self) -> u8 {
        match self {
            Button::X => 0,
            Button::A => 1,
            Button::B => 2,
            Button::Y => 3,
            Button::L => 4,
            Button::R => 5,
            Button::Select => 6,
            Button::Start => 7,
        }
    }

    pub const fn mask(self) -> u8 {
        1 << self.bit()
    }
}

/// Digital D-pad state derived from the two analog axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Directions {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

/// One raw 8-byte report. Any byte pattern is a valid report.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SnesReport {
    bytes: [u8; REPORT_SIZE],
}

impl SnesReport {
    /// Centered axes, no buttons. Used as the comparison base before the
    /// first real report arrives.
    pub const BASELINE: SnesReport = SnesReport {
        bytes: [
            AXIS_CENTER,
            AXIS_CENTER,
            AXIS_CENTER,
            AXIS_CENTER,
            0x00,
            0x00,
            0x00,
            0x00,
        ],
    };

    pub const fn zeroed() -> Self {
        Self {
            bytes: [0; REPORT_SIZE],
        }
    }

    pub const fn from_bytes(bytes: [u8; REPORT_SIZE]) -> Self {
        Self { bytes }
    }

    /// Parse the leading [`REPORT_SIZE`] bytes of `data`; trailing bytes are ignored.
    pub fn parse(data: &[u8]) -> SnesProtocolResult<Self> {
        let bytes = data
            .get(..REPORT_SIZE)
            .and_then(|head| <[u8; REPORT_SIZE]>::try_from(head).ok())
            .ok_or(SnesProtocolError::InvalidReportSize {
                expected: REPORT_SIZE,
                actual: data.len(),
            })?;
        Ok(Self { bytes })
    }

    pub const fn as_bytes(&self) -> &[u8; REPORT_SIZE] {
        &self.bytes
    }

    /// Mutable access for transports that complete a read in place.
    pub fn as_bytes_mut(&mut self) -> &mut [u8; REPORT_SIZE] {
        &mut self.bytes
    }

    pub const fn x(&self) -> u8 {
        self.bytes[AXIS_X_OFFSET]
    }

    pub const fn y(&self) -> u8 {
        self.bytes[AXIS_Y_OFFSET]
    }

    pub const fn buttons(&self) -> u8 {
        self.bytes[BUTTONS_OFFSET]
    }

    pub const fn with_x(mut self, value: u8) -> Self {
        self.bytes[AXIS_X_OFFSET] = value;
        self
    }

    pub const fn with_y(mut self, value: u8) -> Self {
        self.bytes[AXIS_Y_OFFSET] = value;
        self
    }

    pub const fn with_buttons(mut self, mask: u8) -> Self {
        self.bytes[BUTTONS_OFFSET] = mask;
        self
    }

    pub const fn with_button(self, button: Button) -> Self {
        let mask = self.buttons() | button.mask();
        self.with_buttons(mask)
    }

    pub const fn pressed(&self, button: Button) -> bool {
        self.buttons() & button.mask() != 0
    }

    pub const fn x_position(&self) -> AxisPosition {
        AxisPosition::classify(self.x())
    }

    pub const fn y_position(&self) -> AxisPosition {
        AxisPosition::classify(self.y())
    }

    pub const fn directions(&self) -> Directions {
        let x = self.x_position();
        let y = self.y_position();
        Directions {
            up: y.is_low(),
            down: y.is_high(),
            left: x.is_low(),
            right: x.is_high(),
        }
    }
}

impl From<[u8; REPORT_SIZE]> for SnesReport {
    fn from(bytes: [u8; REPORT_SIZE]) -> Self {
        Self::from_bytes(bytes)
    }
}

impl fmt::Display for SnesReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = &self.bytes;
        write!(
            f,
            "{:02x} {:02x} {:02x} {:02x} {:02x} {:02x} {:02x} {:02x}",
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]
        )
    }
}

impl fmt::Debug for SnesReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SnesReport[{self}]")
    }
}
