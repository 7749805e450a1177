//! Report-to-key translation
//!
//! [`derive_events`] compares two consecutive reports and emits a key for
//! every signal that went from released to pressed. Twelve signals are
//! tracked: four D-pad directions and eight buttons. Releases and held
//! signals emit nothing.
//!
//! Keys come out in this fixed order:
//!
//! | # | Signal        | Key           |
//! |---|---------------|---------------|
//! | 1 | Up            | `Up`          |
//! | 2 | Down          | `Down`        |
//! | 3 | Left          | `Left`        |
//! | 4 | Right         | `Right`       |
//! | 5 | A or B        | `Enter` (once)|
//! | 6 | Start         | `Enter`       |
//! | 7 | Select        | `Escape`      |
//! | 8 | X             | `EditChar`    |
//! | 9 | Y             | `CommandChar` |
//! | 10| L             | `PageUp`      |
//! | 11| R             | `PageDown`    |

use crate::{Button, KeyCode, SnesReport};
use tracing::trace;

/// Upper bound on keys a single report can produce.
pub const MAX_EVENTS_PER_REPORT: usize = 11;

const BUTTON_RULES: [(u8, KeyCode); 7] = [
    (Button::A.mask() | Button::B.mask(), KeyCode::Enter),
    (Button::Start.mask(), KeyCode::Enter),
    (Button::Select.mask(), KeyCode::Escape),
    (Button::X.mask(), KeyCode::EditChar),
    (Button::Y.mask(), KeyCode::CommandChar),
    (Button::L.mask(), KeyCode::PageUp),
    (Button::R.mask(), KeyCode::PageDown),
];

/// Ordered, fixed-capacity list of keys derived from one report.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct KeyEvents {
    keys: [KeyCode; MAX_EVENTS_PER_REPORT],
    len: usize,
}

impl KeyEvents {
    pub const fn new() -> Self {
        Self {
            keys: [KeyCode::NoKey; MAX_EVENTS_PER_REPORT],
            len: 0,
        }
    }

    fn push(&mut self, key: KeyCode) {
        if let Some(slot) = self.keys.get_mut(self.len) {
            *slot = key;
            self.len += 1;
        }
    }

    pub const fn len(&self) -> usize {
        self.len
    }

    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_slice(&self) -> &[KeyCode] {
        self.keys.get(..self.len).unwrap_or(&[])
    }

    pub fn iter(&self) -> core::slice::Iter<'_, KeyCode> {
        self.as_slice().iter()
    }
}

impl Default for KeyEvents {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for KeyEvents {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_list().entries(self.as_slice()).finish()
    }
}

impl<'a> IntoIterator for &'a KeyEvents {
    type Item = &'a KeyCode;
    type IntoIter = core::slice::Iter<'a, KeyCode>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Derive the keys pressed between `previous` and `current`.
pub fn derive_events(previous: &SnesReport, current: &SnesReport) -> KeyEvents {
    trace!(report = %current, "gamepad report");

    let mut events = KeyEvents::new();

    let before = previous.directions();
    let after = current.directions();
    let direction_edges = [
        (before.up, after.up, KeyCode::Up),
        (before.down, after.down, KeyCode::Down),
        (before.left, after.left, KeyCode::Left),
        (before.right, after.right, KeyCode::Right),
    ];
    for (was, is, key) in direction_edges {
        if !was && is {
            events.push(key);
        }
    }

    let rising = !previous.buttons() & current.buttons();
    for (mask, key) in BUTTON_RULES {
        if rising & mask != 0 {
            events.push(key);
        }
    }

    events
}
