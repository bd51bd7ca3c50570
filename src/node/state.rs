//! Task lifecycle states.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum State {
    Unavailable = 0,
    Available = 1,
    Complete = 2,
    Final = 3,
}

impl State {
    /// None for values outside 0..=3.
    pub fn from_raw(raw: u32) -> Option<State> {
        match raw {
            0 => Some(State::Unavailable),
            1 => Some(State::Available),
            2 => Some(State::Complete),
            3 => Some(State::Final),
            _ => None,
        }
    }

    pub fn raw(self) -> u32 {
        self as u32
    }

    pub fn name(self) -> &'static str {
        match self {
            State::Unavailable => "Unavailable",
            State::Available => "Available",
            State::Complete => "Complete",
            State::Final => "Final",
        }
    }

    /// Node fill color: red, green, blue, gray.
    pub fn fill_color(self) -> &'static str {
        match self {
            State::Unavailable => "#F77272",
            State::Available => "#9EE89B",
            State::Complete => "#61D6F0",
            State::Final => "#C2C2C2",
        }
    }

    pub fn border_color(self) -> &'static str {
        match self {
            State::Unavailable => "#8A0808",
            State::Available => "#207F1D",
            State::Complete => "#0C687D",
            State::Final => "#4E4E4E",
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
