//! Phase Tracking
//!
//! Turns the per-bar color stream into a directional phase that never goes
//! neutral. Inside bars inherit the previous phase. A colored bar only sets
//! the phase when it agrees with the most recent colored bar; a bar that
//! disagrees keeps the previous phase unless the bar right before it
//! already had its color.
//!
//! The tracker is a streaming state machine so the incremental engine can
//! checkpoint and resume it one bar at a time.

use super::relative::CandleColor;
use serde::{Deserialize, Serialize};

/// Directional phase of a bar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Phase {
    Up,
    Down,
}

impl Phase {
    /// +1 for up, -1 for down
    pub fn sign(&self) -> i8 {
        match self {
            Self::Up => 1,
            Self::Down => -1,
        }
    }

    /// Phase for a non-zero direction
    fn from_direction(direction: i8) -> Self {
        if direction > 0 {
            Self::Up
        } else {
            Self::Down
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Up => write!(f, "UP"),
            Self::Down => write!(f, "DOWN"),
        }
    }
}

/// Streaming phase tracker, one `push` per bar in chronological order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhaseTracker {
    /// Direction of the most recent non-neutral color, 0 until one is seen
    last_directional: i8,
    prev_color: Option<CandleColor>,
    prev_phase: Option<Phase>,
}

impl PhaseTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Phase of the last pushed bar
    pub fn current(&self) -> Option<Phase> {
        self.prev_phase
    }

    /// Feed the next bar's display color and get its phase
    pub fn push(&mut self, color: CandleColor) -> Phase {
        let current_dir = color.direction();

        let phase = match (self.prev_phase, self.prev_color) {
            (Some(prev_phase), Some(prev_color)) => {
                let last_dir = self.last_directional;

                if current_dir != 0 && current_dir == last_dir {
                    Phase::from_direction(current_dir)
                } else if current_dir != 0 && last_dir != 0 {
                    // Disagrees with the last colored bar: only the immediately
                    // preceding bar's own color can confirm the switch
                    if prev_color.direction() == current_dir {
                        Phase::from_direction(current_dir)
                    } else {
                        prev_phase
                    }
                } else {
                    prev_phase
                }
            }
            // Seed bar: bullish is up, everything else is down
            _ => {
                if color == CandleColor::Bullish {
                    Phase::Up
                } else {
                    Phase::Down
                }
            }
        };

        if current_dir != 0 {
            self.last_directional = current_dir;
        }
        self.prev_color = Some(color);
        self.prev_phase = Some(phase);

        phase
    }
}

/// Phase for every color in the sequence
pub fn track_phases<I>(colors: I) -> Vec<Phase>
where
    I: IntoIterator<Item = CandleColor>,
{
    let mut tracker = PhaseTracker::new();
    colors.into_iter().map(|color| tracker.push(color)).collect()
}
