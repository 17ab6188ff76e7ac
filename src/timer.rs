//! The countdown timers of the chip.

/// Represents a timer inside of the chip
/// infrastructure, it will count down to
/// zero from whatever number given, once
/// per tick. The host is responsible to tick
/// it at [`HERTZ`](crate::definitions::timer::HERTZ).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Timer {
    /// will store the value of the timer
    value: u8,
}

impl Timer {
    /// Will create a new timer with the given value.
    pub fn new(value: u8) -> Self {
        Self { value }
    }

    /// Will set the value from which the timer shall count down from.
    pub fn set_value(&mut self, value: u8) {
        self.value = value;
    }

    /// Will get the value that the counter is currently at.
    pub fn get_value(&self) -> u8 {
        self.value
    }

    /// Checks if the timer is still counting down.
    pub fn is_active(&self) -> bool {
        self.value > 0
    }

    /// Will count down by one, but never below zero.
    pub fn tick(&mut self) {
        self.value = self.value.saturating_sub(1);
    }
}
