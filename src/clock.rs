use crate::error::AttemptError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClockState {
    Disarmed,
    Running,
    Paused,
}

/// What a single tick produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClockEvent {
    Tick { remaining: u32 },
    Expired,
}

/// Countdown in whole seconds.
///
/// The clock is passive: something else (the runtime's ticker) calls
/// [`Clock::tick`] once per wall-clock second. Once the count reaches zero the
/// clock reports [`ClockEvent::Expired`] a single time and disarms itself.
#[derive(Clone, Debug)]
pub struct Clock {
    total: u32,
    remaining: u32,
    state: ClockState,
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock {
    pub fn new() -> Self {
        Self {
            total: 0,
            remaining: 0,
            state: ClockState::Disarmed,
        }
    }

    pub fn start(&mut self, duration_seconds: i64) -> Result<(), AttemptError> {
        if duration_seconds <= 0 {
            return Err(AttemptError::InvalidDuration(duration_seconds));
        }
        let total = u32::try_from(duration_seconds)
            .map_err(|_| AttemptError::InvalidDuration(duration_seconds))?;

        self.total = total;
        self.remaining = total;
        self.state = ClockState::Running;
        Ok(())
    }

    pub fn stop(&mut self) {
        self.state = ClockState::Disarmed;
    }

    /// Returns true if the clock went from running to paused.
    pub fn pause(&mut self) -> bool {
        if self.state == ClockState::Running {
            self.state = ClockState::Paused;
            true
        } else {
            false
        }
    }

    /// Returns true if the clock went from paused to running.
    pub fn resume(&mut self) -> bool {
        if self.state == ClockState::Paused {
            self.state = ClockState::Running;
            true
        } else {
            false
        }
    }

    pub fn tick(&mut self) -> Option<ClockEvent> {
        if self.state != ClockState::Running {
            return None;
        }

        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.state = ClockState::Disarmed;
            Some(ClockEvent::Expired)
        } else {
            Some(ClockEvent::Tick {
                remaining: self.remaining,
            })
        }
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    /// Seconds counted down so far; paused time is not included.
    pub fn elapsed(&self) -> u32 {
        self.total - self.remaining
    }

    pub fn state(&self) -> ClockState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == ClockState::Running
    }

    pub fn is_paused(&self) -> bool {
        self.state == ClockState::Paused
    }

    pub fn is_armed(&self) -> bool {
        self.state != ClockState::Disarmed
    }
}
