use uuid::Uuid;

/// Break length after every completed focus phase, in seconds.
pub const BREAK_SECS: u32 = 5 * 60;

/// Default focus length in seconds.
pub const DEFAULT_FOCUS_SECS: u32 = 25 * 60;

/// Selectable focus lengths in seconds: 1 / 5 / 25 / 45 / 60 minutes.
pub const FOCUS_PRESETS: [u32; 5] = [60, 5 * 60, 25 * 60, 45 * 60, 60 * 60];

/// Which half of the cycle the timer is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPhase {
    Focus,
    Break,
}

/// Emitted when a countdown reaches zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FocusEvent {
    /// A focus phase finished. Carries the bound task, if one was selected,
    /// so the caller can mark it completed through the store.
    FocusCompleted { task_id: Option<Uuid> },
    /// The break finished; the timer is reset for another focus phase.
    BreakCompleted,
}

/// Focus/break countdown bound to an optional task.
///
/// The cycle alternates: a finished focus phase starts a 5-minute break, a
/// finished break resets to a fresh focus phase of the configured length.
/// Both transitions leave the timer stopped so the user starts the next
/// phase deliberately.
#[derive(Debug, Clone)]
pub struct FocusSession {
    task_id: Option<Uuid>,
    phase: FocusPhase,
    focus_secs: u32,
    remaining_secs: u32,
    running: bool,
}

impl FocusSession {
    pub fn new(focus_secs: u32) -> Self {
        Self {
            task_id: None,
            phase: FocusPhase::Focus,
            focus_secs,
            remaining_secs: focus_secs,
            running: false,
        }
    }

    pub fn phase(&self) -> FocusPhase {
        self.phase
    }

    pub fn task_id(&self) -> Option<Uuid> {
        self.task_id
    }

    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Bind the session to a task (or unbind with `None`). Rejected while
    /// the countdown is running.
    pub fn select_task(&mut self, task_id: Option<Uuid>) {
        if !self.running {
            self.task_id = task_id;
        }
    }

    /// Change the focus length. Rejected mid-run; otherwise also resets the
    /// current countdown when in the focus phase.
    pub fn set_focus_duration(&mut self, focus_secs: u32) {
        if self.running {
            return;
        }
        self.focus_secs = focus_secs;
        if self.phase == FocusPhase::Focus {
            self.remaining_secs = focus_secs;
        }
    }

    pub fn start(&mut self) {
        self.running = true;
    }

    pub fn pause(&mut self) {
        self.running = false;
    }

    /// Stop and return to a fresh focus phase of the configured length.
    pub fn reset(&mut self) {
        self.running = false;
        self.phase = FocusPhase::Focus;
        self.remaining_secs = self.focus_secs;
    }

    /// Fraction of the current phase already elapsed, 0.0 to 1.0.
    pub fn progress(&self) -> f64 {
        let total = match self.phase {
            FocusPhase::Focus => self.focus_secs,
            FocusPhase::Break => BREAK_SECS,
        };
        if total == 0 {
            return 1.0;
        }
        1.0 - f64::from(self.remaining_secs) / f64::from(total)
    }

    /// Advance the countdown by one second. Returns the phase-completion
    /// event when the countdown reaches zero, `None` otherwise.
    pub fn tick(&mut self) -> Option<FocusEvent> {
        if !self.running || self.remaining_secs == 0 {
            return None;
        }
        self.remaining_secs -= 1;
        if self.remaining_secs > 0 {
            return None;
        }

        self.running = false;
        match self.phase {
            FocusPhase::Focus => {
                let task_id = self.task_id;
                self.phase = FocusPhase::Break;
                self.remaining_secs = BREAK_SECS;
                Some(FocusEvent::FocusCompleted { task_id })
            }
            FocusPhase::Break => {
                self.phase = FocusPhase::Focus;
                self.remaining_secs = self.focus_secs;
                Some(FocusEvent::BreakCompleted)
            }
        }
    }

    /// Format the remaining time as "MM:SS".
    pub fn remaining_formatted(&self) -> String {
        format!(
            "{:02}:{:02}",
            self.remaining_secs / 60,
            self.remaining_secs % 60
        )
    }
}

impl Default for FocusSession {
    fn default() -> Self {
        Self::new(DEFAULT_FOCUS_SECS)
    }
}
