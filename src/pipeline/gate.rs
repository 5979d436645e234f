use std::time::{Duration, Instant};

/// Debounces scans with a single cooldown window shared across all codes.
///
/// The kiosk keeps one last-check-in timestamp for the whole scanner rather
/// than one per member; that behavior is kept as-is, so two different
/// members scanning within the window results in the second being dropped.
pub struct CheckInGate {
    cooldown: Duration,
    last_admitted: Option<Instant>,
}

impl CheckInGate {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_admitted: None,
        }
    }

    /// Admits the scan iff this is the first one ever or at least the
    /// cooldown has elapsed since the last admitted scan. The stored
    /// timestamp only moves forward.
    pub fn admit(&mut self, now: Instant) -> bool {
        let admitted = match self.last_admitted {
            None => true,
            Some(last) => match now.checked_duration_since(last) {
                Some(elapsed) => elapsed >= self.cooldown,
                // A clock handed to us out of order never rolls the window back.
                None => false,
            },
        };
        if admitted {
            self.last_admitted = Some(now);
        }
        admitted
    }

    pub fn last_admitted(&self) -> Option<Instant> {
        self.last_admitted
    }
}
