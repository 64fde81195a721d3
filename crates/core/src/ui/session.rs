//! Per-overlay recognition scheduling.
//!
//! Each overlay owns one [`RecognitionSession`]. It delays the recognition
//! request until the image has been on screen for a short while, fires it at
//! most once per image, and tags it with a generation so that a response
//! for a replaced image is recognized as stale.

use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct RecognitionSession {
    delay: Duration,
    shown_at: Instant,
    requested: bool,
    generation: u64,
}

impl RecognitionSession {
    /// Starts a session for the first image, shown at `now`.
    pub fn new(delay: Duration, now: Instant) -> Self {
        Self {
            delay,
            shown_at: now,
            requested: false,
            generation: 0,
        }
    }

    /// Generation of the image currently shown.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Registers a new image shown at `now` and returns its generation.
    pub fn begin_image(&mut self, now: Instant) -> u64 {
        self.generation += 1;
        self.shown_at = now;
        self.requested = false;
        self.generation
    }

    /// Returns the generation to request once the delay has elapsed, then
    /// `None` until the next image.
    pub fn due(&mut self, now: Instant) -> Option<u64> {
        if self.requested || now.saturating_duration_since(self.shown_at) < self.delay {
            return None;
        }
        self.requested = true;
        Some(self.generation)
    }

    /// Time left until the request becomes due.
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        if self.requested {
            return None;
        }
        Some(
            self.delay
                .saturating_sub(now.saturating_duration_since(self.shown_at)),
        )
    }

    /// Whether a response tagged `generation` belongs to the current image.
    pub fn accepts(&self, generation: u64) -> bool {
        generation == self.generation
    }

    /// Stops any pending request, e.g. when the overlay is torn down.
    pub fn cancel(&mut self) {
        self.requested = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELAY: Duration = Duration::from_millis(200);

    #[test]
    fn fires_once_after_delay() {
        let start = Instant::now();
        let mut session = RecognitionSession::new(DELAY, start);
        assert_eq!(session.due(start + Duration::from_millis(199)), None);
        assert_eq!(session.due(start + DELAY), Some(0));
        assert_eq!(session.due(start + Duration::from_secs(5)), None);
    }

    #[test]
    fn remaining_counts_down() {
        let start = Instant::now();
        let mut session = RecognitionSession::new(DELAY, start);
        assert_eq!(
            session.remaining(start + Duration::from_millis(50)),
            Some(Duration::from_millis(150))
        );
        assert_eq!(session.remaining(start + DELAY * 2), Some(Duration::ZERO));
        session.due(start + DELAY);
        assert_eq!(session.remaining(start + DELAY), None);
    }

    #[test]
    fn new_image_rearms_and_invalidates_old_responses() {
        let start = Instant::now();
        let mut session = RecognitionSession::new(DELAY, start);
        let first = session.due(start + DELAY).unwrap();

        let later = start + Duration::from_secs(1);
        let second = session.begin_image(later);
        assert_ne!(first, second);
        assert!(!session.accepts(first));
        assert!(session.accepts(second));
        assert_eq!(session.due(later + DELAY), Some(second));
    }

    #[test]
    fn cancelled_session_never_fires() {
        let start = Instant::now();
        let mut session = RecognitionSession::new(DELAY, start);
        session.cancel();
        assert_eq!(session.due(start + DELAY), None);
    }
}
