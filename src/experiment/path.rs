//! One participant's click path for one task.

use serde::{Deserialize, Serialize};

/// One recorded page visit: arena index plus time spent before the next click.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    /// Arena index of the visited page
    pub node: usize,
    /// Milliseconds spent on the page
    pub latency_ms: u64,
}

/// Lifecycle state of a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathState {
    /// Still accepting visits
    Open,
    /// Finalized and not truncated
    Valid,
    /// Truncated by systematic-search detection
    Invalid,
    /// Abandoned by the participant
    Skipped,
}

/// A participant's navigation from `source` toward `target`.
#[derive(Debug, Clone)]
pub struct Path {
    steps: Vec<Step>,
    source: usize,
    target: usize,
    user_id: String,
    duration: String,
    finalized: bool,
    skipped: bool,
    /// Position where systematic searching began; analysis state
    cutoff: Option<usize>,
}

impl Path {
    /// Create an open, empty path.
    pub fn new(
        source: usize,
        target: usize,
        user_id: impl Into<String>,
        duration: impl Into<String>,
    ) -> Self {
        Self {
            steps: Vec::new(),
            source,
            target,
            user_id: user_id.into(),
            duration: duration.into(),
            finalized: false,
            skipped: false,
            cutoff: None,
        }
    }

    /// Append a visit. Returns false once the path is finalized.
    pub fn push(&mut self, node: usize, latency_ms: u64) -> bool {
        if self.finalized {
            return false;
        }
        self.steps.push(Step { node, latency_ms });
        true
    }

    /// Close the path. The last page is where the participant stopped, so
    /// no decision time is attributed to it.
    pub fn finalize(&mut self) {
        if let Some(last) = self.steps.last_mut() {
            last.latency_ms = 0;
        }
        self.finalized = true;
    }

    /// Flag the path as abandoned by the participant.
    pub fn set_skipped(&mut self, skipped: bool) {
        self.skipped = skipped;
    }

    /// Current lifecycle state.
    pub fn state(&self) -> PathState {
        if !self.finalized {
            PathState::Open
        } else if self.skipped {
            PathState::Skipped
        } else if self.cutoff.is_some() {
            PathState::Invalid
        } else {
            PathState::Valid
        }
    }

    /// Finalized, not truncated, and ending on the target.
    pub fn is_successful(&self) -> bool {
        self.finalized
            && !self.is_invalid()
            && self.steps.last().map(|s| s.node) == Some(self.target)
    }

    /// True once systematic searching was detected on this path.
    pub fn is_invalid(&self) -> bool {
        self.cutoff.is_some()
    }

    /// True once no more visits are accepted.
    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// True if the participant abandoned the task.
    pub fn is_skipped(&self) -> bool {
        self.skipped
    }

    /// Position where systematic searching began.
    pub fn cutoff(&self) -> Option<usize> {
        self.cutoff
    }

    pub(crate) fn set_cutoff(&mut self, position: usize) {
        self.cutoff = Some(position);
    }

    pub(crate) fn reset_analysis(&mut self) {
        self.cutoff = None;
    }

    /// Recorded visits.
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Number of recorded visits.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// True if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Arena index of the start page.
    pub fn source(&self) -> usize {
        self.source
    }

    /// Arena index of the task target.
    pub fn target(&self) -> usize {
        self.target
    }

    /// Participant identifier.
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Wall-clock duration in seconds, if it parses.
    pub fn duration_secs(&self) -> Option<u64> {
        parse_duration_secs(&self.duration)
    }
}

/// Parse `HH:MM:SS` (or `MM:SS`, or plain seconds) into seconds. Values
/// that do not fit in a `u64` are treated as unparseable.
pub fn parse_duration_secs(duration: &str) -> Option<u64> {
    let parts: Vec<&str> = duration.trim().split(':').collect();
    if parts.is_empty() || parts.len() > 3 {
        return None;
    }

    parts.iter().try_fold(0u64, |acc, part| {
        let value: u64 = part.trim().parse().ok()?;
        acc.checked_mul(60)?.checked_add(value)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(nodes: &[usize], target: usize) -> Path {
        let mut path = Path::new(0, target, "u1", "00:01:30");
        for &node in nodes {
            path.push(node, 400);
        }
        path
    }

    #[test]
    fn test_finalize_zeroes_last_latency() {
        let mut p = path(&[0, 1, 2], 2);
        p.finalize();
        let latencies: Vec<u64> = p.steps().iter().map(|s| s.latency_ms).collect();
        assert_eq!(latencies, vec![400, 400, 0]);
    }

    #[test]
    fn test_push_after_finalize_is_rejected() {
        let mut p = path(&[0], 3);
        p.finalize();
        assert!(!p.push(1, 100));
        assert_eq!(p.len(), 1);
    }

    #[test]
    fn test_state_transitions() {
        let mut p = path(&[0, 1], 1);
        assert_eq!(p.state(), PathState::Open);
        p.finalize();
        assert_eq!(p.state(), PathState::Valid);
        p.set_cutoff(1);
        assert_eq!(p.state(), PathState::Invalid);
        p.reset_analysis();
        assert_eq!(p.state(), PathState::Valid);
        p.set_skipped(true);
        assert_eq!(p.state(), PathState::Skipped);
    }

    #[test]
    fn test_successful_requires_finalized_valid_and_target() {
        let mut p = path(&[0, 1, 2], 2);
        assert!(!p.is_successful());
        p.finalize();
        assert!(p.is_successful());
        p.set_cutoff(2);
        assert!(!p.is_successful());

        let mut missed = path(&[0, 1], 2);
        missed.finalize();
        assert!(!missed.is_successful());
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration_secs("01:02:03"), Some(3723));
        assert_eq!(parse_duration_secs("02:30"), Some(150));
        assert_eq!(parse_duration_secs("42"), Some(42));
        assert_eq!(parse_duration_secs(""), None);
        assert_eq!(parse_duration_secs("aa:bb"), None);
        assert_eq!(parse_duration_secs("1:2:3:4"), None);
    }

    #[test]
    fn test_parse_duration_overflow_is_unparseable() {
        assert_eq!(parse_duration_secs("999999999999999999:00:00"), None);
        assert_eq!(parse_duration_secs("18446744073709551615"), Some(u64::MAX));
        assert_eq!(parse_duration_secs("18446744073709551615:00"), None);
    }
}
