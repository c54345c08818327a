//! Integrity monitoring rules.
//!
//! Two independent samplers feed this module: face detection every two
//! seconds and screen/visibility every second. Each sample applies its
//! rules in a fixed order, appends red flags, and recomputes the
//! authenticity score after the appends, so reads within one tick see
//! every write of that tick.
//!
//! Flag dedup: "No face detected" and "Multiple faces detected" are
//! skipped when they are already the most recent log entry, so a
//! continuous lapse records once per streak. "Looking away from screen"
//! records on every occurrence.

use vigil_core::types::{FlagOrigin, IntegrityState, RedFlag, Severity};

use crate::detector::DetectionSample;

pub const NO_FACE: &str = "No face detected";
pub const MULTIPLE_FACES: &str = "Multiple faces detected";
pub const LOOKING_AWAY: &str = "Looking away from screen";
pub const TAB_SWITCH: &str = "Tab switching detected";
pub const NOT_FULLSCREEN: &str = "Not in fullscreen mode";

/// Rule engine over one session's `IntegrityState`.
#[derive(Debug, Clone, Copy)]
pub struct IntegrityMonitor {
    penalty: u32,
}

impl IntegrityMonitor {
    pub fn new(penalty: u32) -> Self {
        Self { penalty }
    }

    /// Apply one face sample. Returns the flags appended this tick, in
    /// rule order.
    pub fn face_sample(
        &self,
        state: &mut IntegrityState,
        sample: &DetectionSample,
    ) -> Vec<RedFlag> {
        let mut appended = Vec::new();

        if !sample.face_present && !state.latest_flag_is(NO_FACE) {
            let flag = RedFlag::new(NO_FACE, Severity::Warning, FlagOrigin::Monitor);
            state.record_flag(flag.clone(), self.penalty);
            appended.push(flag);
        }

        if sample.face_count > 1 && !state.latest_flag_is(MULTIPLE_FACES) {
            let flag = RedFlag::new(MULTIPLE_FACES, Severity::Error, FlagOrigin::Monitor);
            state.record_flag(flag.clone(), self.penalty);
            appended.push(flag);
        }

        if !sample.looking_at_screen {
            let flag = RedFlag::new(LOOKING_AWAY, Severity::Warning, FlagOrigin::Monitor);
            state.record_flag(flag.clone(), self.penalty);
            appended.push(flag);
        }

        state.record_face_check(sample.face_present);

        if !appended.is_empty() {
            tracing::debug!(
                flags = appended.len(),
                score = state.authenticity_score,
                "Face sample raised red flags"
            );
        }

        appended
    }

    /// Apply one screen sample. A hidden document raises a tab-switch
    /// flag on the guard channel (the session-level counter); a
    /// non-fullscreen page is logged at Info severity and never scored.
    pub fn screen_sample(
        &self,
        state: &mut IntegrityState,
        hidden: bool,
        fullscreen: bool,
    ) -> Vec<RedFlag> {
        let mut appended = Vec::new();

        if hidden {
            let flag = RedFlag::new(TAB_SWITCH, Severity::Warning, FlagOrigin::Guard);
            state.record_flag(flag.clone(), self.penalty);
            appended.push(flag);
        }

        if !fullscreen {
            let flag = RedFlag::new(NOT_FULLSCREEN, Severity::Info, FlagOrigin::Monitor);
            state.record_flag(flag.clone(), self.penalty);
            appended.push(flag);
        }

        appended
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nominal() -> DetectionSample {
        DetectionSample::nominal()
    }

    fn no_face() -> DetectionSample {
        DetectionSample {
            face_present: false,
            face_confidence: 0.0,
            face_count: 0,
            looking_at_screen: true,
        }
    }

    fn looking_away() -> DetectionSample {
        DetectionSample {
            looking_at_screen: false,
            ..DetectionSample::nominal()
        }
    }

    #[test]
    fn clean_sample_raises_nothing() {
        let monitor = IntegrityMonitor::new(5);
        let mut state = IntegrityState::new();

        let appended = monitor.face_sample(&mut state, &nominal());
        assert!(appended.is_empty());
        assert_eq!(state.authenticity_score, 100);
        assert_eq!(state.total_checks, 1);
    }

    #[test]
    fn one_no_face_then_two_looking_away_scores_85() {
        let monitor = IntegrityMonitor::new(5);
        let mut state = IntegrityState::new();

        monitor.face_sample(&mut state, &no_face());
        monitor.face_sample(&mut state, &looking_away());
        monitor.face_sample(&mut state, &looking_away());

        assert_eq!(state.red_flags.len(), 3);
        assert_eq!(state.authenticity_score, 85);
        assert_eq!(state.red_flags[0].description, NO_FACE);
        assert_eq!(state.red_flags[1].description, LOOKING_AWAY);
        assert_eq!(state.red_flags[2].description, LOOKING_AWAY);
    }

    #[test]
    fn no_face_streak_records_once() {
        let monitor = IntegrityMonitor::new(5);
        let mut state = IntegrityState::new();

        monitor.face_sample(&mut state, &no_face());
        monitor.face_sample(&mut state, &no_face());
        monitor.face_sample(&mut state, &no_face());

        assert_eq!(state.red_flags.len(), 1);
        assert_eq!(state.authenticity_score, 95);

        // An intervening flag ends the streak; the next lapse records.
        monitor.face_sample(&mut state, &looking_away());
        monitor.face_sample(&mut state, &no_face());
        assert_eq!(state.red_flags.len(), 3);
        assert_eq!(state.red_flags[2].description, NO_FACE);
    }

    #[test]
    fn multiple_faces_is_an_error_flag() {
        let monitor = IntegrityMonitor::new(5);
        let mut state = IntegrityState::new();

        let crowded = DetectionSample {
            face_count: 2,
            ..DetectionSample::nominal()
        };
        let appended = monitor.face_sample(&mut state, &crowded);

        assert_eq!(appended.len(), 1);
        assert_eq!(appended[0].description, MULTIPLE_FACES);
        assert_eq!(appended[0].severity, Severity::Error);
        assert_eq!(state.authenticity_score, 95);

        // Repeat while still the latest entry: deduplicated.
        monitor.face_sample(&mut state, &crowded);
        assert_eq!(state.red_flags.len(), 1);
    }

    #[test]
    fn rule_order_within_one_tick() {
        let monitor = IntegrityMonitor::new(5);
        let mut state = IntegrityState::new();

        let bad = DetectionSample {
            face_present: false,
            face_confidence: 0.0,
            face_count: 2,
            looking_at_screen: false,
        };
        let appended = monitor.face_sample(&mut state, &bad);

        let order: Vec<&str> = appended.iter().map(|f| f.description.as_str()).collect();
        assert_eq!(order, vec![NO_FACE, MULTIPLE_FACES, LOOKING_AWAY]);
        assert_eq!(state.authenticity_score, 85);
    }

    #[test]
    fn hidden_screen_flags_before_fullscreen_log() {
        let monitor = IntegrityMonitor::new(5);
        let mut state = IntegrityState::new();

        let appended = monitor.screen_sample(&mut state, true, false);
        let order: Vec<&str> = appended.iter().map(|f| f.description.as_str()).collect();
        assert_eq!(order, vec![TAB_SWITCH, NOT_FULLSCREEN]);

        // Tab switch feeds the session-level counter; the fullscreen
        // entry is Info and does not score.
        assert_eq!(state.guard_flag_count, 1);
        assert_eq!(state.monitor_flag_count, 0);
        assert_eq!(state.authenticity_score, 95);
    }

    #[test]
    fn fullscreen_sample_logs_but_never_scores() {
        let monitor = IntegrityMonitor::new(5);
        let mut state = IntegrityState::new();

        for _ in 0..5 {
            monitor.screen_sample(&mut state, false, false);
        }
        assert_eq!(state.red_flags.len(), 5);
        assert!(state.red_flags.iter().all(|f| f.severity == Severity::Info));
        assert_eq!(state.authenticity_score, 100);
    }

    #[test]
    fn score_never_increases() {
        let monitor = IntegrityMonitor::new(5);
        let mut state = IntegrityState::new();
        let mut last = state.authenticity_score;

        let samples = [no_face(), nominal(), looking_away(), no_face(), nominal()];
        for s in &samples {
            monitor.face_sample(&mut state, s);
            assert!(state.authenticity_score <= last);
            last = state.authenticity_score;
        }
    }
}
