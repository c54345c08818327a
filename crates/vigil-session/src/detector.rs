//! Face detection seam.
//!
//! The Integrity Monitor consumes detection tuples through the
//! `FaceDetector` trait so a real computer-vision backend can be
//! substituted without touching any flag or score logic. The shipped
//! implementation fabricates results with the same probabilities the
//! product's detection stub used.

use std::collections::VecDeque;
use std::sync::Mutex;

use rand::Rng;

/// One face-detection observation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectionSample {
    pub face_present: bool,
    /// Detector confidence in `[0.0, 1.0]`.
    pub face_confidence: f64,
    pub face_count: u32,
    pub looking_at_screen: bool,
}

impl DetectionSample {
    /// A clean sample: one attentive face.
    pub fn nominal() -> Self {
        Self {
            face_present: true,
            face_confidence: 0.95,
            face_count: 1,
            looking_at_screen: true,
        }
    }
}

/// Pluggable detection backend.
pub trait FaceDetector: Send + Sync {
    fn sample(&self) -> DetectionSample;
}

/// Pseudo-random detection stub: 90% face present, 80–100% confidence,
/// 5% chance of a second face, 85% looking at screen.
pub struct SimulatedDetector;

impl FaceDetector for SimulatedDetector {
    fn sample(&self) -> DetectionSample {
        let mut rng = rand::thread_rng();
        let face_present = rng.gen::<f64>() > 0.1;
        DetectionSample {
            face_present,
            face_confidence: 0.8 + rng.gen::<f64>() * 0.2,
            face_count: if rng.gen::<f64>() > 0.95 { 2 } else { 1 },
            looking_at_screen: rng.gen::<f64>() > 0.15,
        }
    }
}

/// Deterministic detector for tests: replays a queued script, then
/// repeats its final sample (nominal if the script is empty).
pub struct ScriptedDetector {
    script: Mutex<VecDeque<DetectionSample>>,
    last: Mutex<DetectionSample>,
}

impl ScriptedDetector {
    pub fn new(samples: impl IntoIterator<Item = DetectionSample>) -> Self {
        Self {
            script: Mutex::new(samples.into_iter().collect()),
            last: Mutex::new(DetectionSample::nominal()),
        }
    }

    /// Queue another sample behind the current script.
    pub fn push(&self, sample: DetectionSample) {
        self.script.lock().expect("detector lock poisoned").push_back(sample);
    }
}

impl FaceDetector for ScriptedDetector {
    fn sample(&self) -> DetectionSample {
        let mut script = self.script.lock().expect("detector lock poisoned");
        match script.pop_front() {
            Some(sample) => {
                *self.last.lock().expect("detector lock poisoned") = sample;
                sample
            }
            None => *self.last.lock().expect("detector lock poisoned"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simulated_detector_stays_in_range() {
        let detector = SimulatedDetector;
        for _ in 0..200 {
            let s = detector.sample();
            assert!((0.8..=1.0).contains(&s.face_confidence));
            assert!(s.face_count == 1 || s.face_count == 2);
        }
    }

    #[test]
    fn scripted_detector_replays_then_repeats() {
        let away = DetectionSample {
            looking_at_screen: false,
            ..DetectionSample::nominal()
        };
        let detector = ScriptedDetector::new([away, DetectionSample::nominal()]);

        assert!(!detector.sample().looking_at_screen);
        assert!(detector.sample().looking_at_screen);
        // Script exhausted: last sample repeats.
        assert!(detector.sample().looking_at_screen);
    }
}
