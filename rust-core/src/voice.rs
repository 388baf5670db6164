//! Voice announcements.
//!
//! The announcer is a two-state machine (idle, speaking) in front of the
//! platform speech engine. At most one utterance is in flight. While
//! speaking, only critical announcements get through: they cancel the
//! current utterance and replace it. Everything else is dropped, there is
//! no queue.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::config::{SpeechConfig, Voice};
use crate::tracker::Severity;

/// One request to the speech engine.
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    /// Passed back to `Announcer::finished` when playback ends.
    pub id: u64,
    pub text: String,
    pub priority: Severity,
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
}

/// Platform text-to-speech binding.
///
/// Implementations report the end of playback through
/// `Announcer::finished`, and must not do so from inside `speak` or
/// `cancel`.
pub trait SpeechEngine: Send + Sync {
    /// Start playing `utterance`.
    fn speak(&self, utterance: &Utterance);
    /// Stop whatever is playing.
    fn cancel(&self);
}

/// Whether an utterance is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceState {
    Idle,
    Speaking,
}

struct Inner {
    state: VoiceState,
    enabled: bool,
    current: u64,
}

/// Single-utterance gate in front of a `SpeechEngine`.
pub struct Announcer {
    engine: Arc<dyn SpeechEngine>,
    speech: SpeechConfig,
    inner: Mutex<Inner>,
}

impl Announcer {
    /// Announcer with the default voices.
    pub fn new(engine: Arc<dyn SpeechEngine>) -> Self {
        Self::with_speech(engine, SpeechConfig::default())
    }

    /// Announcer with configured voices.
    pub fn with_speech(engine: Arc<dyn SpeechEngine>, speech: SpeechConfig) -> Self {
        Self {
            engine,
            speech,
            inner: Mutex::new(Inner {
                state: VoiceState::Idle,
                enabled: true,
                current: 0,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Speak `text` unless voice is muted or the request loses to the
    /// utterance already playing. Returns whether it was handed to the engine.
    pub fn announce(&self, text: &str, priority: Severity) -> bool {
        let mut inner = self.lock();
        if !inner.enabled {
            log::debug!("Voice muted, not announcing: {text}");
            return false;
        }
        self.start(&mut inner, text, priority)
    }

    /// Like `announce`, but ignores the mute toggle. Used for safety alerts.
    pub fn announce_unmuted(&self, text: &str, priority: Severity) -> bool {
        let mut inner = self.lock();
        self.start(&mut inner, text, priority)
    }

    fn start(&self, inner: &mut Inner, text: &str, priority: Severity) -> bool {
        if inner.state == VoiceState::Speaking {
            if priority != Severity::Critical {
                log::debug!("Dropped {priority:?} announcement while speaking: {text}");
                return false;
            }
            self.engine.cancel();
        }

        let voice: Voice = if priority == Severity::Critical {
            self.speech.critical
        } else {
            self.speech.normal
        };

        inner.current += 1;
        inner.state = VoiceState::Speaking;

        self.engine.speak(&Utterance {
            id: inner.current,
            text: text.to_string(),
            priority,
            rate: voice.rate,
            pitch: voice.pitch,
            volume: voice.volume,
        });

        true
    }

    /// Playback of utterance `id` ended. Late events for utterances that
    /// were already replaced are ignored.
    pub fn finished(&self, id: u64) {
        let mut inner = self.lock();
        if inner.current == id {
            inner.state = VoiceState::Idle;
        }
    }

    /// Stop any playback and return to idle.
    pub fn silence(&self) {
        let mut inner = self.lock();
        if inner.state == VoiceState::Speaking {
            self.engine.cancel();
            inner.state = VoiceState::Idle;
        }
    }

    /// Current voice state.
    pub fn state(&self) -> VoiceState {
        self.lock().state
    }

    /// Mute or unmute. Muting stops the current utterance.
    pub fn set_enabled(&self, enabled: bool) {
        let mut inner = self.lock();
        inner.enabled = enabled;
        if !enabled && inner.state == VoiceState::Speaking {
            self.engine.cancel();
            inner.state = VoiceState::Idle;
        }
    }

    /// False while muted.
    pub fn is_enabled(&self) -> bool {
        self.lock().enabled
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Engine that records every call and never finishes on its own.
    #[derive(Default)]
    pub(crate) struct RecordingEngine {
        spoken: Mutex<Vec<Utterance>>,
        cancels: Mutex<usize>,
    }

    impl RecordingEngine {
        pub(crate) fn utterances(&self) -> Vec<Utterance> {
            self.spoken.lock().unwrap().clone()
        }

        pub(crate) fn texts(&self) -> Vec<String> {
            self.utterances().into_iter().map(|u| u.text).collect()
        }

        pub(crate) fn last_text(&self) -> Option<String> {
            self.utterances().pop().map(|u| u.text)
        }

        pub(crate) fn cancels(&self) -> usize {
            *self.cancels.lock().unwrap()
        }

        /// Report the latest utterance as done, as the platform would.
        pub(crate) fn finish_last(&self, announcer: &Announcer) {
            if let Some(u) = self.utterances().pop() {
                announcer.finished(u.id);
            }
        }
    }

    impl SpeechEngine for RecordingEngine {
        fn speak(&self, utterance: &Utterance) {
            self.spoken.lock().unwrap().push(utterance.clone());
        }

        fn cancel(&self) {
            *self.cancels.lock().unwrap() += 1;
        }
    }

    fn announcer() -> (Arc<RecordingEngine>, Announcer) {
        let engine = Arc::new(RecordingEngine::default());
        let announcer = Announcer::new(engine.clone());
        (engine, announcer)
    }

    #[test]
    fn idle_announcement_is_spoken() {
        let (engine, announcer) = announcer();

        assert!(announcer.announce("Hello", Severity::Low));
        assert_eq!(announcer.state(), VoiceState::Speaking);

        let u = &engine.utterances()[0];
        assert_eq!(u.text, "Hello");
        assert_eq!(u.rate, 0.9);
        assert_eq!(u.pitch, 1.0);
        assert_eq!(engine.cancels(), 0);
    }

    #[test]
    fn non_critical_is_dropped_while_speaking() {
        let (engine, announcer) = announcer();
        announcer.announce("First", Severity::Low);

        for priority in [Severity::Low, Severity::Medium, Severity::High] {
            assert!(!announcer.announce("Second", priority));
        }

        assert_eq!(engine.texts(), ["First"]);
        assert_eq!(engine.cancels(), 0);
        assert_eq!(announcer.state(), VoiceState::Speaking);
    }

    #[test]
    fn critical_interrupts_with_emphasis() {
        let (engine, announcer) = announcer();
        announcer.announce("First", Severity::Medium);

        assert!(announcer.announce("Danger", Severity::Critical));

        assert_eq!(engine.cancels(), 1);
        let u = engine.utterances().pop().unwrap();
        assert_eq!(u.text, "Danger");
        assert_eq!(u.rate, 0.8);
        assert_eq!(u.pitch, 1.2);
    }

    #[test]
    fn finished_returns_to_idle() {
        let (engine, announcer) = announcer();
        announcer.announce("First", Severity::Low);

        let id = engine.utterances()[0].id;
        announcer.finished(id);
        assert_eq!(announcer.state(), VoiceState::Idle);

        assert!(announcer.announce("Second", Severity::Low));
        assert_eq!(engine.texts(), ["First", "Second"]);
    }

    #[test]
    fn stale_finish_event_is_ignored() {
        let (engine, announcer) = announcer();
        announcer.announce("First", Severity::Low);
        announcer.announce("Danger", Severity::Critical);

        let first = engine.utterances()[0].id;
        announcer.finished(first);
        assert_eq!(announcer.state(), VoiceState::Speaking);
    }

    #[test]
    fn muted_announcer_only_speaks_unmuted() {
        let (engine, announcer) = announcer();
        announcer.set_enabled(false);

        assert!(!announcer.announce("Guidance", Severity::Critical));
        assert!(announcer.announce_unmuted("Alert", Severity::High));
        assert_eq!(engine.texts(), ["Alert"]);
    }

    #[test]
    fn muting_stops_playback() {
        let (engine, announcer) = announcer();
        announcer.announce("First", Severity::Low);

        announcer.set_enabled(false);
        assert_eq!(announcer.state(), VoiceState::Idle);
        assert_eq!(engine.cancels(), 1);
        assert!(!announcer.is_enabled());
    }

    #[test]
    fn silence_cancels_current_utterance() {
        let (engine, announcer) = announcer();
        announcer.silence();
        assert_eq!(engine.cancels(), 0);

        announcer.announce("First", Severity::Low);
        announcer.silence();
        assert_eq!(engine.cancels(), 1);
        assert_eq!(announcer.state(), VoiceState::Idle);
    }
}
