//! A hiker's navigation session.
//!
//! Ties the pieces together: a timer polls the device location every
//! `poll_interval_secs` while navigating, each tick refreshes the
//! `NavigationState`, guidance and alerts go out through the `Announcer`,
//! and photo analysis runs on its own task so it never holds up a tick.
//!
//! Ticks are single-flight: a tick that starts while another one is still
//! running is dropped, so the state always reflects the last completed tick.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use tokio::task::{self, JoinHandle};
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::advisor::{emergency_alert, raise_alert, EmergencyResponse};
use crate::catalog::TrekPath;
use crate::config::NavigatorConfig;
use crate::geo::Coordinate;
use crate::guidance::{guidance_with, weather_guidance, Guidance};
use crate::tracker::{
    update_with, AlertCategory, NavigationState, NavigationUpdate, SafetyAlert, Severity,
    WeatherInfo,
};
use crate::vision::{analyze_with_timeout, AnalysisRequest, PathAnalyzer, VisualAnalysis};
use crate::voice::Announcer;

const LOCATION_UNAVAILABLE: &str =
    "Unable to get your current location. Please enable location services.";
const OFF_ROUTE: &str =
    "You appear to have left the marked trail. Head back towards the route.";
const ANALYSIS_FAILED: &str = "Visual analysis failed. Please rely on GPS navigation.";

/// Why a location read failed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LocationError {
    #[error("Location services unavailable")]
    Unavailable,

    #[error("Location permission denied")]
    PermissionDenied,

    #[error("Location fix out of range: {0}")]
    InvalidFix(Coordinate),
}

/// Device positioning. Reads are blocking-style and return the latest fix.
pub trait LocationProvider: Send + Sync {
    /// Latest fix, waiting for one if needed.
    fn current_location(&self) -> Result<Coordinate, LocationError>;
}

/// Resets the single-flight flag when a tick ends, however it ends.
struct TickGuard<'a>(&'a AtomicBool);

impl Drop for TickGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// One hiker navigating one trek.
pub struct NavigationSession<A> {
    trek: Arc<TrekPath>,
    config: NavigatorConfig,
    state: Mutex<NavigationState>,
    announcer: Arc<Announcer>,
    location: Arc<dyn LocationProvider>,
    analyzer: Arc<A>,
    ticking: AtomicBool,
    location_failing: AtomicBool,
    off_route: AtomicBool,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl<A: PathAnalyzer + 'static> NavigationSession<A> {
    /// Session for `trek`, idle until `start`.
    pub fn new(
        trek: Arc<TrekPath>,
        config: NavigatorConfig,
        announcer: Arc<Announcer>,
        location: Arc<dyn LocationProvider>,
        analyzer: Arc<A>,
    ) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(NavigationState::new(Arc::clone(&trek))),
            trek,
            config,
            announcer,
            location,
            analyzer,
            ticking: AtomicBool::new(false),
            location_failing: AtomicBool::new(false),
            off_route: AtomicBool::new(false),
            timer: Mutex::new(None),
        })
    }

    fn lock_state(&self) -> MutexGuard<'_, NavigationState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_timer(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.timer.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// The trek being navigated.
    pub fn trek(&self) -> &Arc<TrekPath> {
        &self.trek
    }

    /// Snapshot of the current navigation state.
    pub fn state(&self) -> NavigationState {
        self.lock_state().clone()
    }

    /// True between `start` and `stop`.
    pub fn is_navigating(&self) -> bool {
        self.lock_timer().is_some()
    }

    /// Begin navigating: take a first fix, start the poll timer and give
    /// initial guidance. Must be called inside a Tokio runtime.
    ///
    /// Returns false if the session is already navigating.
    pub fn start(self: &Arc<Self>) -> bool {
        let mut timer = self.lock_timer();
        if timer.is_some() {
            log::debug!("Navigation for `{}` already running", self.trek.id);
            return false;
        }

        self.poll_location();

        log::info!("Starting navigation for `{}`", self.trek.id);
        self.announcer.announce(
            &format!(
                "Starting navigation for {}. Stay on the marked trail and follow voice guidance.",
                self.trek.name
            ),
            Severity::Medium,
        );

        *timer = Some(self.spawn_timer());
        drop(timer);

        self.provide_guidance();
        true
    }

    fn spawn_timer(self: &Arc<Self>) -> JoinHandle<()> {
        let period = self.config.poll_interval();
        let session: Weak<Self> = Arc::downgrade(self);

        tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                interval.tick().await;
                let Some(session) = session.upgrade() else {
                    break;
                };
                session.tick().await;
            }
        })
    }

    /// Stop navigating. No further ticks fire after this returns.
    pub fn stop(&self) {
        let Some(handle) = self.lock_timer().take() else {
            return;
        };
        handle.abort();

        log::info!("Stopped navigation for `{}`", self.trek.id);
        self.announcer
            .announce("Navigation stopped. Stay safe and enjoy your trek.", Severity::Medium);
    }

    /// Read the device location and refresh the navigation state.
    ///
    /// The read blocks the calling thread. Returns None when the read failed
    /// or another tick was in progress; in both cases the last known
    /// location is kept.
    pub fn poll_location(&self) -> Option<NavigationUpdate> {
        let _guard = self.begin_tick()?;
        self.apply_fix(self.location.current_location())
    }

    /// Timer tick. Same as `poll_location`, but the read runs on the
    /// blocking pool so a slow fix never stalls other tasks.
    async fn tick(&self) -> Option<NavigationUpdate> {
        let _guard = self.begin_tick()?;

        let provider = Arc::clone(&self.location);
        let fix = match task::spawn_blocking(move || provider.current_location()).await {
            Ok(fix) => fix,
            Err(e) => {
                log::warn!("Location read did not complete: {e}");
                return None;
            }
        };
        self.apply_fix(fix)
    }

    fn begin_tick(&self) -> Option<TickGuard<'_>> {
        if self.ticking.swap(true, Ordering::AcqRel) {
            log::debug!("Dropping overlapping location tick");
            return None;
        }
        Some(TickGuard(&self.ticking))
    }

    fn apply_fix(&self, fix: Result<Coordinate, LocationError>) -> Option<NavigationUpdate> {
        let fix = fix.and_then(|c| {
            if c.is_valid() {
                Ok(c)
            } else {
                Err(LocationError::InvalidFix(c))
            }
        });

        let location = match fix {
            Ok(location) => location,
            Err(e) => {
                log::warn!("Location update failed: {e}");
                if !self.location_failing.swap(true, Ordering::AcqRel) {
                    self.announcer.announce(LOCATION_UNAVAILABLE, Severity::High);
                }
                return None;
            }
        };
        self.location_failing.store(false, Ordering::Release);

        let update = update_with(&location, &self.trek, self.config.waypoint_exclusion_km);
        log::debug!(
            "Tick at {location}: progress {:.0}%, next {:?} in {:.2} km",
            update.progress,
            update.next_waypoint.as_ref().map(|w| w.name.as_str()),
            update.distance_to_next
        );

        let off_route = update.off_route_km > self.config.off_route_threshold_km;
        if off_route && !self.off_route.swap(true, Ordering::AcqRel) {
            log::info!("Hiker is {:.2} km off the route", update.off_route_km);
            self.announcer.announce(OFF_ROUTE, Severity::High);
        } else if !off_route {
            self.off_route.store(false, Ordering::Release);
        }

        self.lock_state().apply(update.clone());
        Some(update)
    }

    /// Guidance for the last known location, spoken through the announcer.
    ///
    /// Returns None until a location is known.
    pub fn provide_guidance(&self) -> Option<Guidance> {
        let state = self.state();
        let location = state.current_location?;

        let guidance = guidance_with(&location, &self.trek, &state, &self.config);

        self.announcer.announce(&guidance.instruction, Severity::Medium);
        for warning in &guidance.safety_warnings {
            self.announcer
                .announce(&format!("Safety warning: {warning}"), Severity::High);
        }

        Some(guidance)
    }

    /// Emergency button: raise a critical alert of the given category.
    pub fn trigger_emergency(&self, category: AlertCategory) -> EmergencyResponse {
        let mut state = self.lock_state();
        let alert = emergency_alert(category, state.current_location);
        raise_alert(alert, &mut state, &self.announcer)
    }

    /// Record an externally reported alert.
    pub fn report_alert(&self, alert: SafetyAlert) -> EmergencyResponse {
        let mut state = self.lock_state();
        raise_alert(alert, &mut state, &self.announcer)
    }

    /// Store a fresh weather snapshot and announce the resulting advice.
    pub fn update_weather(&self, weather: WeatherInfo) -> String {
        let advice = weather_guidance(&weather);
        self.lock_state().weather_conditions = weather;
        self.announcer.announce(&advice, Severity::Medium);
        advice
    }

    /// Mute or unmute guidance. Alerts are always spoken.
    pub fn set_voice_enabled(&self, enabled: bool) {
        self.announcer.set_enabled(enabled);
    }

    /// Analyze a trail photo on a background task.
    ///
    /// The task always yields an analysis: on failure or timeout it is the
    /// GPS fallback from `VisualAnalysis::unavailable`. Returns None until a
    /// location is known.
    pub fn capture_photo(self: &Arc<Self>, image: Vec<u8>) -> Option<JoinHandle<VisualAnalysis>> {
        let location = self.lock_state().current_location?;
        let request = AnalysisRequest {
            image,
            location,
            trek: Arc::clone(&self.trek),
        };

        let analyzer = Arc::clone(&self.analyzer);
        let announcer = Arc::clone(&self.announcer);
        let timeout = self.config.analysis_timeout();

        Some(tokio::spawn(async move {
            match analyze_with_timeout(analyzer.as_ref(), request, timeout).await {
                Ok(analysis) => {
                    announcer.announce(
                        &format!("Visual analysis complete. {}", analysis.path_direction),
                        Severity::Medium,
                    );
                    for alert in &analysis.safety_alerts {
                        announcer.announce(&format!("Safety alert: {alert}"), Severity::High);
                    }
                    analysis
                }
                Err(e) => {
                    log::warn!("Visual analysis failed: {e}");
                    announcer.announce(ANALYSIS_FAILED, Severity::Medium);
                    VisualAnalysis::unavailable()
                }
            }
        }))
    }
}

impl<A> Drop for NavigationSession<A> {
    fn drop(&mut self) {
        if let Some(handle) = self.timer.get_mut().ok().and_then(Option::take) {
            handle.abort();
        }
    }
}
