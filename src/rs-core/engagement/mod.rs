use crate::{
    bindings::{Host, PageState, TimerId, TimerReason},
    capabilities::FullscreenApi,
    Logger,
};

/// Quiet period, in milliseconds, after the last engagement-related event before a
/// decision is taken.
pub(crate) const DECISION_DELAY_MS: f64 = 300.;

/// Everything that matters to know if the user may be watching the media element.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct EngagementState {
    /// The page is the visible tab.
    pub(crate) visible: bool,

    /// Enough of the media element is inside the viewport.
    pub(crate) intersecting: bool,

    /// Some element of the page is in fullscreen.
    pub(crate) fullscreen: bool,

    /// The media element itself is the one in fullscreen.
    pub(crate) element_fullscreen: bool,

    pub(crate) picture_in_picture: bool,
}

impl EngagementState {
    /// Returns `true` if content should be loaded in that state.
    pub(crate) fn should_load(&self) -> bool {
        if self.element_fullscreen || self.picture_in_picture {
            return true;
        }
        self.visible
            && ((!self.fullscreen && self.intersecting)
                || (self.fullscreen && self.element_fullscreen))
    }
}

/// Turns page visibility, viewport intersection, fullscreen and picture-in-picture
/// changes into debounced load/unload decisions.
pub(crate) struct EngagementTracker {
    /// Minimum visible ratio of the media element for it to be considered intersecting.
    threshold: f64,

    fullscreen_api: FullscreenApi,

    /// Last known intersection state. The platform only reports it on changes.
    intersecting: bool,

    /// Timer of the pending decision, if one.
    timer: Option<TimerId>,

    observing: bool,
}

impl EngagementTracker {
    pub(crate) fn new(threshold: f64, fullscreen_api: FullscreenApi) -> Self {
        Self {
            threshold,
            fullscreen_api,
            intersecting: false,
            timer: None,
            observing: false,
        }
    }

    pub(crate) fn fullscreen_api(&self) -> FullscreenApi {
        self.fullscreen_api
    }

    /// Start listening to engagement-related events on the page.
    pub(crate) fn start<H: Host>(&mut self, host: &mut H) {
        if !self.observing {
            Logger::debug("Engagement: Starting observations");
            host.observe_engagement(self.threshold, &self.fullscreen_api);
            self.observing = true;
        }
    }

    /// Cancel any pending decision and stop all observations.
    pub(crate) fn stop<H: Host>(&mut self, host: &mut H) {
        self.cancel(host);
        if self.observing {
            Logger::debug("Engagement: Stopping observations");
            host.stop_observing_engagement();
            self.observing = false;
        }
    }

    /// Cancel the pending decision, if one.
    pub(crate) fn cancel<H: Host>(&mut self, host: &mut H) {
        if let Some(id) = self.timer.take() {
            host.clear_timer(id);
        }
    }

    /// (Re)start the quiet period after which a decision is taken.
    pub(crate) fn schedule<H: Host>(&mut self, host: &mut H) {
        self.cancel(host);
        self.timer = Some(host.start_timer(DECISION_DELAY_MS, TimerReason::EngagementDecision));
    }

    pub(crate) fn on_intersection_change<H: Host>(&mut self, host: &mut H, ratio: f64) {
        self.intersecting = ratio > 0. && ratio >= self.threshold;
        Logger::lazy_debug(&|| {
            format!(
                "Engagement: Intersection ratio {} (intersecting: {})",
                ratio, self.intersecting
            )
        });
        self.schedule(host);
    }

    /// Take the decision if `id` is the pending decision timer.
    ///
    /// Returns `None` if that timer is not the pending one.
    pub(crate) fn on_timer_ended<H: Host>(&mut self, host: &mut H, id: TimerId) -> Option<bool> {
        if self.timer != Some(id) {
            return None;
        }
        self.timer = None;
        let state = self.current_state(host);
        let decision = state.should_load();
        Logger::debug(&format!(
            "Engagement: {:?} => {}",
            state,
            if decision { "load" } else { "unload" }
        ));
        Some(decision)
    }

    /// Read the current `EngagementState` from the page.
    pub(crate) fn current_state<H: Host>(&self, host: &H) -> EngagementState {
        let PageState {
            visible,
            document_fullscreen,
            element_fullscreen,
            picture_in_picture,
        } = host.page_state(&self.fullscreen_api);
        let fullscreen_supported = self.fullscreen_api.is_supported();
        EngagementState {
            visible,
            intersecting: self.intersecting,
            fullscreen: fullscreen_supported && document_fullscreen,
            element_fullscreen: fullscreen_supported && element_fullscreen,
            picture_in_picture,
        }
    }
}
