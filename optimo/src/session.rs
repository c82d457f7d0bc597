//! Per-page session.
//!
//! A [`Session`] owns every piece of mutable state for one page load: the
//! tracked triggers, the panel slot, the coordinator, the rescan debouncer
//! and the visible notice. Page events come in through [`Session::handle`]
//! or the [`Session::run`] loop, which also drives the service call and the
//! timers.

use crate::config::SessionConfig;
use crate::coordinator::{Completion, Coordinator, CoordinatorState, Outcome, Rejection};
use crate::debounce::Debouncer;
use crate::document::{ElementId, HostDocument, ListenKind, ListenTarget, ListenerId, MutationRecord};
use crate::entitlement::{upgrade_url, EntitlementView, Tier};
use crate::error::OptimoResult;
use crate::notice::{Notice, NoticeBoard};
use crate::options::{is_premium_tone, Capability, OptionSet};
use crate::positioner::{OverlayMetrics, Panel, PanelClick, PanelSlot};
use crate::scanner::{mutation_requires_rescan, scan_pass, ScanReport};
use crate::service::{OptimizationService, ServiceReply};
use crate::tracker::Tracker;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::{self, Instant};

type InFlight = Pin<Box<dyn Future<Output = OptimoResult<ServiceReply>> + Send>>;

/// Something that happened on the host page.
#[derive(Debug, Clone, PartialEq)]
pub enum PageEvent {
    /// Child-list mutations.
    Mutation(MutationRecord),
    /// The window was resized.
    Resize,
    /// A click anywhere in the document.
    Click {
        /// Innermost element under the pointer.
        target: ElementId,
    },
    /// A tone was picked in the panel's selector.
    ToneChange {
        /// The selected tone.
        tone: String,
    },
    /// The panel's submit control was used with these options.
    Submit {
        /// Options read from the panel.
        options: OptionSet,
    },
}

/// Attachment state of a surface.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SurfaceState {
    /// No trigger.
    Unattached,
    /// Has a trigger, panel closed.
    Attached,
    /// Its panel is open.
    Active,
}

/// Result of a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// One service call is in flight for the surface.
    Dispatched(ElementId),
    /// Refused; nothing was sent.
    Rejected(Rejection),
}

enum Step {
    Event(PageEvent),
    Reply(OptimoResult<ServiceReply>),
    Rescan,
    ExpireNotice,
    Entitlement(bool),
    Closed,
}

/// Prompt-surface session for one document.
pub struct Session<D: HostDocument> {
    document: D,
    config: SessionConfig,
    metrics: OverlayMetrics,
    tracker: Tracker,
    panel: PanelSlot,
    coordinator: Coordinator,
    rescan: Debouncer,
    notices: NoticeBoard,
    entitlement: EntitlementView,
    service: Arc<dyn OptimizationService>,
    in_flight: Option<InFlight>,
    resize_listener: Option<ListenerId>,
    upgrade_link: Option<String>,
}

impl<D: HostDocument> Session<D> {
    /// Create a session. Nothing touches the document until [`Session::start`].
    pub fn new(
        document: D,
        config: SessionConfig,
        service: Arc<dyn OptimizationService>,
        entitlement: EntitlementView,
    ) -> Self {
        Self {
            metrics: config.metrics(),
            tracker: Tracker::new(config.marker_attribute.clone()),
            rescan: Debouncer::new(config.rescan_quiet()),
            notices: NoticeBoard::new(config.notice_duration()),
            panel: PanelSlot::new(),
            coordinator: Coordinator::new(),
            document,
            config,
            entitlement,
            service,
            in_flight: None,
            resize_listener: None,
            upgrade_link: None,
        }
    }

    /// Run the initial scan and start listening for resizes.
    pub fn start(&mut self) -> ScanReport {
        if self.resize_listener.is_none() {
            self.resize_listener = Some(
                self.document
                    .listen(ListenTarget::Window, ListenKind::Resize),
            );
        }
        log::info!(
            "session started with {} via {}",
            self.entitlement.tier().as_str(),
            self.service.provider_name()
        );
        self.scan()
    }

    /// Scan the whole document now.
    pub fn scan(&mut self) -> ScanReport {
        scan_pass(&mut self.document, &mut self.tracker, &self.metrics)
    }

    /// Route a page event.
    pub fn handle(&mut self, event: PageEvent) {
        match event {
            PageEvent::Mutation(record) => self.on_mutation(&record, Instant::now()),
            PageEvent::Resize => self.on_resize(),
            PageEvent::Click { target } => self.on_click(target),
            PageEvent::ToneChange { tone } => {
                if let Some(capability) = self.on_tone_change(&tone) {
                    log::debug!("tone {} refused: {}", tone, capability);
                }
            }
            PageEvent::Submit { options } => {
                if let SubmitOutcome::Rejected(rejection) = self.submit(options) {
                    log::debug!("submission rejected: {}", rejection);
                }
            }
        }
    }

    /// React to child-list mutations observed at `now`.
    pub fn on_mutation(&mut self, record: &MutationRecord, now: Instant) {
        if !record.removed.is_empty() {
            let gone = self.tracker.prune(&mut self.document);
            let panel_gone = self
                .panel
                .current()
                .map(|p| gone.contains(&p.surface) || !self.document.contains(p.surface))
                .unwrap_or(false);
            if panel_gone {
                self.panel.close(&mut self.document);
            }
            if gone.iter().any(|s| self.document.contains(*s)) {
                self.rescan.schedule(now);
            }
        }

        if mutation_requires_rescan(&self.document, record) {
            self.rescan.schedule(now);
        }
    }

    /// Run the debounced rescan if its quiet period is over.
    pub fn rescan_if_due(&mut self, now: Instant) -> Option<ScanReport> {
        if self.rescan.fire_if_due(now) {
            Some(self.scan())
        } else {
            None
        }
    }

    /// Recompute every overlay placement.
    pub fn on_resize(&mut self) {
        let moved = self.tracker.reposition(&mut self.document, &self.metrics);
        self.panel.reposition(&mut self.document, &self.metrics);
        log::debug!("repositioned {} triggers", moved);
    }

    /// Route a click.
    pub fn on_click(&mut self, target: ElementId) {
        if let Some(surface) = self.tracker.surface_for_trigger(&self.document, target) {
            self.open_panel(surface);
            return;
        }
        match self.panel.classify_click(&self.document, target) {
            PanelClick::Close | PanelClick::Outside => {
                self.panel.close(&mut self.document);
            }
            PanelClick::NoPanel | PanelClick::Submit | PanelClick::Inside | PanelClick::OwnTrigger => (),
        }
    }

    /// Open the panel for a surface, replacing any open panel.
    pub fn open_panel(&mut self, surface: ElementId) -> Option<&Panel> {
        let trigger = self.tracker.attachment(surface).map(|a| a.trigger);
        let tier = self.entitlement.tier();
        self.panel
            .open(&mut self.document, surface, trigger, tier, &self.metrics)?;
        if self.coordinator.pending_surface() == Some(surface) {
            self.panel.set_busy(&mut self.document, true);
        }
        self.panel.current()
    }

    /// Close the open panel.
    pub fn close_panel(&mut self) -> Option<Panel> {
        self.panel.close(&mut self.document)
    }

    /// React to a tone picked in the open panel.
    ///
    /// A premium tone on the standard tier brings up the upgrade prompt right
    /// away. The returned capability tells the binding to reset its selector
    /// to [`DEFAULT_TONE`](crate::options::DEFAULT_TONE).
    pub fn on_tone_change(&mut self, tone: &str) -> Option<Capability> {
        if self.entitlement.tier() == Tier::Elevated || !is_premium_tone(tone) {
            return None;
        }
        self.require_upgrade(Capability::PremiumTone);
        Some(Capability::PremiumTone)
    }

    fn require_upgrade(&mut self, capability: Capability) {
        let link = self.upgrade_url();
        log::info!("{} needs an upgrade: {}", capability, link);
        self.upgrade_link = Some(link);
        if let Some(notice) = Rejection::UpgradeRequired(capability).notice() {
            self.show_notice(notice);
        }
    }

    /// Submit the open panel's surface.
    pub fn submit(&mut self, options: OptionSet) -> SubmitOutcome {
        match self.panel.current().map(|p| p.surface) {
            Some(surface) => self.submit_for(surface, options),
            None => SubmitOutcome::Rejected(Rejection::NoSurface),
        }
    }

    /// Submit a specific surface.
    pub fn submit_for(&mut self, surface: ElementId, options: OptionSet) -> SubmitOutcome {
        let tier = self.entitlement.tier();
        let request = match self
            .coordinator
            .submit(&self.document, surface, &options, tier)
        {
            Ok(request) => request,
            Err(rejection) => {
                match rejection {
                    Rejection::UpgradeRequired(capability) => self.require_upgrade(capability),
                    _ => {
                        if let Some(notice) = rejection.notice() {
                            self.show_notice(notice);
                        }
                    }
                }
                return SubmitOutcome::Rejected(rejection);
            }
        };

        self.set_busy(surface, true);

        let service = Arc::clone(&self.service);
        let payload = request.payload;
        self.in_flight = Some(Box::pin(async move { service.optimize(&payload).await }));

        SubmitOutcome::Dispatched(surface)
    }

    /// Wait for the in-flight request, if any, and apply its outcome.
    pub async fn settle(&mut self) -> Option<Completion> {
        let result = self.in_flight.as_mut()?.await;
        Some(self.complete(result))
    }

    /// Apply a service result to the pending request.
    pub fn complete(&mut self, result: OptimoResult<ServiceReply>) -> Completion {
        self.in_flight = None;
        let completion = self
            .coordinator
            .complete(&mut self.document, Outcome::from_result(result));

        if let Some(surface) = completion.surface() {
            self.set_busy(surface, false);
            let owns_panel = self.panel.current().map(|p| p.surface) == Some(surface);
            if owns_panel && completion.closes_panel() {
                self.panel.close(&mut self.document);
            }
        }
        if let Some(notice) = completion.notice() {
            self.show_notice(notice);
        }
        completion
    }

    /// Drive the session until `events` closes.
    ///
    /// Multiplexes page events, the in-flight service call, the rescan
    /// deadline, notice expiry and entitlement changes. A request still in
    /// flight when the channel closes is settled before returning.
    pub async fn run(&mut self, mut events: mpsc::UnboundedReceiver<PageEvent>) {
        let mut entitlement = self.entitlement.clone();
        let mut entitlement_open = true;

        loop {
            let rescan_deadline = self.rescan.deadline();
            let notice_deadline = self.notices.deadline();
            let has_in_flight = self.in_flight.is_some();

            let step = tokio::select! {
                event = events.recv() => match event {
                    Some(event) => Step::Event(event),
                    None => Step::Closed,
                },
                result = await_in_flight(&mut self.in_flight), if has_in_flight => Step::Reply(result),
                () = sleep_until_opt(rescan_deadline), if rescan_deadline.is_some() => Step::Rescan,
                () = sleep_until_opt(notice_deadline), if notice_deadline.is_some() => Step::ExpireNotice,
                open = entitlement.changed(), if entitlement_open => Step::Entitlement(open),
            };

            match step {
                Step::Event(event) => self.handle(event),
                Step::Reply(result) => {
                    self.complete(result);
                }
                Step::Rescan => {
                    self.rescan_if_due(Instant::now());
                }
                Step::ExpireNotice => {
                    self.notices.expire(&mut self.document, Instant::now());
                }
                Step::Entitlement(true) => {
                    log::info!(
                        "tier is now {}, applies to the next panel",
                        entitlement.tier().as_str()
                    );
                }
                Step::Entitlement(false) => entitlement_open = false,
                Step::Closed => {
                    self.settle().await;
                    break;
                }
            }
        }
    }

    fn set_busy(&mut self, surface: ElementId, busy: bool) {
        self.tracker.set_busy(&mut self.document, surface, busy);
        if self.panel.current().map(|p| p.surface) == Some(surface) {
            self.panel.set_busy(&mut self.document, busy);
        }
    }

    fn show_notice(&mut self, notice: Notice) {
        self.notices.show(&mut self.document, notice, Instant::now());
    }

    /// Attachment state of a surface.
    pub fn surface_state(&self, surface: ElementId) -> SurfaceState {
        if self.panel.current().map(|p| p.surface) == Some(surface) {
            SurfaceState::Active
        } else if self.tracker.is_attached(surface) {
            SurfaceState::Attached
        } else {
            SurfaceState::Unattached
        }
    }

    /// Upgrade link for the current user.
    pub fn upgrade_url(&self) -> String {
        upgrade_url(self.entitlement.user_id().as_deref())
    }

    /// Upgrade link produced by the last gated rejection.
    pub fn last_upgrade_link(&self) -> Option<&str> {
        self.upgrade_link.as_deref()
    }

    /// Current tier.
    pub fn tier(&self) -> Tier {
        self.entitlement.tier()
    }

    /// Coordinator state.
    pub fn coordinator_state(&self) -> CoordinatorState {
        self.coordinator.state()
    }

    /// Whether a request is in flight.
    pub fn is_pending(&self) -> bool {
        self.coordinator.is_pending()
    }

    /// The open panel.
    pub fn panel(&self) -> Option<&Panel> {
        self.panel.current()
    }

    /// The visible notice.
    pub fn notice(&self) -> Option<&Notice> {
        self.notices.current()
    }

    /// Attachment bookkeeping.
    pub fn tracker(&self) -> &Tracker {
        &self.tracker
    }

    /// Whether a debounced rescan is waiting.
    pub fn rescan_pending(&self) -> bool {
        self.rescan.is_armed()
    }

    /// Session configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The host document.
    pub fn document(&self) -> &D {
        &self.document
    }

    /// The host document, mutably.
    pub fn document_mut(&mut self) -> &mut D {
        &mut self.document
    }

    /// Give the document back.
    pub fn into_document(self) -> D {
        self.document
    }
}

async fn await_in_flight(in_flight: &mut Option<InFlight>) -> OptimoResult<ServiceReply> {
    match in_flight.as_mut() {
        Some(future) => future.await,
        None => std::future::pending().await,
    }
}

async fn sleep_until_opt(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
