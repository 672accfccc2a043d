use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{Local, NaiveDate};
use tracing::debug;

use super::controller::{Gate, WizardController, WizardError};
use super::form::FormSnapshot;
use super::geocode::{Coordinate, EnrichmentOutcome, GeocodeEnricher, ReverseGeocoder};
use super::messages::MessageCatalog;
use super::prediction::{PredictionGateway, PredictionResponse};
use super::schema::FieldRegistry;
use super::submission::SubmissionController;
use super::toast::{Toast, ToastNotifier, DEFAULT_TOAST_DURATION};

/// What a "next" press resolved to.
#[derive(Debug, Clone, PartialEq)]
pub enum AdvanceOutcome {
    Advanced {
        step: usize,
    },
    /// A required field is empty; the toast names it.
    Blocked {
        field: &'static str,
        toast: Toast,
    },
    /// A previous submission has not settled yet.
    SubmissionInFlight,
    Submitted(PredictionResponse),
    SubmissionFailed {
        error: String,
        toast: Toast,
    },
}

/// Immutable picture of the session for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionView {
    pub step: usize,
    pub step_count: usize,
    pub title: &'static str,
    pub description: &'static str,
    pub form: FormSnapshot,
    pub toast: Option<Toast>,
    /// Toasts shown since the session started.
    pub toasts_shown: u64,
    pub is_submitting: bool,
    pub is_locating: bool,
    pub location_status: Option<&'static str>,
    pub last_result: Option<PredictionResponse>,
    pub submission_error: Option<String>,
}

#[derive(Debug)]
struct SessionState {
    controller: WizardController,
    enricher: Option<GeocodeEnricher>,
    submission: SubmissionController,
    toast: ToastNotifier,
}

fn lock(inner: &Mutex<SessionState>) -> MutexGuard<'_, SessionState> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct SessionBuilder {
    registry: Arc<FieldRegistry>,
    predictor: Arc<dyn PredictionGateway>,
    geocoder: Option<Arc<dyn ReverseGeocoder>>,
    messages: MessageCatalog,
    toast_duration: Duration,
    today: Option<NaiveDate>,
}

impl SessionBuilder {
    pub fn geocoder(mut self, geocoder: Arc<dyn ReverseGeocoder>) -> Self {
        self.geocoder = Some(geocoder);
        self
    }

    pub fn messages(mut self, messages: MessageCatalog) -> Self {
        self.messages = messages;
        self
    }

    pub fn toast_duration(mut self, duration: Duration) -> Self {
        self.toast_duration = duration;
        self
    }

    /// Pins the date used for derived defaults.
    pub fn today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn build(self) -> Result<WizardSession, WizardError> {
        let enricher = match (self.geocoder, self.registry.location()) {
            (Some(geocoder), Some(binding)) => Some(GeocodeEnricher::new(geocoder, *binding)),
            (Some(_), None) => return Err(WizardError::LocationUnsupported),
            (None, _) => None,
        };
        let today = self.today.unwrap_or_else(|| Local::now().date_naive());

        let state = SessionState {
            controller: WizardController::with_date(self.registry, today),
            enricher,
            submission: SubmissionController::new(self.predictor),
            toast: ToastNotifier::new(self.toast_duration),
        };

        Ok(WizardSession {
            inner: Arc::new(Mutex::new(state)),
            messages: self.messages,
        })
    }
}

/// Single owner of one wizard run. Cloning yields another handle to the
/// same session.
#[derive(Debug, Clone)]
pub struct WizardSession {
    inner: Arc<Mutex<SessionState>>,
    messages: MessageCatalog,
}

impl WizardSession {
    pub fn builder(
        registry: Arc<FieldRegistry>,
        predictor: Arc<dyn PredictionGateway>,
    ) -> SessionBuilder {
        SessionBuilder {
            registry,
            predictor,
            geocoder: None,
            messages: MessageCatalog::default(),
            toast_duration: DEFAULT_TOAST_DURATION,
            today: None,
        }
    }

    pub fn registry(&self) -> Arc<FieldRegistry> {
        Arc::clone(lock(&self.inner).controller.registry())
    }

    pub fn messages(&self) -> &MessageCatalog {
        &self.messages
    }

    pub fn supports_location(&self) -> bool {
        lock(&self.inner).enricher.is_some()
    }

    pub fn toast(&self) -> Option<Toast> {
        lock(&self.inner).toast.current().cloned()
    }

    pub fn set_field(&self, name: &str, raw: &str) -> Result<FormSnapshot, WizardError> {
        let mut guard = lock(&self.inner);
        let state = &mut *guard;
        let snapshot = state.controller.set_field(name, raw)?;
        if let Some(enricher) = state.enricher.as_mut() {
            enricher.note_manual_edit(name);
        }
        Ok(snapshot)
    }

    pub fn request_retreat(&self) -> usize {
        lock(&self.inner).controller.request_retreat()
    }

    /// Gates the current step. On the last step with every field filled the
    /// form is posted; the lock is released for the duration of the call.
    pub async fn request_advance(&self) -> AdvanceOutcome {
        let (request, gateway) = {
            let mut guard = lock(&self.inner);
            let state = &mut *guard;
            if state.submission.is_submitting() {
                return AdvanceOutcome::SubmissionInFlight;
            }

            match state.controller.request_advance() {
                Gate::Advanced { step } => {
                    state.toast.clear();
                    return AdvanceOutcome::Advanced { step };
                }
                Gate::Missing { field, label } => {
                    let toast = Toast::warning(self.messages.missing_field(label));
                    state.toast.show(toast.clone());
                    debug!(field, "advance blocked");
                    return AdvanceOutcome::Blocked { field, toast };
                }
                Gate::ReadyToSubmit => {}
            }

            let Some(request) = state.submission.begin(state.controller.values()) else {
                return AdvanceOutcome::SubmissionInFlight;
            };
            state.toast.clear();
            (request, state.submission.gateway())
        };

        let mut pending = InFlight::new(Arc::clone(&self.inner), Pending::Submission);
        let result = gateway.predict(&request).await;
        pending.settle();

        let mut guard = lock(&self.inner);
        let state = &mut *guard;
        match state.submission.finish(result) {
            Ok(response) => AdvanceOutcome::Submitted(response),
            Err(error) => {
                let toast = Toast::error(self.messages.submission_failed(&error));
                state.toast.show(toast.clone());
                AdvanceOutcome::SubmissionFailed { error, toast }
            }
        }
    }

    /// Writes the picked coordinates immediately and returns the lookup that
    /// patches city and district names once it settles. The future owns its
    /// own handle to the session; spawn it or await it.
    pub fn pick_location(
        &self,
        point: Coordinate,
    ) -> Result<impl Future<Output = EnrichmentOutcome> + Send + 'static, WizardError> {
        let (ticket, geocoder) = {
            let mut guard = lock(&self.inner);
            let state = &mut *guard;
            let enricher = state
                .enricher
                .as_mut()
                .ok_or(WizardError::LocationUnsupported)?;
            let ticket = enricher.begin(&mut state.controller, point);
            (ticket, enricher.geocoder())
        };

        let inner = Arc::clone(&self.inner);
        let messages = self.messages.clone();
        let mut pending = InFlight::new(Arc::clone(&inner), Pending::Lookup);
        Ok(async move {
            let result = geocoder.reverse(ticket.point).await;
            pending.settle();

            let mut guard = lock(&inner);
            let state = &mut *guard;
            let outcome = match state.enricher.as_mut() {
                Some(enricher) => enricher.settle(&mut state.controller, ticket, result),
                None => EnrichmentOutcome::Superseded,
            };
            if matches!(outcome, EnrichmentOutcome::Failed { .. }) {
                state.toast.show(Toast::error(messages.geocode_failed()));
            }
            outcome
        })
    }

    pub fn snapshot(&self) -> SessionView {
        let guard = lock(&self.inner);
        let registry = guard.controller.registry();
        let step = guard.controller.current_step();
        let (title, description) = registry
            .step(step)
            .map(|spec| (spec.title, spec.description))
            .unwrap_or(("", ""));

        let is_locating = guard
            .enricher
            .as_ref()
            .is_some_and(GeocodeEnricher::is_busy);
        let shows_map = registry
            .location()
            .is_some_and(|binding| registry.fields_of(step).contains(&binding.latitude));
        let location_status = if is_locating {
            Some(self.messages.locating())
        } else if shows_map && guard.enricher.is_some() {
            Some(self.messages.pick_hint())
        } else {
            None
        };

        SessionView {
            step,
            step_count: registry.step_count(),
            title,
            description,
            form: guard.controller.snapshot(),
            toast: guard.toast.current().cloned(),
            toasts_shown: guard.toast.shown(),
            is_submitting: guard.submission.is_submitting(),
            is_locating,
            location_status,
            last_result: guard.submission.last_result().cloned(),
            submission_error: guard.submission.last_error().map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Pending {
    Submission,
    Lookup,
}

/// Clears a busy flag when the owning future is dropped before settling.
struct InFlight {
    inner: Arc<Mutex<SessionState>>,
    pending: Pending,
    settled: bool,
}

impl InFlight {
    fn new(inner: Arc<Mutex<SessionState>>, pending: Pending) -> Self {
        Self {
            inner,
            pending,
            settled: false,
        }
    }

    fn settle(&mut self) {
        self.settled = true;
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        debug!(pending = ?self.pending, "request dropped before settling");
        let mut guard = lock(&self.inner);
        match self.pending {
            Pending::Submission => guard.submission.abandon(),
            Pending::Lookup => {
                if let Some(enricher) = guard.enricher.as_mut() {
                    enricher.abandon();
                }
            }
        }
    }
}
