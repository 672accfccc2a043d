use async_trait::async_trait;
use chrono::NaiveDate;
use price_wizard::wizard::{
    Address, AdvanceOutcome, Coordinate, EnrichmentOutcome, FieldRegistry, FieldValue,
    GatewayError, MessageCatalog, PredictionGateway, PredictionRequest, PredictionResponse,
    ReverseGeocoder, SchemaVariant, ToastLevel, WizardError, WizardSession,
};
use serde_json::json;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{oneshot, Notify};

#[derive(Debug, Default)]
struct FakePredictor {
    calls: Mutex<Vec<PredictionRequest>>,
    replies: Mutex<VecDeque<Result<PredictionResponse, GatewayError>>>,
    gate: Option<Arc<Notify>>,
}

impl FakePredictor {
    fn replying(replies: Vec<Result<PredictionResponse, GatewayError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            ..Self::default()
        }
    }

    fn calls(&self) -> Vec<PredictionRequest> {
        self.calls.lock().expect("calls mutex poisoned").clone()
    }
}

#[async_trait]
impl PredictionGateway for FakePredictor {
    async fn predict(
        &self,
        request: &PredictionRequest,
    ) -> Result<PredictionResponse, GatewayError> {
        self.calls
            .lock()
            .expect("calls mutex poisoned")
            .push(request.clone());
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.replies
            .lock()
            .expect("replies mutex poisoned")
            .pop_front()
            .unwrap_or_else(|| Err(GatewayError::Unavailable("no reply scripted".to_string())))
    }
}

type PendingLookup = oneshot::Sender<Result<Address, GatewayError>>;

/// Lookups stay pending until the test resolves them, in any order.
#[derive(Debug, Default)]
struct ManualGeocoder {
    pending: Mutex<Vec<(Coordinate, Option<PendingLookup>)>>,
}

impl ManualGeocoder {
    fn requested(&self) -> usize {
        self.pending.lock().expect("pending mutex poisoned").len()
    }

    fn resolve(&self, index: usize, result: Result<Address, GatewayError>) {
        let sender = self.pending.lock().expect("pending mutex poisoned")[index]
            .1
            .take()
            .expect("lookup not yet resolved");
        sender.send(result).expect("lookup future still waiting");
    }
}

#[async_trait]
impl ReverseGeocoder for ManualGeocoder {
    async fn reverse(&self, point: Coordinate) -> Result<Address, GatewayError> {
        let (sender, receiver) = oneshot::channel();
        self.pending
            .lock()
            .expect("pending mutex poisoned")
            .push((point, Some(sender)));
        receiver
            .await
            .unwrap_or_else(|_| Err(GatewayError::Unavailable("lookup dropped".to_string())))
    }
}

async fn wait_for_lookups(geocoder: &ManualGeocoder, count: usize) {
    while geocoder.requested() < count {
        tokio::task::yield_now().await;
    }
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 1).expect("valid date")
}

fn bandung() -> Arc<FieldRegistry> {
    Arc::new(SchemaVariant::Bandung.registry().expect("bandung schema valid"))
}

fn session_with(
    predictor: Arc<FakePredictor>,
    geocoder: Arc<ManualGeocoder>,
) -> WizardSession {
    WizardSession::builder(bandung(), predictor)
        .geocoder(geocoder)
        .today(today())
        .build()
        .expect("session builds")
}

fn fill_property_step(session: &WizardSession) {
    for (name, raw) in [
        ("Land", "120"),
        ("Building", "90"),
        ("Bedroom", "3"),
        ("Bathroom", "2"),
        ("Carport", "1"),
    ] {
        session.set_field(name, raw).expect("field accepts input");
    }
}

fn fill_location_step(session: &WizardSession) {
    for (name, raw) in [
        ("Latitude", "-6.9"),
        ("Longitude", "107.6"),
        ("City_Regency", "Bandung"),
        ("Location", "Coblong"),
    ] {
        session.set_field(name, raw).expect("field accepts input");
    }
}

fn local_response() -> PredictionResponse {
    serde_json::from_value(json!({
        "predicted_price": 500000000,
        "formatted": "Rp 500.000.000",
        "similar": []
    }))
    .expect("response decodes")
}

fn city_only(city: &str) -> Address {
    Address {
        city: Some(city.to_string()),
        ..Address::default()
    }
}

#[tokio::test]
async fn scenario_a_complete_first_step_advances_without_toast() {
    let session = session_with(Arc::default(), Arc::default());
    fill_property_step(&session);

    assert_eq!(
        session.request_advance().await,
        AdvanceOutcome::Advanced { step: 1 }
    );
    let view = session.snapshot();
    assert_eq!(view.step, 1);
    assert!(view.toast.is_none());
}

#[tokio::test]
async fn first_step_gap_blocks_with_label_of_first_missing_field() {
    let session = session_with(Arc::default(), Arc::default());
    session.set_field("Land", "120").expect("accepts");
    session.set_field("Bedroom", "3").expect("accepts");

    let outcome = session.request_advance().await;
    let AdvanceOutcome::Blocked { field, toast } = outcome else {
        panic!("expected a blocked advance");
    };
    assert_eq!(field, "Building");
    assert_eq!(toast.message, "Please fill Building area (m²) first");
    assert_eq!(toast.level, ToastLevel::Warning);
    assert_eq!(session.snapshot().step, 0);
}

#[tokio::test]
async fn scenario_b_last_step_gap_blocks_without_submission() {
    let predictor = Arc::new(FakePredictor::default());
    let session = session_with(predictor.clone(), Arc::default());
    fill_property_step(&session);
    session.request_advance().await;
    session.set_field("Latitude", "-6.9").expect("accepts");
    session.set_field("Longitude", "107.6").expect("accepts");
    session.set_field("City_Regency", "Bandung").expect("accepts");

    let outcome = session.request_advance().await;
    let AdvanceOutcome::Blocked { field, toast } = outcome else {
        panic!("expected a blocked submit");
    };
    let label = bandung()
        .spec_of("Location")
        .map(|spec| spec.label)
        .expect("location field declared");
    assert_eq!(field, "Location");
    assert_eq!(toast.message, MessageCatalog::default().missing_field(label));
    assert_eq!(session.snapshot().step, 1);
    assert!(predictor.calls().is_empty());
}

#[tokio::test]
async fn scenario_c_full_form_submits_once_with_flat_record() {
    let predictor = Arc::new(FakePredictor::replying(vec![Ok(local_response())]));
    let session = session_with(predictor.clone(), Arc::default());
    fill_property_step(&session);
    session.request_advance().await;
    fill_location_step(&session);

    let outcome = session.request_advance().await;
    let AdvanceOutcome::Submitted(response) = outcome else {
        panic!("expected a submission");
    };
    assert_eq!(response.formatted.as_deref(), Some("Rp 500.000.000"));
    assert!(response.similar_listings().is_empty());

    let calls = predictor.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].form(), &session.snapshot().form.values);
    assert_eq!(
        serde_json::to_value(&calls[0]).expect("request serializes"),
        json!({
            "Land": 120,
            "Building": 90,
            "Bedroom": 3,
            "Bathroom": 2,
            "Carport": 1,
            "Month": 6,
            "Latitude": -6.9,
            "Longitude": 107.6,
            "City_Regency": "Bandung",
            "Location": "Coblong"
        })
    );

    let view = session.snapshot();
    assert!(!view.is_submitting);
    assert_eq!(
        view.last_result
            .as_ref()
            .and_then(|result| result.formatted.as_deref()),
        Some("Rp 500.000.000")
    );
}

#[tokio::test]
async fn scenario_d_pick_fills_coordinates_before_lookup_settles() {
    let geocoder = Arc::new(ManualGeocoder::default());
    let session = session_with(Arc::default(), geocoder.clone());

    let lookup = session
        .pick_location(Coordinate::new(-6.9, 107.6))
        .expect("bandung supports picks");

    let view = session.snapshot();
    assert!(view.form.filled.is_filled("Latitude"));
    assert!(view.form.filled.is_filled("Longitude"));
    assert_eq!(
        view.form.values.get("Latitude"),
        Some(&FieldValue::Number(-6.9))
    );
    assert_eq!(
        view.form.values.get("Longitude"),
        Some(&FieldValue::Number(107.6))
    );
    assert!(view.is_locating);
    assert_eq!(geocoder.requested(), 0);

    let task = tokio::spawn(lookup);
    wait_for_lookups(&geocoder, 1).await;
    geocoder.resolve(
        0,
        Ok(Address {
            city: Some("Bandung".to_string()),
            suburb: Some("Dago".to_string()),
            ..Address::default()
        }),
    );
    assert_eq!(
        task.await.expect("lookup task completes"),
        EnrichmentOutcome::Applied {
            city: Some("Bandung".to_string()),
            district: Some("Dago".to_string()),
        }
    );
    let view = session.snapshot();
    assert!(!view.is_locating);
    assert_eq!(view.form.display_value("City_Regency"), "Bandung");
    assert_eq!(view.form.display_value("Location"), "Dago");
}

#[tokio::test]
async fn city_only_enrichment_leaves_district_untouched() {
    let geocoder = Arc::new(ManualGeocoder::default());
    let session = session_with(Arc::default(), geocoder.clone());
    session.set_field("Location", "Dago").expect("accepts");

    let task = tokio::spawn(
        session
            .pick_location(Coordinate::new(-6.9, 107.6))
            .expect("pick accepted"),
    );
    wait_for_lookups(&geocoder, 1).await;
    geocoder.resolve(0, Ok(city_only("Bandung")));

    assert_eq!(
        task.await.expect("lookup task completes"),
        EnrichmentOutcome::Applied {
            city: Some("Bandung".to_string()),
            district: None,
        }
    );
    let view = session.snapshot();
    assert!(view.form.filled.is_filled("City_Regency"));
    assert_eq!(
        view.form.values.get("Location"),
        Some(&FieldValue::Text("Dago".to_string()))
    );
    assert!(view.form.filled.is_filled("Location"));
    assert!(view.toast.is_none());
}

#[tokio::test]
async fn failed_enrichment_keeps_fields_and_emits_one_error_toast() {
    let geocoder = Arc::new(ManualGeocoder::default());
    let session = session_with(Arc::default(), geocoder.clone());
    session
        .set_field("City_Regency", "Kota Bandung")
        .expect("city accepts input");
    session
        .set_field("Location", "Dago")
        .expect("district accepts input");
    let toasts_before = session.snapshot().toasts_shown;

    let task = tokio::spawn(
        session
            .pick_location(Coordinate::new(-6.9, 107.6))
            .expect("pick accepted"),
    );
    wait_for_lookups(&geocoder, 1).await;
    geocoder.resolve(
        0,
        Err(GatewayError::Status {
            endpoint: "reverse geocoding endpoint",
            status: 503,
        }),
    );

    let outcome = task.await.expect("lookup task completes");
    assert!(matches!(outcome, EnrichmentOutcome::Failed { .. }));

    let view = session.snapshot();
    assert!(view.form.filled.is_filled("City_Regency"));
    assert!(view.form.filled.is_filled("Location"));
    assert_eq!(view.form.display_value("City_Regency"), "Kota Bandung");
    assert_eq!(view.form.display_value("Location"), "Dago");
    assert!(view.form.filled.is_filled("Latitude"));
    assert_eq!(view.toasts_shown, toasts_before + 1);
    let toast = view.toast.expect("failure toast visible");
    assert_eq!(toast.level, ToastLevel::Error);
    assert_eq!(toast.message, MessageCatalog::default().geocode_failed());
}

#[tokio::test]
async fn superseded_lookup_is_discarded() {
    let geocoder = Arc::new(ManualGeocoder::default());
    let session = session_with(Arc::default(), geocoder.clone());

    let first = tokio::spawn(
        session
            .pick_location(Coordinate::new(-6.9, 107.6))
            .expect("pick accepted"),
    );
    wait_for_lookups(&geocoder, 1).await;
    let second = tokio::spawn(
        session
            .pick_location(Coordinate::new(-6.87, 107.54))
            .expect("pick accepted"),
    );
    wait_for_lookups(&geocoder, 2).await;

    geocoder.resolve(1, Ok(city_only("Cimahi")));
    assert!(matches!(
        second.await.expect("second lookup completes"),
        EnrichmentOutcome::Applied { .. }
    ));
    assert!(session.snapshot().is_locating);

    geocoder.resolve(0, Ok(city_only("Bandung")));
    assert_eq!(
        first.await.expect("first lookup completes"),
        EnrichmentOutcome::Superseded
    );

    let view = session.snapshot();
    assert!(!view.is_locating);
    assert_eq!(view.form.display_value("City_Regency"), "Cimahi");
    assert_eq!(
        view.form.values.get("Latitude"),
        Some(&FieldValue::Number(-6.87))
    );
}

#[tokio::test]
async fn manual_edit_during_lookup_survives_late_response() {
    let geocoder = Arc::new(ManualGeocoder::default());
    let session = session_with(Arc::default(), geocoder.clone());

    let task = tokio::spawn(
        session
            .pick_location(Coordinate::new(-6.9, 107.6))
            .expect("pick accepted"),
    );
    wait_for_lookups(&geocoder, 1).await;
    session
        .set_field("City_Regency", "Kota Bandung")
        .expect("accepts");
    geocoder.resolve(
        0,
        Ok(Address {
            city: Some("Bandung".to_string()),
            city_district: Some("Coblong".to_string()),
            ..Address::default()
        }),
    );

    assert_eq!(
        task.await.expect("lookup task completes"),
        EnrichmentOutcome::Applied {
            city: None,
            district: Some("Coblong".to_string()),
        }
    );
    let view = session.snapshot();
    assert_eq!(view.form.display_value("City_Regency"), "Kota Bandung");
    assert_eq!(view.form.display_value("Location"), "Coblong");
}

#[tokio::test]
async fn submission_failure_keeps_form_and_allows_retry() {
    let predictor = Arc::new(FakePredictor::replying(vec![
        Err(GatewayError::Status {
            endpoint: "prediction endpoint",
            status: 500,
        }),
        Ok(local_response()),
    ]));
    let session = session_with(predictor.clone(), Arc::default());
    fill_property_step(&session);
    session.request_advance().await;
    fill_location_step(&session);
    let before = session.snapshot().form;

    let outcome = session.request_advance().await;
    let AdvanceOutcome::SubmissionFailed { error, toast } = outcome else {
        panic!("expected a failed submission");
    };
    assert!(error.contains("HTTP 500"));
    assert_eq!(toast.level, ToastLevel::Error);

    let view = session.snapshot();
    assert_eq!(view.step, 1);
    assert_eq!(view.form, before);
    assert!(!view.is_submitting);
    assert_eq!(view.submission_error.as_deref(), Some(error.as_str()));
    assert!(view.last_result.is_none());

    assert!(matches!(
        session.request_advance().await,
        AdvanceOutcome::Submitted(_)
    ));
    assert_eq!(predictor.calls().len(), 2);
    assert!(session.snapshot().submission_error.is_none());
}

#[tokio::test]
async fn second_submit_while_in_flight_is_rejected() {
    let gate = Arc::new(Notify::new());
    let predictor = Arc::new(FakePredictor {
        replies: Mutex::new(VecDeque::from([Ok(local_response())])),
        gate: Some(gate.clone()),
        ..FakePredictor::default()
    });
    let session = session_with(predictor.clone(), Arc::default());
    fill_property_step(&session);
    session.request_advance().await;
    fill_location_step(&session);

    let background = session.clone();
    let first = tokio::spawn(async move { background.request_advance().await });
    while predictor.calls().is_empty() {
        tokio::task::yield_now().await;
    }
    assert!(session.snapshot().is_submitting);
    assert_eq!(
        session.request_advance().await,
        AdvanceOutcome::SubmissionInFlight
    );

    gate.notify_one();
    assert!(matches!(
        first.await.expect("submission task completes"),
        AdvanceOutcome::Submitted(_)
    ));
    assert_eq!(predictor.calls().len(), 1);
    assert!(!session.snapshot().is_submitting);
}

#[tokio::test]
async fn dropped_submission_releases_the_in_flight_flag() {
    let predictor = Arc::new(FakePredictor {
        replies: Mutex::new(VecDeque::from([Ok(local_response())])),
        gate: Some(Arc::new(Notify::new())),
        ..FakePredictor::default()
    });
    let session = session_with(predictor.clone(), Arc::default());
    fill_property_step(&session);
    session.request_advance().await;
    fill_location_step(&session);

    let timed_out =
        tokio::time::timeout(Duration::from_millis(20), session.request_advance()).await;
    assert!(timed_out.is_err());
    assert!(!session.snapshot().is_submitting);
}

#[tokio::test]
async fn lookup_dropped_before_first_poll_releases_the_busy_flag() {
    let geocoder = Arc::new(ManualGeocoder::default());
    let session = session_with(Arc::default(), geocoder.clone());
    fill_property_step(&session);
    session.request_advance().await;

    let lookup = session
        .pick_location(Coordinate::new(-6.9, 107.6))
        .expect("pick accepted");
    let view = session.snapshot();
    assert!(view.is_locating);
    assert_eq!(view.location_status, Some(MessageCatalog::default().locating()));

    drop(lookup);
    let view = session.snapshot();
    assert!(!view.is_locating);
    assert_eq!(view.location_status, Some(MessageCatalog::default().pick_hint()));
    assert!(view.form.filled.is_filled("Latitude"));
    assert!(view.form.filled.is_filled("Longitude"));
}

#[tokio::test(start_paused = true)]
async fn blocked_toast_expires_after_configured_interval() {
    let session = WizardSession::builder(bandung(), Arc::new(FakePredictor::default()))
        .toast_duration(Duration::from_millis(2200))
        .today(today())
        .build()
        .expect("session builds");

    session.request_advance().await;
    assert!(session.toast().is_some());

    tokio::time::advance(Duration::from_millis(2199)).await;
    assert!(session.toast().is_some());
    tokio::time::advance(Duration::from_millis(1)).await;
    assert!(session.toast().is_none());
}

#[tokio::test]
async fn retreat_is_clamped_and_skips_validation() {
    let session = session_with(Arc::default(), Arc::default());
    assert_eq!(session.request_retreat(), 0);

    fill_property_step(&session);
    session.request_advance().await;
    session.set_field("Land", "").expect("clearing is allowed");
    assert_eq!(session.request_retreat(), 0);
    assert_eq!(session.request_retreat(), 0);
}

#[tokio::test]
async fn schemas_without_location_reject_picks() {
    let registry = Arc::new(
        SchemaVariant::KingCounty
            .registry()
            .expect("king county schema valid"),
    );
    let predictor: Arc<FakePredictor> = Arc::default();

    let err = WizardSession::builder(registry.clone(), predictor.clone())
        .geocoder(Arc::new(ManualGeocoder::default()))
        .build()
        .expect_err("geocoder needs a location binding");
    assert_eq!(err, WizardError::LocationUnsupported);

    let session = WizardSession::builder(registry, predictor)
        .build()
        .expect("session builds");
    assert!(!session.supports_location());
    assert!(matches!(
        session.pick_location(Coordinate::new(47.5, -122.2)),
        Err(WizardError::LocationUnsupported)
    ));
    assert!(session.snapshot().location_status.is_none());
}
