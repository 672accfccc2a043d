use std::collections::BTreeSet;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::controller::WizardController;
use super::form::FieldValue;
use super::gateway::{http_client, GatewayError};
use super::schema::LocationBinding;

const REVERSE_ENDPOINT: &str = "reverse geocoding endpoint";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Administrative parts of a reverse-geocoded address. Every part is
/// optional; blank strings count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Address {
    pub city: Option<String>,
    pub town: Option<String>,
    pub state_district: Option<String>,
    pub state: Option<String>,
    pub county: Option<String>,
    pub village: Option<String>,
    pub city_district: Option<String>,
    pub suburb: Option<String>,
    pub district: Option<String>,
}

impl Address {
    /// City or regency: city, town, state district, state, county, village.
    pub fn city_name(&self) -> Option<&str> {
        first_present([
            &self.city,
            &self.town,
            &self.state_district,
            &self.state,
            &self.county,
            &self.village,
        ])
    }

    /// Sub-district: city district, suburb, village, town, district.
    pub fn district_name(&self) -> Option<&str> {
        first_present([
            &self.city_district,
            &self.suburb,
            &self.village,
            &self.town,
            &self.district,
        ])
    }
}

fn first_present<const N: usize>(candidates: [&Option<String>; N]) -> Option<&str> {
    candidates
        .into_iter()
        .filter_map(|candidate| candidate.as_deref())
        .find(|value| !value.is_empty())
}

/// Outbound reverse geocoding provider.
#[async_trait]
pub trait ReverseGeocoder: Debug + Send + Sync {
    async fn reverse(&self, point: Coordinate) -> Result<Address, GatewayError>;
}

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    address: Option<Address>,
}

/// Nominatim `GET {base}/reverse` client.
#[derive(Debug, Clone)]
pub struct NominatimClient {
    client: reqwest::Client,
    url: String,
    language: String,
}

impl NominatimClient {
    pub fn new(
        base_url: &str,
        language: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, GatewayError> {
        Ok(Self {
            client: http_client(timeout)?,
            url: format!("{}/reverse", base_url.trim_end_matches('/')),
            language: language.into(),
        })
    }
}

#[async_trait]
impl ReverseGeocoder for NominatimClient {
    async fn reverse(&self, point: Coordinate) -> Result<Address, GatewayError> {
        let response = self
            .client
            .get(&self.url)
            .query(&[
                ("format", "jsonv2".to_string()),
                ("lat", point.latitude.to_string()),
                ("lon", point.longitude.to_string()),
                ("addressdetails", "1".to_string()),
            ])
            .header(reqwest::header::ACCEPT_LANGUAGE, &self.language)
            .send()
            .await
            .map_err(|source| GatewayError::Transport {
                endpoint: REVERSE_ENDPOINT,
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::Status {
                endpoint: REVERSE_ENDPOINT,
                status: status.as_u16(),
            });
        }

        let body: ReverseResponse = response.json().await.map_err(|err| GatewayError::Decode {
            endpoint: REVERSE_ENDPOINT,
            detail: err.to_string(),
        })?;

        body.address.ok_or_else(|| GatewayError::Decode {
            endpoint: REVERSE_ENDPOINT,
            detail: "response has no address".to_string(),
        })
    }
}

/// Identifies one location pick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickTicket {
    pub sequence: u64,
    pub point: Coordinate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnrichmentOutcome {
    /// Names merged into the form; `None` means the field was left alone.
    Applied {
        city: Option<String>,
        district: Option<String>,
    },
    /// Lookup failed; location text fields untouched.
    Failed { reason: String },
    /// A newer pick was issued before this one settled.
    Superseded,
}

/// Fills location fields from a map pick and patches city/district names
/// when the reverse lookup settles.
#[derive(Debug)]
pub struct GeocodeEnricher {
    geocoder: Arc<dyn ReverseGeocoder>,
    binding: LocationBinding,
    latest: u64,
    in_flight: usize,
    edited_since_pick: BTreeSet<&'static str>,
}

impl GeocodeEnricher {
    pub fn new(geocoder: Arc<dyn ReverseGeocoder>, binding: LocationBinding) -> Self {
        Self {
            geocoder,
            binding,
            latest: 0,
            in_flight: 0,
            edited_since_pick: BTreeSet::new(),
        }
    }

    pub fn geocoder(&self) -> Arc<dyn ReverseGeocoder> {
        Arc::clone(&self.geocoder)
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight > 0
    }

    /// Synchronous half of a pick: coordinates land in the form as filled.
    pub fn begin(&mut self, controller: &mut WizardController, point: Coordinate) -> PickTicket {
        controller.assign(
            self.binding.latitude,
            FieldValue::Number(point.latitude),
            true,
        );
        controller.assign(
            self.binding.longitude,
            FieldValue::Number(point.longitude),
            true,
        );

        self.latest += 1;
        self.in_flight += 1;
        self.edited_since_pick.clear();
        debug!(sequence = self.latest, ?point, "location picked");

        PickTicket {
            sequence: self.latest,
            point,
        }
    }

    /// Releases the busy count of a lookup that will never settle.
    pub fn abandon(&mut self) {
        self.in_flight = self.in_flight.saturating_sub(1);
    }

    /// Records a manual edit so a pending lookup does not overwrite it.
    pub fn note_manual_edit(&mut self, field: &str) {
        if !self.is_busy() {
            return;
        }
        if field == self.binding.city {
            self.edited_since_pick.insert(self.binding.city);
        } else if field == self.binding.district {
            self.edited_since_pick.insert(self.binding.district);
        }
    }

    pub fn settle(
        &mut self,
        controller: &mut WizardController,
        ticket: PickTicket,
        result: Result<Address, GatewayError>,
    ) -> EnrichmentOutcome {
        self.in_flight = self.in_flight.saturating_sub(1);

        if ticket.sequence != self.latest {
            debug!(
                sequence = ticket.sequence,
                latest = self.latest,
                "discarding superseded lookup"
            );
            return EnrichmentOutcome::Superseded;
        }

        let address = match result {
            Ok(address) => address,
            Err(err) => {
                warn!(error = %err, point = ?ticket.point, "reverse lookup failed");
                return EnrichmentOutcome::Failed {
                    reason: err.to_string(),
                };
            }
        };

        let city = self.merge(controller, self.binding.city, address.city_name());
        let district = self.merge(controller, self.binding.district, address.district_name());
        debug!(?city, ?district, "location names merged");
        EnrichmentOutcome::Applied { city, district }
    }

    fn merge(
        &self,
        controller: &mut WizardController,
        field: &'static str,
        resolved: Option<&str>,
    ) -> Option<String> {
        let name = resolved?;
        if self.edited_since_pick.contains(field) {
            debug!(field, "keeping manual edit over lookup result");
            return None;
        }
        controller.assign(field, FieldValue::Text(name.to_string()), true);
        Some(name.to_string())
    }
}
