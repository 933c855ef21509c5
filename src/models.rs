//! Data models for the flight pipeline.
//!
//! Two upstream variants feed the service, each with its own raw shape and
//! normalized record:
//! - OpenSky live positions arrive as positional JSON arrays (state vectors)
//!   and normalize into [`FlightState`].
//! - AviationStack scheduled flights arrive as keyed objects with nested
//!   groups and normalize into [`ScheduledFlight`].
//!
//! Both parsers fail only when required identity fields are absent; every
//! other field is an explicit `Option` so that "not reported" never gets
//! conflated with a measured zero downstream in the aggregator.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::MalformedRecord;

// ---

/// One normalized OpenSky state vector.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightState {
    // ---
    pub icao24: String,
    pub callsign: Option<String>,
    pub origin_country: String,
    pub time_position: Option<i64>,
    pub last_contact: i64,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
    pub baro_altitude: Option<f64>,
    pub on_ground: bool,
    pub velocity: Option<f64>,
    pub true_track: Option<f64>,
    pub vertical_rate: Option<f64>,
    pub geo_altitude: Option<f64>,
    pub squawk: Option<String>,
    pub spi: bool,
    pub position_source: u8,
    pub category: u8,
}

impl FlightState {
    /// Normalize one positional state vector as returned by
    /// `GET /states/all`. Field order is fixed by the OpenSky API.
    ///
    /// Fails with [`MalformedRecord`] when the identity fields (`icao24`,
    /// `origin_country`) are absent. Callsigns are trimmed, and an empty
    /// callsign becomes `None`. Trailing fields the API omits on older
    /// records (`category`) default to 0, which is the API's own "no
    /// information" category rather than a missing-value case.
    pub fn from_state_vector(raw: &[Value]) -> Result<Self, MalformedRecord> {
        // ---
        let icao24 = raw
            .first()
            .and_then(Value::as_str)
            .ok_or(MalformedRecord("icao24"))?
            .to_string();

        let callsign = raw
            .get(1)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from);

        let origin_country = raw
            .get(2)
            .and_then(Value::as_str)
            .ok_or(MalformedRecord("origin_country"))?
            .to_string();

        Ok(FlightState {
            icao24,
            callsign,
            origin_country,
            time_position: raw.get(3).and_then(Value::as_i64),
            last_contact: raw.get(4).and_then(Value::as_i64).unwrap_or(0),
            longitude: raw.get(5).and_then(Value::as_f64),
            latitude: raw.get(6).and_then(Value::as_f64),
            baro_altitude: raw.get(7).and_then(Value::as_f64),
            on_ground: raw.get(8).and_then(Value::as_bool).unwrap_or(false),
            velocity: raw.get(9).and_then(Value::as_f64),
            true_track: raw.get(10).and_then(Value::as_f64),
            vertical_rate: raw.get(11).and_then(Value::as_f64),
            geo_altitude: raw.get(13).and_then(Value::as_f64),
            squawk: raw.get(14).and_then(Value::as_str).map(String::from),
            spi: raw.get(15).and_then(Value::as_bool).unwrap_or(false),
            position_source: raw.get(16).and_then(Value::as_u64).unwrap_or(0) as u8,
            category: raw.get(17).and_then(Value::as_u64).unwrap_or(0) as u8,
        })
    }
}

// ---

/// Flight status as reported by the scheduled-flight provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FlightStatus {
    Scheduled,
    Active,
    Landed,
    Cancelled,
    Incident,
    Diverted,
    Unknown,
}

impl FlightStatus {
    fn parse(s: Option<&str>) -> Self {
        // ---
        match s {
            Some("scheduled") => FlightStatus::Scheduled,
            Some("active") => FlightStatus::Active,
            Some("landed") => FlightStatus::Landed,
            Some("cancelled") => FlightStatus::Cancelled,
            Some("incident") => FlightStatus::Incident,
            Some("diverted") => FlightStatus::Diverted,
            _ => FlightStatus::Unknown,
        }
    }
}

/// One normalized scheduled flight.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledFlight {
    // ---
    /// Flight designator, first of `flight.iata`, `flight.icao`,
    /// `flight.number`.
    pub ident: String,
    pub status: FlightStatus,
    pub airline_name: Option<String>,
    pub departure_iata: Option<String>,
    pub departure_airport: Option<String>,
    /// Departure delay in minutes.
    pub departure_delay: Option<i64>,
    pub arrival_iata: Option<String>,
    pub arrival_airport: Option<String>,
    /// Altitude in meters, present only while the provider has live
    /// telemetry for the flight.
    pub live_altitude: Option<f64>,
    /// Horizontal ground speed in km/h, same availability as altitude.
    pub live_speed: Option<f64>,
}

// ---

/// Raw scheduled-flight record as deserialized from the provider.
///
/// Every nested group is optional; an absent group means all of its fields
/// are missing, not that the record is malformed.
#[derive(Debug, Deserialize)]
pub struct RawScheduledFlight {
    // ---
    #[serde(default)]
    pub flight_status: Option<String>,
    #[serde(default)]
    pub departure: Option<RawLeg>,
    #[serde(default)]
    pub arrival: Option<RawLeg>,
    #[serde(default)]
    pub airline: Option<RawAirline>,
    #[serde(default)]
    pub flight: Option<RawFlightIdent>,
    #[serde(default)]
    pub live: Option<RawLiveTelemetry>,
}

#[derive(Debug, Deserialize)]
pub struct RawLeg {
    #[serde(default)]
    pub airport: Option<String>,
    #[serde(default)]
    pub iata: Option<String>,
    #[serde(default)]
    pub delay: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct RawAirline {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RawFlightIdent {
    #[serde(default)]
    pub number: Option<String>,
    #[serde(default)]
    pub iata: Option<String>,
    #[serde(default)]
    pub icao: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RawLiveTelemetry {
    #[serde(default)]
    pub altitude: Option<f64>,
    #[serde(default)]
    pub speed_horizontal: Option<f64>,
}

impl RawScheduledFlight {
    /// Normalize into a [`ScheduledFlight`], or fail with
    /// [`MalformedRecord`] when no flight designator is present at all.
    pub fn normalize(self) -> Result<ScheduledFlight, MalformedRecord> {
        // ---
        let ident = self
            .flight
            .as_ref()
            .and_then(|f| {
                f.iata
                    .as_deref()
                    .or(f.icao.as_deref())
                    .or(f.number.as_deref())
            })
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .ok_or(MalformedRecord("flight designator"))?;

        let (departure_airport, departure_iata, departure_delay) = match self.departure {
            Some(leg) => (leg.airport, leg.iata, leg.delay),
            None => (None, None, None),
        };
        let (arrival_airport, arrival_iata) = match self.arrival {
            Some(leg) => (leg.airport, leg.iata),
            None => (None, None),
        };
        let (live_altitude, live_speed) = match self.live {
            Some(live) => (live.altitude, live.speed_horizontal),
            None => (None, None),
        };

        Ok(ScheduledFlight {
            ident,
            status: FlightStatus::parse(self.flight_status.as_deref()),
            airline_name: self.airline.and_then(|a| a.name),
            departure_iata,
            departure_airport,
            departure_delay,
            arrival_iata,
            arrival_airport,
            live_altitude,
            live_speed,
        })
    }
}
