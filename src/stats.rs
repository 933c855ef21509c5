//! Statistics aggregation over normalized flight records.
//!
//! Both pipelines reduce a batch of records into one immutable summary in a
//! single pass plus a sort for the top-N lists:
//! - [`compute_global_stats`] summarizes OpenSky state vectors.
//! - [`compute_dashboard_stats`] summarizes scheduled flights.
//!
//! Contract notes that hold for both:
//! - Averages are `None` when no record contributed a value; a measured zero
//!   and "no data" are never conflated.
//! - Extremes are `None` when no telemetry was present; this is the crate's
//!   representation for "no data" (the source APIs use a 0 sentinel).
//! - Running maxima use strict `>`, so the first-seen record wins ties.
//! - Top-N lists sort descending by count with a stable sort over insertion
//!   order, so equal counts keep first-encountered order.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{FlightState, FlightStatus, ScheduledFlight};

// ---

/// One entry in a top-N ranking: a key, a display label, and a tally.
#[derive(Debug, Clone, PartialEq, Eq)]
struct TallyEntry {
    key: String,
    label: String,
    count: u64,
}

/// Insertion-ordered tally map.
///
/// Entries remember the order keys were first seen, which the descending
/// stable sort in [`Tally::into_top`] preserves for equal counts.
#[derive(Debug, Default)]
struct Tally {
    index: HashMap<String, usize>,
    entries: Vec<TallyEntry>,
}

impl Tally {
    fn bump(&mut self, key: &str, label: &str) {
        // ---
        match self.index.get(key) {
            Some(&i) => self.entries[i].count += 1,
            None => {
                self.index.insert(key.to_string(), self.entries.len());
                self.entries.push(TallyEntry {
                    key: key.to_string(),
                    label: label.to_string(),
                    count: 1,
                });
            }
        }
    }

    fn distinct(&self) -> usize {
        self.entries.len()
    }

    /// Descending by count, first-seen order on ties, capped at `n`.
    fn into_top(mut self, n: usize) -> Vec<TallyEntry> {
        // ---
        self.entries.sort_by(|a, b| b.count.cmp(&a.count));
        self.entries.truncate(n);
        self.entries
    }
}

/// `round(sum / count)` when any record contributed, else `None`.
fn rounded_avg(sum: f64, count: u64) -> Option<i64> {
    // ---
    (count > 0).then(|| (sum / count as f64).round() as i64)
}

/// Leading 2-4 letter uppercase run of a callsign, e.g. "UAL" from
/// "UAL1234". `None` when the callsign does not start with an airline code.
fn airline_prefix(callsign: &str) -> Option<&str> {
    // ---
    let run = callsign
        .chars()
        .take_while(char::is_ascii_uppercase)
        .count()
        .min(4);
    (run >= 2).then(|| &callsign[..run])
}

// ---

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountryCount {
    pub country: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AirlineCode {
    pub code: String,
    pub count: u64,
}

/// A scalar extreme and the aircraft that owns it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AircraftExtreme {
    pub value: i64,
    pub callsign: Option<String>,
}

/// Summary of one batch of live state vectors.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalStats {
    // ---
    pub total_active: usize,
    pub airborne: usize,
    pub on_ground: usize,
    /// Top 10 origin countries.
    pub by_country: Vec<CountryCount>,
    pub total_countries: usize,
    /// Mean geometric altitude in meters over airborne aircraft reporting
    /// one, `None` when none did.
    pub avg_altitude: Option<i64>,
    /// Mean ground speed in m/s over airborne aircraft reporting one.
    pub avg_speed: Option<i64>,
    pub highest_altitude: Option<AircraftExtreme>,
    pub fastest_aircraft: Option<AircraftExtreme>,
    /// Most frequent callsign prefix across the whole batch.
    pub top_airline: Option<AirlineCode>,
}

/// Reduce a batch of state vectors into a [`GlobalStats`] snapshot.
///
/// Averages and extremes only consider airborne aircraft with a present
/// value; on-ground and non-reporting aircraft still count toward the
/// partition totals and country tallies.
pub fn compute_global_stats(flights: &[FlightState]) -> GlobalStats {
    // ---
    let mut airborne = 0usize;

    let mut countries = Tally::default();
    let mut airlines = Tally::default();

    let mut alt_sum = 0.0;
    let mut alt_count = 0u64;
    let mut spd_sum = 0.0;
    let mut spd_count = 0u64;
    let mut highest: Option<AircraftExtreme> = None;
    let mut highest_raw = f64::NEG_INFINITY;
    let mut fastest: Option<AircraftExtreme> = None;
    let mut fastest_raw = f64::NEG_INFINITY;

    for f in flights {
        countries.bump(&f.origin_country, &f.origin_country);

        if let Some(code) = f.callsign.as_deref().and_then(airline_prefix) {
            airlines.bump(code, code);
        }

        if f.on_ground {
            continue;
        }
        airborne += 1;

        if let Some(alt) = f.geo_altitude {
            alt_sum += alt;
            alt_count += 1;
            if alt > highest_raw {
                highest_raw = alt;
                highest = Some(AircraftExtreme {
                    value: alt.round() as i64,
                    callsign: f.callsign.clone(),
                });
            }
        }
        if let Some(spd) = f.velocity {
            spd_sum += spd;
            spd_count += 1;
            if spd > fastest_raw {
                fastest_raw = spd;
                fastest = Some(AircraftExtreme {
                    value: spd.round() as i64,
                    callsign: f.callsign.clone(),
                });
            }
        }
    }

    let total_countries = countries.distinct();

    // Single busiest prefix; first-seen wins ties via strict `>`.
    let top_airline = airlines
        .entries
        .into_iter()
        .fold(None::<AirlineCode>, |best, e| match best {
            Some(b) if e.count <= b.count => Some(b),
            _ => Some(AirlineCode {
                code: e.key,
                count: e.count,
            }),
        });

    GlobalStats {
        total_active: flights.len(),
        airborne,
        on_ground: flights.len() - airborne,
        by_country: countries
            .into_top(10)
            .into_iter()
            .map(|e| CountryCount {
                country: e.label,
                count: e.count,
            })
            .collect(),
        total_countries,
        avg_altitude: rounded_avg(alt_sum, alt_count),
        avg_speed: rounded_avg(spd_sum, spd_count),
        highest_altitude: highest,
        fastest_aircraft: fastest,
        top_airline,
    }
}

// ---

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedCount {
    pub name: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AirportCount {
    pub iata: String,
    pub name: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DelayExtreme {
    pub iata: String,
    /// Delay in minutes.
    pub delay: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlightExtreme {
    pub value: i64,
    pub flight: String,
}

/// Summary of one batch of scheduled flights.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    // ---
    /// True population reported by the provider, which can exceed
    /// `data_scope` because results arrive capped at one page. Never less
    /// than `data_scope`: a provider that omits its population count gets
    /// the sample size instead.
    pub total_flights: u64,
    pub active_flights: usize,
    pub landed_flights: usize,
    pub scheduled_flights: usize,
    /// Top 5 airlines by flight count.
    pub top_airlines: Vec<NamedCount>,
    /// Top 5 departure airports by flight count.
    pub busiest_departures: Vec<AirportCount>,
    /// Top 5 arrival airports by flight count.
    pub busiest_arrivals: Vec<AirportCount>,
    /// Mean departure delay in minutes over flights with a positive delay.
    pub avg_departure_delay: Option<i64>,
    pub most_delayed_flight: Option<DelayExtreme>,
    pub avg_altitude: Option<i64>,
    pub avg_speed: Option<i64>,
    pub highest_altitude: Option<FlightExtreme>,
    pub fastest_aircraft: Option<FlightExtreme>,
    /// True iff at least one record carried live telemetry.
    pub has_live_data: bool,
    pub fetched_at: DateTime<Utc>,
    /// Number of records actually aggregated.
    pub data_scope: usize,
}

/// Reduce a batch of scheduled flights into a [`DashboardStats`] snapshot.
///
/// `total` is the provider's true population count and may exceed the batch
/// length; the batch length is published as `data_scope`. A `total` below
/// the batch length (the provider omitted its pagination block) is raised
/// to the batch length so `data_scope <= total_flights` always holds.
pub fn compute_dashboard_stats(flights: &[ScheduledFlight], total: u64) -> DashboardStats {
    // ---
    let mut active = 0usize;
    let mut landed = 0usize;
    let mut scheduled = 0usize;

    let mut airlines = Tally::default();
    let mut departures = Tally::default();
    let mut arrivals = Tally::default();

    let mut delay_sum = 0i64;
    let mut delay_count = 0u64;
    let mut most_delayed: Option<DelayExtreme> = None;

    let mut alt_sum = 0.0;
    let mut alt_count = 0u64;
    let mut spd_sum = 0.0;
    let mut spd_count = 0u64;
    let mut highest: Option<FlightExtreme> = None;
    let mut highest_raw = f64::NEG_INFINITY;
    let mut fastest: Option<FlightExtreme> = None;
    let mut fastest_raw = f64::NEG_INFINITY;

    for f in flights {
        match f.status {
            FlightStatus::Active => active += 1,
            FlightStatus::Landed => landed += 1,
            FlightStatus::Scheduled => scheduled += 1,
            _ => {}
        }

        let airline = f.airline_name.as_deref().unwrap_or("Unknown");
        airlines.bump(airline, airline);

        if let Some(iata) = f.departure_iata.as_deref() {
            departures.bump(iata, f.departure_airport.as_deref().unwrap_or(iata));
        }
        if let Some(iata) = f.arrival_iata.as_deref() {
            arrivals.bump(iata, f.arrival_airport.as_deref().unwrap_or(iata));
        }

        if let Some(delay) = f.departure_delay.filter(|d| *d > 0) {
            delay_sum += delay;
            delay_count += 1;
            if most_delayed.as_ref().map_or(true, |m| delay > m.delay) {
                most_delayed = Some(DelayExtreme {
                    iata: f.ident.clone(),
                    delay,
                });
            }
        }

        if let Some(alt) = f.live_altitude.filter(|v| *v > 0.0) {
            alt_sum += alt;
            alt_count += 1;
            if alt > highest_raw {
                highest_raw = alt;
                highest = Some(FlightExtreme {
                    value: alt.round() as i64,
                    flight: f.ident.clone(),
                });
            }
        }
        if let Some(spd) = f.live_speed.filter(|v| *v > 0.0) {
            spd_sum += spd;
            spd_count += 1;
            if spd > fastest_raw {
                fastest_raw = spd;
                fastest = Some(FlightExtreme {
                    value: spd.round() as i64,
                    flight: f.ident.clone(),
                });
            }
        }
    }

    DashboardStats {
        total_flights: total.max(flights.len() as u64),
        active_flights: active,
        landed_flights: landed,
        scheduled_flights: scheduled,
        top_airlines: airlines
            .into_top(5)
            .into_iter()
            .map(|e| NamedCount {
                name: e.label,
                count: e.count,
            })
            .collect(),
        busiest_departures: departures
            .into_top(5)
            .into_iter()
            .map(|e| AirportCount {
                iata: e.key,
                name: e.label,
                count: e.count,
            })
            .collect(),
        busiest_arrivals: arrivals
            .into_top(5)
            .into_iter()
            .map(|e| AirportCount {
                iata: e.key,
                name: e.label,
                count: e.count,
            })
            .collect(),
        avg_departure_delay: (delay_count > 0)
            .then(|| ((delay_sum as f64) / delay_count as f64).round() as i64),
        most_delayed_flight: most_delayed,
        avg_altitude: rounded_avg(alt_sum, alt_count),
        avg_speed: rounded_avg(spd_sum, spd_count),
        highest_altitude: highest,
        fastest_aircraft: fastest,
        has_live_data: alt_count > 0 || spd_count > 0,
        fetched_at: Utc::now(),
        data_scope: flights.len(),
    }
}
