//! Order model: event time windows, delivery locations, service demands.
//!
//! An order is one catered event. Its time window spans from setup start
//! to teardown end; the assigned driver is occupied for the whole span
//! plus travel and buffer margins on either side.
//!
//! # Time Model
//! All times are UTC epoch milliseconds. Windows are half-open [start, end).

use serde::{Deserialize, Serialize};

use super::{Capability, CapabilitySet};

/// Postal code used for bookings whose address is not confirmed yet.
pub const PENDING_POSTAL_CODE: &str = "000000";

/// A time interval [start, end).
///
/// Half-open interval: includes start, excludes end.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimeWindow {
    /// Interval start (ms, inclusive).
    pub start_ms: i64,
    /// Interval end (ms, exclusive).
    pub end_ms: i64,
}

impl TimeWindow {
    /// Creates a new time window.
    pub fn new(start_ms: i64, end_ms: i64) -> Self {
        Self { start_ms, end_ms }
    }

    /// Duration of this window (ms).
    #[inline]
    pub fn duration_ms(&self) -> i64 {
        self.end_ms - self.start_ms
    }

    /// Whether a timestamp falls within this window.
    #[inline]
    pub fn contains(&self, time_ms: i64) -> bool {
        time_ms >= self.start_ms && time_ms < self.end_ms
    }

    /// Whether two windows overlap.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start_ms < other.end_ms && other.start_ms < self.end_ms
    }

    /// Returns this window grown by `margin_ms` on both ends.
    pub fn expanded(&self, margin_ms: i64) -> TimeWindow {
        TimeWindow::new(self.start_ms - margin_ms, self.end_ms + margin_ms)
    }

    /// UTC hour of day at the window start (0-23).
    pub fn start_hour_utc(&self) -> u8 {
        self.start_ms.div_euclid(3_600_000).rem_euclid(24) as u8
    }
}

/// A delivery location.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Location {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
    /// Postal code; `"000000"` marks an unconfirmed address.
    pub postal_code: String,
}

impl Location {
    /// Creates a new location.
    pub fn new(lat: f64, lng: f64, postal_code: impl Into<String>) -> Self {
        Self {
            lat,
            lng,
            postal_code: postal_code.into(),
        }
    }

    /// Great-circle distance to another location (km), haversine formula.
    pub fn distance_km(&self, other: &Location) -> f64 {
        const EARTH_RADIUS_KM: f64 = 6371.0;

        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();
        let delta_lat = (other.lat - self.lat).to_radians();
        let delta_lng = (other.lng - self.lng).to_radians();

        let a = (delta_lat / 2.0).sin().powi(2)
            + lat1.cos() * lat2.cos() * (delta_lng / 2.0).sin().powi(2);

        EARTH_RADIUS_KM * 2.0 * a.sqrt().asin()
    }

    /// Whether the address is still to be confirmed.
    pub fn is_address_pending(&self) -> bool {
        self.postal_code == PENDING_POSTAL_CODE
    }
}

/// A delivery order (immutable input record).
///
/// Orders never change during a run; allocation status lives in
/// [`AllocationState`](super::AllocationState), addressed by order id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    /// Unique order identifier.
    pub id: String,
    /// Event window: setup start through teardown end.
    pub window: TimeWindow,
    /// Service region name.
    pub region: String,
    /// Number of guests at the event.
    pub party_size: u32,
    /// Capabilities the assigned driver must hold.
    pub required: CapabilitySet,
    /// Delivery location, when geocoded.
    pub location: Option<Location>,
}

impl Order {
    /// Creates a new order covering [start_ms, end_ms).
    pub fn new(id: impl Into<String>, start_ms: i64, end_ms: i64) -> Self {
        Self {
            id: id.into(),
            window: TimeWindow::new(start_ms, end_ms),
            region: String::new(),
            party_size: 1,
            required: CapabilitySet::empty(),
            location: None,
        }
    }

    /// Sets the service region.
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    /// Sets the party size.
    pub fn with_party_size(mut self, party_size: u32) -> Self {
        self.party_size = party_size;
        self
    }

    /// Adds a required capability.
    pub fn with_required(mut self, cap: Capability) -> Self {
        self.required = self.required.with(cap);
        self
    }

    /// Sets the delivery location.
    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    /// Whether the order requires a given capability.
    pub fn requires(&self, cap: Capability) -> bool {
        self.required.contains(cap)
    }
}
