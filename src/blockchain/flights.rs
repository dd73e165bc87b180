use std::collections::HashMap;
use std::fmt;

use log::debug;
use serde::{Deserialize, Serialize};

use super::{Address, FlightId};
use crate::errors::{SuretyError, SuretyResult};

/// Flight status codes reported by oracles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum FlightStatus {
    Unknown = 0,
    OnTime = 10,
    LateAirline = 20,
    LateWeather = 30,
    LateTechnical = 40,
    LateOther = 50,
}

impl FlightStatus {
    pub const ALL: [FlightStatus; 6] = [
        FlightStatus::Unknown,
        FlightStatus::OnTime,
        FlightStatus::LateAirline,
        FlightStatus::LateWeather,
        FlightStatus::LateTechnical,
        FlightStatus::LateOther,
    ];

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|status| status.code() == code)
    }

    /// Only a delay attributed to the airline pays out.
    pub fn triggers_payout(self) -> bool {
        self == FlightStatus::LateAirline
    }
}

impl fmt::Display for FlightStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FlightStatus::Unknown => "Unknown",
            FlightStatus::OnTime => "OnTime",
            FlightStatus::LateAirline => "LateAirline",
            FlightStatus::LateWeather => "LateWeather",
            FlightStatus::LateTechnical => "LateTechnical",
            FlightStatus::LateOther => "LateOther",
        };
        write!(f, "{} ({})", name, self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Flight {
    pub id: FlightId,
    pub airline: Address,
    pub scheduled_timestamp: u64,
    pub status: FlightStatus,
    /// Set by the first finalization; later finalizations are no-ops.
    pub status_finalized: bool,
}

/// Flight records keyed by globally unique id, remembering insertion order.
#[derive(Debug, Default)]
pub struct FlightRegistry {
    flights: HashMap<FlightId, Flight>,
    order: Vec<FlightId>,
}

impl FlightRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a new flight. The caller is responsible for checking that
    /// `airline` is funded; the registry only enforces id uniqueness.
    pub fn register_flight(
        &mut self,
        airline: Address,
        timestamp: u64,
        id: FlightId,
    ) -> SuretyResult<&Flight> {
        if self.flights.contains_key(&id) {
            return Err(SuretyError::Duplicate(id.to_string()));
        }

        debug!("Registering flight {} for airline {} at {}", id, airline.short(), timestamp);
        self.order.push(id.clone());
        let flight = Flight {
            id: id.clone(),
            airline,
            scheduled_timestamp: timestamp,
            status: FlightStatus::Unknown,
            status_finalized: false,
        };
        Ok(self.flights.entry(id).or_insert(flight))
    }

    /// Registered flight ids in insertion order.
    pub fn list_flights(&self) -> impl Iterator<Item = &FlightId> + '_ {
        self.order.iter()
    }

    pub fn flight(&self, id: &FlightId) -> Option<&Flight> {
        self.flights.get(id)
    }

    pub fn flight_exists(&self, id: &FlightId) -> bool {
        self.flights.contains_key(id)
    }

    /// Whether `id` is registered to `airline` at exactly `timestamp`.
    pub fn matches(&self, airline: &Address, id: &FlightId, timestamp: u64) -> bool {
        self.flights
            .get(id)
            .map(|f| f.airline == *airline && f.scheduled_timestamp == timestamp)
            .unwrap_or(false)
    }

    /// Applies a finalized status. Returns `Ok(false)` when the flight was
    /// already finalized, leaving the first status in place. `Unknown` is the
    /// unset status: agreeing on it leaves the flight open.
    pub fn set_status(
        &mut self,
        id: &FlightId,
        timestamp: u64,
        status: FlightStatus,
    ) -> SuretyResult<bool> {
        let flight = match self.flights.get_mut(id) {
            Some(flight) if flight.scheduled_timestamp == timestamp => flight,
            _ => return Err(SuretyError::UnknownFlight(format!("{}@{}", id, timestamp))),
        };

        if flight.status_finalized {
            debug!("Flight {} already finalized as {}, ignoring {}", id, flight.status, status);
            return Ok(false);
        }
        if status == FlightStatus::Unknown {
            debug!("Flight {} resolved as unknown, left open", id);
            return Ok(false);
        }

        flight.status = status;
        flight.status_finalized = true;
        Ok(true)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
