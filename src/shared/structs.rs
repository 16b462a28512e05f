/***************************************/
/*        3rd party libraries          */
/***************************************/
use serde::Deserialize;
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/***************************************/
/*           Local modules             */
/***************************************/
use crate::shared::error::{SimError, SimResult};

/***************************************/
/*             Constants               */
/***************************************/
pub const DEFAULT_ELEVATOR_CAPACITY: u32 = 8;
pub const LOBBY_FLOOR: u8 = 0;

/***************************************/
/*             Identifiers             */
/***************************************/
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElevatorId(pub u32);

impl fmt::Display for ElevatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "elevator-{}", self.0)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "request-{}", self.0)
    }
}

/***************************************/
/*               Enums                 */
/***************************************/
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Idle,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DoorState {
    Open,
    Closed,
    Opening,
    Closing,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RequestDirection {
    Up,
    Down,
}

impl RequestDirection {
    pub fn between(origin: u8, destination: u8) -> RequestDirection {
        if destination > origin {
            RequestDirection::Up
        } else {
            RequestDirection::Down
        }
    }

    /// Whether an elevator travelling in `direction` serves this request direction.
    pub fn matches(&self, direction: Direction) -> bool {
        matches!(
            (self, direction),
            (RequestDirection::Up, Direction::Up) | (RequestDirection::Down, Direction::Down)
        )
    }
}

/**
 * Lifecycle of a request. Transitions only ever move one step forward:
 * `Pending -> Assigned -> PickedUp -> Completed`.
 */
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RequestStatus {
    #[serde(rename = "pending")]
    Pending,
    #[serde(rename = "assigned")]
    Assigned,
    #[serde(rename = "picked_up")]
    PickedUp,
    #[serde(rename = "completed")]
    Completed,
}

impl RequestStatus {
    pub fn next(&self) -> Option<RequestStatus> {
        match self {
            RequestStatus::Pending => Some(RequestStatus::Assigned),
            RequestStatus::Assigned => Some(RequestStatus::PickedUp),
            RequestStatus::PickedUp => Some(RequestStatus::Completed),
            RequestStatus::Completed => None,
        }
    }

    /// Pending and Assigned requests are still waiting for a car.
    pub fn is_waiting(&self) -> bool {
        matches!(self, RequestStatus::Pending | RequestStatus::Assigned)
    }
}

/***************************************/
/*       Public data structures        */
/***************************************/

/**
 * One elevator car.
 *
 * # Fields
 * - `current_floor`:       Floor the car is at (or last passed).
 * - `target_floor`:        Floor the car is heading to, `None` while stationary.
 * - `direction`:           Current travel direction.
 * - `door_state`:          Door state machine position.
 * - `passenger_count`:     Passengers on board, never above `max_capacity`.
 * - `is_moving`:           True while travelling with doors closed.
 * - `requests`:            Ids of requests bound to this car and not yet completed.
 * - `last_update_time`:    Wall-clock ms of the last tick that stepped this car.
 * - `door_close_at`:       Wall-clock ms at which an open door starts closing.
 */
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Elevator {
    pub id: ElevatorId,
    pub current_floor: u8,
    pub target_floor: Option<u8>,
    pub direction: Direction,
    pub door_state: DoorState,
    pub passenger_count: u32,
    pub max_capacity: u32,
    pub is_moving: bool,
    pub requests: Vec<RequestId>,
    pub last_update_time: u64,
    #[serde(skip)]
    pub door_close_at: Option<u64>,
}

impl Elevator {
    pub fn new(id: ElevatorId, max_capacity: u32, now: u64) -> Elevator {
        Elevator {
            id,
            current_floor: LOBBY_FLOOR,
            target_floor: None,
            direction: Direction::Idle,
            door_state: DoorState::Closed,
            passenger_count: 0,
            max_capacity,
            is_moving: false,
            requests: Vec::new(),
            last_update_time: now,
            door_close_at: None,
        }
    }

    /// Stationary with doors shut and nowhere to go.
    pub fn is_idle(&self) -> bool {
        self.target_floor.is_none() && self.door_state == DoorState::Closed
    }

    pub fn is_full(&self) -> bool {
        self.passenger_count >= self.max_capacity
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    pub id: RequestId,
    pub origin_floor: u8,
    pub destination_floor: u8,
    pub direction: RequestDirection,
    pub timestamp: u64,
    pub priority: u32,
    pub assigned_elevator_id: Option<ElevatorId>,
    pub status: RequestStatus,
    pub wait_time: u64,
    pub travel_time: u64,
}

impl Request {
    pub fn new(
        id: RequestId,
        origin_floor: u8,
        destination_floor: u8,
        priority: u32,
        now: u64,
    ) -> SimResult<Request> {
        if origin_floor == destination_floor {
            return Err(SimError::SameFloor(origin_floor));
        }

        Ok(Request {
            id,
            origin_floor,
            destination_floor,
            direction: RequestDirection::between(origin_floor, destination_floor),
            timestamp: now,
            priority: priority.max(1),
            assigned_elevator_id: None,
            status: RequestStatus::Pending,
            wait_time: 0,
            travel_time: 0,
        })
    }

    pub fn is_unassigned(&self) -> bool {
        self.status == RequestStatus::Pending && self.assigned_elevator_id.is_none()
    }

    /// Binds the request to an elevator. Only applies once, from `Pending`.
    pub fn assign(&mut self, elevator_id: ElevatorId) -> bool {
        if !self.is_unassigned() {
            return false;
        }
        self.assigned_elevator_id = Some(elevator_id);
        self.advance(RequestStatus::Assigned)
    }

    pub fn pick_up(&mut self) -> bool {
        self.advance(RequestStatus::PickedUp)
    }

    /// Marks the request completed and fixes its travel time.
    pub fn complete(&mut self, now: u64) -> bool {
        if !self.advance(RequestStatus::Completed) {
            return false;
        }
        self.travel_time = now
            .saturating_sub(self.timestamp)
            .saturating_sub(self.wait_time);
        true
    }

    fn advance(&mut self, to: RequestStatus) -> bool {
        if self.status.next() == Some(to) {
            self.status = to;
            true
        } else {
            false
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Floor {
    pub number: u8,
    pub up_request: bool,
    pub down_request: bool,
    pub waiting_passengers: u32,
}

impl Floor {
    pub fn new(number: u8) -> Floor {
        Floor {
            number,
            up_request: false,
            down_request: false,
            waiting_passengers: 0,
        }
    }
}

/**
 * Simulation parameters. Everything except the elevator and floor counts
 * applies live; changing either count rebuilds the system.
 */
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct SimulationConfig {
    pub number_of_elevators: u8,
    pub number_of_floors: u8,
    pub request_frequency: f64,
    pub simulation_speed: f64,
    pub is_running: bool,
    pub peak_traffic_mode: bool,
    pub morning_rush_hour: bool,
    pub elevator_capacity: u32,
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            number_of_elevators: 3,
            number_of_floors: 10,
            request_frequency: 0.5,
            simulation_speed: 1.0,
            is_running: false,
            peak_traffic_mode: false,
            morning_rush_hour: false,
            elevator_capacity: DEFAULT_ELEVATOR_CAPACITY,
            seed: None,
        }
    }
}

impl SimulationConfig {
    /// Wall-clock period between ticks, or `None` when the speed is too
    /// low for the period to fit in a `Duration`.
    pub fn tick_interval(&self) -> Option<Duration> {
        Duration::try_from_secs_f64(1.0 / self.simulation_speed).ok()
    }

    pub fn validate(&self) -> SimResult<()> {
        if self.number_of_elevators == 0 {
            return Err(SimError::InvalidConfig(
                "numberOfElevators must be at least 1".into(),
            ));
        }
        if self.number_of_floors < 2 {
            return Err(SimError::InvalidConfig(
                "numberOfFloors must be at least 2".into(),
            ));
        }
        if !(self.simulation_speed > 0.0) || !self.simulation_speed.is_finite() {
            return Err(SimError::InvalidConfig(
                "simulationSpeed must be a positive number".into(),
            ));
        }
        if self.tick_interval().is_none() {
            return Err(SimError::InvalidConfig(format!(
                "simulationSpeed {} is too low",
                self.simulation_speed
            )));
        }
        if !(self.request_frequency >= 0.0) || !self.request_frequency.is_finite() {
            return Err(SimError::InvalidConfig(
                "requestFrequency must not be negative".into(),
            ));
        }
        if self.elevator_capacity == 0 {
            return Err(SimError::InvalidConfig(
                "elevatorCapacity must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Partial configuration, merged field by field into the live config.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ConfigUpdate {
    pub number_of_elevators: Option<u8>,
    pub number_of_floors: Option<u8>,
    pub request_frequency: Option<f64>,
    pub simulation_speed: Option<f64>,
    pub peak_traffic_mode: Option<bool>,
    pub morning_rush_hour: Option<bool>,
    pub elevator_capacity: Option<u32>,
    /// `None` keeps the current seed. An update cannot switch a seeded
    /// config back to an entropy-seeded one; build a fresh `Simulation`.
    pub seed: Option<u64>,
}

impl ConfigUpdate {
    /// Returns the merged config without touching `base`.
    pub fn apply_to(&self, base: &SimulationConfig) -> SimulationConfig {
        SimulationConfig {
            number_of_elevators: self.number_of_elevators.unwrap_or(base.number_of_elevators),
            number_of_floors: self.number_of_floors.unwrap_or(base.number_of_floors),
            request_frequency: self.request_frequency.unwrap_or(base.request_frequency),
            simulation_speed: self.simulation_speed.unwrap_or(base.simulation_speed),
            is_running: base.is_running,
            peak_traffic_mode: self.peak_traffic_mode.unwrap_or(base.peak_traffic_mode),
            morning_rush_hour: self.morning_rush_hour.unwrap_or(base.morning_rush_hour),
            elevator_capacity: self.elevator_capacity.unwrap_or(base.elevator_capacity),
            seed: self.seed.or(base.seed),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    pub average_wait_time: f64,
    pub max_wait_time: u64,
    pub average_travel_time: f64,
    pub elevator_utilization: Vec<f64>,
    pub total_requests: u64,
    pub completed_requests: u64,
    pub pending_requests: u64,
    pub timestamp: u64,
}

impl Metrics {
    pub fn new(n_elevators: u8, now: u64) -> Metrics {
        Metrics {
            average_wait_time: 0.0,
            max_wait_time: 0,
            average_travel_time: 0.0,
            elevator_utilization: vec![0.0; n_elevators as usize],
            total_requests: 0,
            completed_requests: 0,
            pending_requests: 0,
            timestamp: now,
        }
    }
}

/// Deep snapshot handed to observers.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SystemState {
    pub elevators: Vec<Elevator>,
    pub floors: Vec<Floor>,
    pub requests: Vec<Request>,
    pub config: SimulationConfig,
    pub metrics: Metrics,
    pub is_running: bool,
    pub tick: u64,
}
