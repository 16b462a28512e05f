/***************************************/
/*        3rd party libraries          */
/***************************************/
use log::debug;
use std::collections::BTreeSet;

/***************************************/
/*           Local modules             */
/***************************************/
use crate::shared::structs::LOBBY_FLOOR;
use crate::shared::{
    Direction, DoorState, Elevator, ElevatorId, Request, RequestStatus, SimulationConfig,
};

/***************************************/
/*             Constants               */
/***************************************/
pub const DISTANCE_WEIGHT: f64 = 0.40;
pub const DIRECTION_WEIGHT: f64 = 0.25;
pub const PRIORITY_WEIGHT: f64 = 0.20;
pub const LOAD_WEIGHT: f64 = 0.10;
pub const TRAFFIC_WEIGHT: f64 = 0.05;

const DIRECTION_MISMATCH_PENALTY: f64 = 10.0;
const STARVATION_THRESHOLD_MS: u64 = 30_000;
const FLOOR_TRAVEL_TIME_MS: u64 = 2_000;
const DOOR_TIME_MS: u64 = 3_000;
const REVERSAL_PENALTY_MS: u64 = 5_000;

/***************************************/
/*       Public data structures        */
/***************************************/

/**
 * Result of scoring one elevator against one request. Lower `score` is better.
 *
 * The estimates and `reasoning` are diagnostics only and never influence
 * which elevator is picked.
 */
#[derive(Debug, Clone, PartialEq)]
pub struct SchedulingScore {
    pub elevator_id: ElevatorId,
    pub score: f64,
    pub estimated_wait_time: u64,
    pub estimated_travel_time: u64,
    pub reasoning: String,
}

/***************************************/
/*             Public API              */
/***************************************/

/**
 * Picks the best elevator for `request` among `elevators`.
 *
 * Only elevators with closed doors and spare capacity are considered. The
 * first elevator with the lowest composite score wins, so ties resolve to
 * input order. Returns `None` if no elevator qualifies.
 */
pub fn assign_elevator(
    request: &Request,
    elevators: &[Elevator],
    all_requests: &[Request],
    config: &SimulationConfig,
    now: u64,
) -> Option<ElevatorId> {
    let mut best: Option<SchedulingScore> = None;

    for elevator in elevators.iter().filter(|e| is_available(e)) {
        let candidate = score_elevator(request, elevator, all_requests, config, now);
        let better = match &best {
            Some(current) => candidate.score < current.score,
            None => true,
        };
        if better {
            best = Some(candidate);
        }
    }

    best.map(|best| {
        debug!(
            "Best elevator for {} is {} (score {:.2}, est. wait {}ms, est. travel {}ms): {}",
            request.id,
            best.elevator_id,
            best.score,
            best.estimated_wait_time,
            best.estimated_travel_time,
            best.reasoning
        );
        best.elevator_id
    })
}

pub fn score_elevator(
    request: &Request,
    elevator: &Elevator,
    all_requests: &[Request],
    config: &SimulationConfig,
    now: u64,
) -> SchedulingScore {
    let distance = distance_score(request, elevator);
    let direction = direction_score(request, elevator);
    let priority = priority_score(request, config, now);
    let load = load_score(elevator);
    let traffic = traffic_score(request, elevator, all_requests, config);

    let score = distance * DISTANCE_WEIGHT
        + direction * DIRECTION_WEIGHT
        + priority * PRIORITY_WEIGHT
        + load * LOAD_WEIGHT
        + traffic * TRAFFIC_WEIGHT;

    SchedulingScore {
        elevator_id: elevator.id,
        score,
        estimated_wait_time: estimate_wait_time(request, elevator),
        estimated_travel_time: estimate_travel_time(request),
        reasoning: format!(
            "Distance: {:.2}, Direction: {:.2}, Priority: {:.2}, Load: {:.2}, Traffic: {:.2}",
            distance, direction, priority, load, traffic
        ),
    }
}

/// Stops the elevator should visit for its bound requests, in SCAN order.
pub fn optimize_route(elevator: &Elevator, all_requests: &[Request]) -> Vec<u8> {
    let floors: BTreeSet<u8> = bound_requests(elevator, all_requests)
        .filter(|r| r.status != RequestStatus::Completed)
        .flat_map(|r| [r.origin_floor, r.destination_floor])
        .collect();

    if floors.is_empty() {
        return Vec::new();
    }

    let floors: Vec<u8> = floors.into_iter().collect();
    scan(elevator.current_floor, &floors, elevator.direction)
}

/**
 * Orders `floors` the way a disk arm sweeps: everything in the current
 * direction first, then the rest on the way back. Idle sweeps upward first.
 * Duplicates in `floors` are kept.
 */
pub fn scan(current_floor: u8, floors: &[u8], direction: Direction) -> Vec<u8> {
    let mut sorted = floors.to_vec();
    sorted.sort_unstable();

    match direction {
        Direction::Up | Direction::Idle => {
            let above = sorted.iter().copied().filter(|&f| f >= current_floor);
            let below = sorted.iter().rev().copied().filter(|&f| f < current_floor);
            above.chain(below).collect()
        }
        Direction::Down => {
            let below = sorted.iter().rev().copied().filter(|&f| f <= current_floor);
            let above = sorted.iter().copied().filter(|&f| f > current_floor);
            below.chain(above).collect()
        }
    }
}

/**
 * Sends idle elevators to where the next wave of traffic is expected.
 *
 * Morning rush pulls cars above floor 2 back to the lobby. Peak traffic
 * spreads the idle cars evenly over the building. Morning rush wins when
 * both modes are on.
 */
pub fn pre_position_idle_elevators(elevators: &mut [Elevator], config: &SimulationConfig) {
    if !config.morning_rush_hour && !config.peak_traffic_mode {
        return;
    }

    let idle: Vec<usize> = elevators
        .iter()
        .enumerate()
        .filter(|(_, e)| e.direction == Direction::Idle && e.is_idle())
        .map(|(index, _)| index)
        .collect();
    let n_idle = idle.len();

    for (rank, index) in idle.into_iter().enumerate() {
        let elevator = &mut elevators[index];

        if config.morning_rush_hour {
            if elevator.current_floor > 2 {
                debug!("Pre-positioning {} to the lobby", elevator.id);
                elevator.target_floor = Some(LOBBY_FLOOR);
            }
        } else {
            let span = config.number_of_floors.saturating_sub(1) as usize;
            let target = (rank * span / n_idle) as u8;
            if elevator.current_floor.abs_diff(target) > 1 {
                debug!("Pre-positioning {} to floor {}", elevator.id, target);
                elevator.target_floor = Some(target);
            }
        }
    }
}

/***************************************/
/*          Scoring factors            */
/***************************************/
fn is_available(elevator: &Elevator) -> bool {
    elevator.door_state == DoorState::Closed && !elevator.is_full()
}

fn bound_requests<'a>(
    elevator: &'a Elevator,
    all_requests: &'a [Request],
) -> impl Iterator<Item = &'a Request> + 'a {
    all_requests
        .iter()
        .filter(move |r| elevator.requests.contains(&r.id))
}

fn distance_score(request: &Request, elevator: &Elevator) -> f64 {
    let distance = elevator.current_floor.abs_diff(request.origin_floor) as f64;

    if elevator.direction == Direction::Idle {
        distance
    } else if is_moving_towards(elevator, request.origin_floor) {
        distance * 0.5
    } else {
        distance * 1.5
    }
}

fn direction_score(request: &Request, elevator: &Elevator) -> f64 {
    if elevator.direction == Direction::Idle || request.direction.matches(elevator.direction) {
        0.0
    } else {
        DIRECTION_MISMATCH_PENALTY
    }
}

fn priority_score(request: &Request, config: &SimulationConfig, now: u64) -> f64 {
    let mut score = (10.0 - request.priority as f64) * 2.0;

    if now.saturating_sub(request.timestamp) > STARVATION_THRESHOLD_MS {
        score -= 5.0;
    }

    if config.morning_rush_hour
        && request.origin_floor == LOBBY_FLOOR
        && request.destination_floor > LOBBY_FLOOR
    {
        score -= 3.0;
    }

    if config.peak_traffic_mode {
        score -= 2.0;
    }

    score.max(0.0)
}

fn load_score(elevator: &Elevator) -> f64 {
    elevator.passenger_count as f64 / elevator.max_capacity as f64 * 5.0
}

fn traffic_score(
    request: &Request,
    elevator: &Elevator,
    all_requests: &[Request],
    config: &SimulationConfig,
) -> f64 {
    let mut score = 0.0;

    if config.morning_rush_hour {
        score += elevator.current_floor.abs_diff(LOBBY_FLOOR) as f64 * 0.5;
    }

    let shares_route = bound_requests(elevator, all_requests).any(|r| {
        r.origin_floor == request.origin_floor || r.destination_floor == request.destination_floor
    });
    if shares_route {
        score -= 2.0;
    }

    score
}

fn is_moving_towards(elevator: &Elevator, floor: u8) -> bool {
    match elevator.direction {
        Direction::Up => elevator.current_floor < floor,
        Direction::Down => elevator.current_floor > floor,
        Direction::Idle => false,
    }
}

fn estimate_wait_time(request: &Request, elevator: &Elevator) -> u64 {
    let distance = elevator.current_floor.abs_diff(request.origin_floor) as u64;
    let mut estimate = distance * FLOOR_TRAVEL_TIME_MS + DOOR_TIME_MS;

    if elevator.direction != Direction::Idle && !is_moving_towards(elevator, request.origin_floor) {
        estimate += REVERSAL_PENALTY_MS;
    }

    estimate
}

fn estimate_travel_time(request: &Request) -> u64 {
    let distance = request.origin_floor.abs_diff(request.destination_floor) as u64;
    distance * FLOOR_TRAVEL_TIME_MS + DOOR_TIME_MS
}
