/***************************************/
/*        3rd party libraries          */
/***************************************/
use log::info;
use rand::Rng;
use serde::Serialize;
use std::thread::sleep;
use std::time::{Duration, Instant};

/***************************************/
/*           Local modules             */
/***************************************/
use crate::coordinator::SimulationHandle;
use crate::shared::{ConfigUpdate, SimError, SimResult, SystemState};

const SCENARIO_FLOORS: u8 = 10;

/***************************************/
/*       Public data structures        */
/***************************************/
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledRequest {
    pub origin_floor: u8,
    pub destination_floor: u8,
    /// Milliseconds after the scenario starts.
    pub delay_ms: u64,
}

/**
 * A named, replayable load pattern: a config to apply, a list of requests
 * to inject at fixed offsets, and how long to run before stopping.
 */
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    pub name: String,
    pub description: String,
    pub config: ConfigUpdate,
    pub requests: Vec<ScheduledRequest>,
    pub duration_ms: u64,
}

impl Scenario {
    /// Lookup key: lower case with spaces replaced by dashes.
    pub fn slug(&self) -> String {
        self.name
            .to_lowercase()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("-")
    }
}

/***************************************/
/*             Presets                 */
/***************************************/
pub fn normal_traffic<R: Rng + ?Sized>(rng: &mut R) -> Scenario {
    Scenario {
        name: "Normal Traffic".into(),
        description: "Simulates typical office building traffic with random requests".into(),
        config: traffic_config(3, 0.5, 1.0, false, false),
        requests: random_requests(rng, 20, 60_000),
        duration_ms: 60_000,
    }
}

pub fn morning_rush_hour<R: Rng + ?Sized>(rng: &mut R) -> Scenario {
    // 70% of the traffic leaves the lobby for an upper floor.
    let requests = (0..30)
        .filter_map(|_| {
            let (origin, destination) = if rng.gen_bool(0.7) {
                (0, rng.gen_range(1..SCENARIO_FLOORS))
            } else {
                (
                    rng.gen_range(0..SCENARIO_FLOORS),
                    rng.gen_range(0..SCENARIO_FLOORS),
                )
            };
            scheduled(origin, destination, rng.gen_range(0..30_000))
        })
        .collect();

    Scenario {
        name: "Morning Rush Hour".into(),
        description: "Simulates heavy traffic from lobby to upper floors during morning rush"
            .into(),
        config: traffic_config(4, 1.5, 1.0, true, true),
        requests,
        duration_ms: 60_000,
    }
}

pub fn peak_traffic_stress_test<R: Rng + ?Sized>(rng: &mut R) -> Scenario {
    Scenario {
        name: "Peak Traffic Stress Test".into(),
        description: "Stress test with 100+ simultaneous requests".into(),
        config: traffic_config(5, 2.0, 2.0, true, false),
        requests: random_requests(rng, 100, 10_000),
        duration_ms: 120_000,
    }
}

pub fn evening_rush_hour<R: Rng + ?Sized>(rng: &mut R) -> Scenario {
    // 80% of the traffic heads down to the lobby.
    let requests = (0..25)
        .filter_map(|_| {
            let (origin, destination) = if rng.gen_bool(0.8) {
                (rng.gen_range(1..SCENARIO_FLOORS), 0)
            } else {
                (
                    rng.gen_range(0..SCENARIO_FLOORS),
                    rng.gen_range(0..SCENARIO_FLOORS),
                )
            };
            scheduled(origin, destination, rng.gen_range(0..45_000))
        })
        .collect();

    Scenario {
        name: "Evening Rush Hour".into(),
        description: "Simulates traffic from upper floors to lobby during evening rush".into(),
        config: traffic_config(4, 1.2, 1.0, true, false),
        requests,
        duration_ms: 90_000,
    }
}

pub fn lunch_hour<R: Rng + ?Sized>(rng: &mut R) -> Scenario {
    Scenario {
        name: "Lunch Hour Traffic".into(),
        description: "Simulates bidirectional traffic between floors during lunch hour".into(),
        config: traffic_config(3, 0.8, 1.0, false, false),
        requests: random_requests(rng, 40, 60_000),
        duration_ms: 90_000,
    }
}

pub fn all_scenarios<R: Rng + ?Sized>(rng: &mut R) -> Vec<Scenario> {
    vec![
        normal_traffic(rng),
        morning_rush_hour(rng),
        peak_traffic_stress_test(rng),
        evening_rush_hour(rng),
        lunch_hour(rng),
    ]
}

pub fn find_scenario<R: Rng + ?Sized>(slug: &str, rng: &mut R) -> SimResult<Scenario> {
    all_scenarios(rng)
        .into_iter()
        .find(|s| s.slug() == slug)
        .ok_or_else(|| SimError::UnknownScenario(slug.to_string()))
}

/***************************************/
/*              Runner                 */
/***************************************/

/**
 * Plays `scenario` against a running coordinator and blocks until it ends.
 *
 * Resets the system, applies the scenario config, starts the simulation,
 * injects each request at its offset and stops once `duration_ms` has
 * passed. Returns the state right after stopping.
 */
pub fn run_scenario(handle: &SimulationHandle, scenario: &Scenario) -> SimResult<SystemState> {
    info!("Starting scenario: {}", scenario.name);
    info!("Description: {}", scenario.description);

    handle.reset()?;
    handle.update_config(scenario.config.clone())?;
    handle.start()?;

    let started = Instant::now();
    let mut schedule: Vec<&ScheduledRequest> = scenario.requests.iter().collect();
    schedule.sort_by_key(|r| r.delay_ms);

    for (index, request) in schedule.into_iter().enumerate() {
        sleep_until(started + Duration::from_millis(request.delay_ms));
        let added = handle.add_request(request.origin_floor, request.destination_floor)?;
        info!(
            "Added request {}: Floor {} -> Floor {} ({})",
            index + 1,
            request.origin_floor,
            request.destination_floor,
            added.id
        );
    }

    sleep_until(started + Duration::from_millis(scenario.duration_ms));
    handle.stop()?;
    info!("Scenario {} completed", scenario.name);

    handle.system_state()
}

/***************************************/
/*              Helpers                */
/***************************************/
fn traffic_config(
    number_of_elevators: u8,
    request_frequency: f64,
    simulation_speed: f64,
    peak_traffic_mode: bool,
    morning_rush_hour: bool,
) -> ConfigUpdate {
    ConfigUpdate {
        number_of_elevators: Some(number_of_elevators),
        number_of_floors: Some(SCENARIO_FLOORS),
        request_frequency: Some(request_frequency),
        simulation_speed: Some(simulation_speed),
        peak_traffic_mode: Some(peak_traffic_mode),
        morning_rush_hour: Some(morning_rush_hour),
        ..ConfigUpdate::default()
    }
}

fn random_requests<R: Rng + ?Sized>(
    rng: &mut R,
    count: usize,
    window_ms: u64,
) -> Vec<ScheduledRequest> {
    (0..count)
        .map(|_| {
            let origin_floor = rng.gen_range(0..SCENARIO_FLOORS);
            let mut destination_floor = rng.gen_range(0..SCENARIO_FLOORS);
            while destination_floor == origin_floor {
                destination_floor = rng.gen_range(0..SCENARIO_FLOORS);
            }
            ScheduledRequest {
                origin_floor,
                destination_floor,
                delay_ms: rng.gen_range(0..window_ms),
            }
        })
        .collect()
}

// Rush-hour generators may draw the same floor twice; those draws are dropped.
fn scheduled(origin_floor: u8, destination_floor: u8, delay_ms: u64) -> Option<ScheduledRequest> {
    (origin_floor != destination_floor).then_some(ScheduledRequest {
        origin_floor,
        destination_floor,
        delay_ms,
    })
}

fn sleep_until(deadline: Instant) {
    let now = Instant::now();
    if deadline > now {
        sleep(deadline - now);
    }
}
