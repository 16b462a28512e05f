/***************************************/
/*        3rd party libraries          */
/***************************************/
use log::{debug, info, warn};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;

/***************************************/
/*           Local modules             */
/***************************************/
use crate::elevator::{move_elevator, update_door_state};
use crate::scheduler;
use crate::shared::structs::LOBBY_FLOOR;
use crate::shared::{
    Clock, ConfigUpdate, Elevator, ElevatorId, Floor, Metrics, Request, RequestDirection,
    RequestId, RequestStatus, SimError, SimResult, SimulationConfig, SystemClock, SystemState,
};

/**
 * The dispatch engine. Owns the fleet, the floors, every request and the
 * metrics, and advances them one discrete tick at a time.
 *
 * `Simulation` has no threads or timers of its own: `tick` is called by
 * whoever drives it (the coordinator while running, tests directly), and
 * every operation takes `&mut self`, so callers decide how access is
 * serialized.
 *
 * # Fields
 * - `config`:          Live configuration.
 * - `elevators`:       The fleet, indexed by `ElevatorId`.
 * - `floors`:          One entry per floor.
 * - `requests`:        Every request since the last reset, completed ones included.
 * - `metrics`:         Recomputed at the end of every tick.
 * - `is_running`:      Whether the tick timer should be firing.
 * - `tick`:            Ticks since the last reset.
 * - `next_request_id`: Sequence for request ids.
 * - `rng`:             Drives request generation and floor advances.
 * - `clock`:           Wall-clock source.
 */
pub struct Simulation {
    config: SimulationConfig,
    elevators: Vec<Elevator>,
    floors: Vec<Floor>,
    requests: Vec<Request>,
    metrics: Metrics,
    is_running: bool,
    tick: u64,
    next_request_id: u64,
    rng: SmallRng,
    clock: Box<dyn Clock>,
}

impl Simulation {
    pub fn new(config: SimulationConfig) -> SimResult<Simulation> {
        Simulation::with_clock(config, SystemClock)
    }

    pub fn with_clock<C: Clock + 'static>(
        config: SimulationConfig,
        clock: C,
    ) -> SimResult<Simulation> {
        config.validate()?;

        let now = clock.now();
        let mut simulation = Simulation {
            metrics: Metrics::new(config.number_of_elevators, now),
            rng: seeded_rng(config.seed),
            config,
            elevators: Vec::new(),
            floors: Vec::new(),
            requests: Vec::new(),
            is_running: false,
            tick: 0,
            next_request_id: 0,
            clock: Box::new(clock),
        };
        simulation.reset();
        Ok(simulation)
    }

    /***************************************/
    /*             Public API              */
    /***************************************/
    pub fn system_state(&self) -> SystemState {
        SystemState {
            elevators: self.elevators.clone(),
            floors: self.floors.clone(),
            requests: self.requests.clone(),
            config: self.config.clone(),
            metrics: self.metrics.clone(),
            is_running: self.is_running,
            tick: self.tick,
        }
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn elevators(&self) -> &[Elevator] {
        &self.elevators
    }

    pub fn floors(&self) -> &[Floor] {
        &self.floors
    }

    pub fn requests(&self) -> &[Request] {
        &self.requests
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.is_running
    }

    /// Wall-clock period between ticks at the configured speed.
    pub fn tick_interval(&self) -> Duration {
        // The config is validated, so the period always fits.
        self.config.tick_interval().unwrap_or(Duration::MAX)
    }

    /// Returns false if the simulation was already running.
    pub fn start(&mut self) -> bool {
        if self.is_running {
            return false;
        }
        self.is_running = true;
        self.config.is_running = true;
        info!("Simulation started");
        true
    }

    /// Returns false if the simulation was already stopped. State is left as is.
    pub fn stop(&mut self) -> bool {
        if !self.is_running {
            return false;
        }
        self.is_running = false;
        self.config.is_running = false;
        info!("Simulation stopped");
        true
    }

    /// Rebuilds the fleet and floors from the current config and drops every request.
    pub fn reset(&mut self) {
        let now = self.clock.now();

        self.elevators = (0..self.config.number_of_elevators)
            .map(|i| Elevator::new(ElevatorId(i as u32), self.config.elevator_capacity, now))
            .collect();
        self.floors = (0..self.config.number_of_floors).map(Floor::new).collect();
        self.requests.clear();
        self.metrics = Metrics::new(self.config.number_of_elevators, now);
        self.is_running = false;
        self.config.is_running = false;
        self.tick = 0;
        self.next_request_id = 0;
        if self.config.seed.is_some() {
            self.rng = seeded_rng(self.config.seed);
        }

        info!(
            "System reset: {} elevators, {} floors",
            self.config.number_of_elevators, self.config.number_of_floors
        );
    }

    /**
     * Merges `update` into the live config.
     *
     * Changing the elevator or floor count resets the system, so no request
     * or car can refer to a floor that no longer exists. Returns whether a
     * reset happened. An invalid merge is rejected and leaves the config
     * untouched.
     */
    pub fn update_config(&mut self, update: &ConfigUpdate) -> SimResult<bool> {
        let merged = update.apply_to(&self.config);
        if let Err(e) = merged.validate() {
            warn!("Rejected configuration update: {}", e);
            return Err(e);
        }

        let resize = merged.number_of_elevators != self.config.number_of_elevators
            || merged.number_of_floors != self.config.number_of_floors;
        self.config = merged;
        info!("Configuration updated: {:?}", update);

        if resize {
            self.reset();
        }
        Ok(resize)
    }

    /// Injects a request. Legal whether or not the simulation is running.
    pub fn add_request(&mut self, origin_floor: u8, destination_floor: u8) -> SimResult<Request> {
        let now = self.clock.now();
        match self.push_request(origin_floor, destination_floor, now) {
            Ok(request) => {
                info!(
                    "Added {}: floor {} -> floor {}",
                    request.id, origin_floor, destination_floor
                );
                Ok(request)
            }
            Err(e) => {
                warn!("Rejected request: {}", e);
                Err(e)
            }
        }
    }

    /**
     * Advances the simulation by one tick:
     * 1. maybe generate a random request,
     * 2. step every elevator (doors, motion, arrival, dispatch),
     * 3. pre-position idle elevators,
     * 4. recompute metrics.
     */
    pub fn tick(&mut self) {
        let now = self.clock.now();

        self.generate_random_request(now);

        for index in 0..self.elevators.len() {
            self.step_elevator(index, now);
        }

        scheduler::pre_position_idle_elevators(&mut self.elevators, &self.config);

        self.update_metrics(now);
        self.tick += 1;
    }

    /***************************************/
    /*         Request generation          */
    /***************************************/
    fn generate_random_request(&mut self, now: u64) {
        let frequency = self.config.request_frequency.clamp(0.0, 1.0);
        if !self.rng.gen_bool(frequency) {
            return;
        }

        let n_floors = self.config.number_of_floors;
        let origin = self.rng.gen_range(0..n_floors);
        let mut destination = self.rng.gen_range(0..n_floors);
        while destination == origin {
            destination = self.rng.gen_range(0..n_floors);
        }

        match self.push_request(origin, destination, now) {
            Ok(request) => debug!(
                "Generated {}: floor {} -> floor {}",
                request.id, origin, destination
            ),
            Err(e) => warn!("Failed to generate request: {}", e),
        }
    }

    fn push_request(&mut self, origin: u8, destination: u8, now: u64) -> SimResult<Request> {
        let n_floors = self.config.number_of_floors;
        for floor in [origin, destination] {
            if floor >= n_floors {
                return Err(SimError::FloorOutOfRange { floor, n_floors });
            }
        }

        let priority = self.request_priority(origin, destination);
        let request = Request::new(
            RequestId(self.next_request_id),
            origin,
            destination,
            priority,
            now,
        )?;
        self.next_request_id += 1;

        let floor = &mut self.floors[origin as usize];
        match request.direction {
            RequestDirection::Up => floor.up_request = true,
            RequestDirection::Down => floor.down_request = true,
        }
        floor.waiting_passengers += 1;

        self.metrics.total_requests += 1;
        self.requests.push(request.clone());
        Ok(request)
    }

    fn request_priority(&self, origin: u8, destination: u8) -> u32 {
        let mut priority = 1;

        if self.config.morning_rush_hour && origin == LOBBY_FLOOR && destination > LOBBY_FLOOR {
            priority += 2;
        }

        if self.config.peak_traffic_mode {
            priority += 1;
        }

        priority
    }

    /***************************************/
    /*          Elevator stepping          */
    /***************************************/
    fn step_elevator(&mut self, index: usize, now: u64) {
        let elevator = &mut self.elevators[index];
        elevator.last_update_time = now;

        update_door_state(elevator, now);

        if let Some(floor) = move_elevator(elevator, &mut self.rng) {
            self.handle_arrival(index, floor, now);
        }

        self.dispatch(index, now);
    }

    fn handle_arrival(&mut self, index: usize, floor: u8, now: u64) {
        let elevator = &mut self.elevators[index];
        let elevator_id = elevator.id;
        debug!("{} arrived at floor {}", elevator_id, floor);

        // Any arrival clears the whole floor, whichever direction it serves.
        let floor_state = &mut self.floors[floor as usize];
        floor_state.up_request = false;
        floor_state.down_request = false;
        floor_state.waiting_passengers = 0;

        let bound = self
            .requests
            .iter_mut()
            .filter(|r| r.assigned_elevator_id == Some(elevator_id));

        for request in bound {
            if request.origin_floor == floor && request.pick_up() {
                elevator.passenger_count += 1;
                debug!("{} picked up {}", elevator_id, request.id);
            }

            if request.destination_floor == floor && request.complete(now) {
                elevator.passenger_count = elevator.passenger_count.saturating_sub(1);
                elevator.requests.retain(|id| *id != request.id);
                self.metrics.completed_requests += 1;
                info!(
                    "{} completed {} (wait {}ms, travel {}ms)",
                    elevator_id, request.id, request.wait_time, request.travel_time
                );
            }
        }
    }

    /**
     * Gives an idle elevator something to do.
     *
     * Passengers already on board come first: the car heads for the next
     * dropoff in SCAN order. Otherwise the car takes the pending request the
     * scheduler would give it with the lowest `distance + (10 - priority)`.
     */
    fn dispatch(&mut self, index: usize, now: u64) {
        let elevator = &self.elevators[index];
        if !elevator.is_idle() {
            return;
        }
        let elevator_id = elevator.id;

        let dropoffs: Vec<u8> = self
            .requests
            .iter()
            .filter(|r| {
                r.assigned_elevator_id == Some(elevator_id) && r.status == RequestStatus::PickedUp
            })
            .map(|r| r.destination_floor)
            .collect();

        let route = scheduler::scan(elevator.current_floor, &dropoffs, elevator.direction);
        if let Some(&next) = route.first() {
            debug!("{} heading to dropoff at floor {}", elevator_id, next);
            self.elevators[index].target_floor = Some(next);
            return;
        }

        let mut best: Option<(usize, i64)> = None;
        for (position, request) in self.requests.iter().enumerate() {
            if !request.is_unassigned() {
                continue;
            }

            let chosen = scheduler::assign_elevator(
                request,
                std::slice::from_ref(elevator),
                &self.requests,
                &self.config,
                now,
            );
            if chosen != Some(elevator_id) {
                continue;
            }

            let distance = elevator.current_floor.abs_diff(request.origin_floor) as i64;
            let score = distance + (10 - request.priority as i64);
            if best.map_or(true, |(_, best_score)| score < best_score) {
                best = Some((position, score));
            }
        }

        let Some((position, _)) = best else {
            return;
        };

        let request = &mut self.requests[position];
        if request.assign(elevator_id) {
            let elevator = &mut self.elevators[index];
            elevator.requests.push(request.id);
            elevator.target_floor = Some(request.origin_floor);
            info!(
                "Assigned {} to {} (pickup at floor {})",
                request.id, elevator_id, request.origin_floor
            );
        }
    }

    /***************************************/
    /*              Metrics                */
    /***************************************/
    fn update_metrics(&mut self, now: u64) {
        let mut waiting = 0u64;
        let mut wait_sum = 0u64;
        let mut max_wait = 0u64;
        let mut completed = 0u64;
        let mut travel_sum = 0u64;

        for request in self.requests.iter_mut() {
            if request.status.is_waiting() {
                request.wait_time = now.saturating_sub(request.timestamp);
                waiting += 1;
                wait_sum += request.wait_time;
                max_wait = max_wait.max(request.wait_time);
            } else if request.status == RequestStatus::Completed {
                completed += 1;
                travel_sum += request.travel_time;
            }
        }

        self.metrics.average_wait_time = average(wait_sum, waiting);
        self.metrics.max_wait_time = max_wait;
        self.metrics.average_travel_time = average(travel_sum, completed);
        self.metrics.pending_requests = waiting;
        self.metrics.timestamp = now;
        self.metrics.elevator_utilization = self
            .elevators
            .iter()
            .map(|e| if e.is_moving { 1.0 } else { 0.0 })
            .collect();
    }
}

fn average(sum: u64, count: u64) -> f64 {
    if count == 0 {
        0.0
    } else {
        sum as f64 / count as f64
    }
}

fn seeded_rng(seed: Option<u64>) -> SmallRng {
    match seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_entropy(),
    }
}
