/*
 * Unit tests for the simulation engine
 *
 * The unit tests follows the Arrange, Act, Assert pattern. Time is driven by
 * a manual clock and randomness by a fixed seed, so every test is repeatable.
 *
 * Tests:
 *  - test_reset_builds_fleet_and_floors
 *  - test_add_request_updates_floor_and_totals
 *  - test_add_request_rejects_invalid_floors
 *  - test_request_priority_rules
 *  - test_end_to_end_single_elevator
 *  - test_snapshot_is_idempotent
 *  - test_floor_count_change_resets
 *  - test_live_config_update_keeps_state
 *  - test_invalid_config_update_is_rejected
 *  - test_unrepresentable_speed_is_rejected
 *  - test_start_stop_are_idempotent
 *  - test_random_requests_are_valid
 *  - test_wait_time_metrics
 *  - test_arrival_clears_whole_floor
 *  - test_peak_traffic_spreads_idle_elevators
 */

/***************************************/
/*             Unit tests              */
/***************************************/
#[cfg(test)]
mod simulation_tests {
    use crate::shared::DoorState::{Closed, Open};
    use crate::shared::RequestStatus::{Assigned, Completed, Pending, PickedUp};
    use crate::shared::{
        ConfigUpdate, ElevatorId, ManualClock, RequestId, RequestStatus, SimError,
        SimulationConfig,
    };
    use crate::Simulation;
    use std::collections::HashMap;

    const START: u64 = 1_000_000;

    fn quiet_config(n_elevators: u8, n_floors: u8) -> SimulationConfig {
        SimulationConfig {
            number_of_elevators: n_elevators,
            number_of_floors: n_floors,
            request_frequency: 0.0,
            seed: Some(42),
            ..SimulationConfig::default()
        }
    }

    fn setup_simulation(config: SimulationConfig) -> (Simulation, ManualClock) {
        let clock = ManualClock::new(START);
        let simulation = Simulation::with_clock(config, clock.clone()).unwrap();
        (simulation, clock)
    }

    #[test]
    fn test_reset_builds_fleet_and_floors() {
        // Arrange
        let (simulation, _clock) = setup_simulation(quiet_config(3, 10));

        // Assert
        let state = simulation.system_state();
        assert_eq!(state.elevators.len(), 3);
        assert_eq!(state.floors.len(), 10);
        assert!(state.requests.is_empty());
        assert!(!state.is_running);
        for (i, elevator) in state.elevators.iter().enumerate() {
            assert_eq!(elevator.id, ElevatorId(i as u32));
            assert_eq!(elevator.current_floor, 0);
            assert_eq!(elevator.target_floor, None);
            assert_eq!(elevator.door_state, Closed);
            assert_eq!(elevator.max_capacity, 8);
        }
        assert_eq!(state.metrics.elevator_utilization, vec![0.0; 3]);
    }

    #[test]
    fn test_add_request_updates_floor_and_totals() {
        // Arrange
        let (mut simulation, _clock) = setup_simulation(quiet_config(2, 10));

        // Act
        let up = simulation.add_request(3, 7).unwrap();
        let down = simulation.add_request(3, 1).unwrap();

        // Assert
        assert_eq!(up.id, RequestId(0));
        assert_eq!(down.id, RequestId(1));
        assert_eq!(up.status, Pending);
        assert_eq!(up.timestamp, START);
        let floor = &simulation.floors()[3];
        assert!(floor.up_request);
        assert!(floor.down_request);
        assert_eq!(floor.waiting_passengers, 2);
        assert_eq!(simulation.metrics().total_requests, 2);
        assert_eq!(simulation.requests().len(), 2);
    }

    #[test]
    fn test_add_request_rejects_invalid_floors() {
        // Arrange
        let (mut simulation, _clock) = setup_simulation(quiet_config(2, 5));

        // Act
        let same = simulation.add_request(2, 2);
        let out_of_range = simulation.add_request(1, 5);

        // Assert
        assert!(matches!(same, Err(SimError::SameFloor(2))));
        assert!(matches!(
            out_of_range,
            Err(SimError::FloorOutOfRange { floor: 5, n_floors: 5 })
        ));
        assert!(simulation.requests().is_empty());
        assert_eq!(simulation.metrics().total_requests, 0);
    }

    #[test]
    fn test_request_priority_rules() {
        // Arrange
        let mut config = quiet_config(2, 10);
        config.morning_rush_hour = true;
        config.peak_traffic_mode = true;
        let (mut simulation, _clock) = setup_simulation(config);

        // Act
        let lobby_up = simulation.add_request(0, 6).unwrap();
        let other = simulation.add_request(6, 0).unwrap();

        // Assert
        assert_eq!(lobby_up.priority, 4);
        assert_eq!(other.priority, 2);
    }

    #[test]
    fn test_end_to_end_single_elevator() {
        // Arrange
        let (mut simulation, clock) = setup_simulation(quiet_config(1, 2));
        let request_id = simulation.add_request(0, 1).unwrap().id;

        let mut last_status: HashMap<RequestId, RequestStatus> = HashMap::new();
        let mut assigned_to: HashMap<RequestId, ElevatorId> = HashMap::new();
        let mut saw_open_at_lobby = false;

        // Act
        for _ in 0..5_000 {
            clock.advance(1_000);
            simulation.tick();

            // Invariants hold after every tick
            for elevator in simulation.elevators() {
                assert!(elevator.current_floor < 2);
                assert!(elevator.target_floor.map_or(true, |t| t < 2));
                if elevator.door_state == Open {
                    assert_eq!(elevator.target_floor, None);
                    if elevator.current_floor == 0 {
                        saw_open_at_lobby = true;
                    }
                }
            }
            for request in simulation.requests() {
                let previous = last_status.insert(request.id, request.status);
                if let Some(previous) = previous {
                    assert!(
                        previous == request.status || previous.next() == Some(request.status),
                        "{:?} -> {:?}",
                        previous,
                        request.status
                    );
                }
                if let Some(elevator_id) = request.assigned_elevator_id {
                    let first = *assigned_to.entry(request.id).or_insert(elevator_id);
                    assert_eq!(first, elevator_id);
                }
            }

            if simulation.metrics().completed_requests == 1 {
                break;
            }
        }

        // Assert
        let state = simulation.system_state();
        let request = &state.requests[0];
        assert_eq!(request.id, request_id);
        assert_eq!(request.status, Completed);
        assert_eq!(request.assigned_elevator_id, Some(ElevatorId(0)));
        assert!(saw_open_at_lobby);
        assert_eq!(state.metrics.completed_requests, 1);
        assert_eq!(state.metrics.pending_requests, 0);
        assert_eq!(state.elevators[0].current_floor, 1);
        assert_eq!(state.elevators[0].passenger_count, 0);
        assert!(state.elevators[0].requests.is_empty());
        assert_eq!(
            request.travel_time,
            state.metrics.timestamp - request.timestamp - request.wait_time
        );
    }

    #[test]
    fn test_snapshot_is_idempotent() {
        // Arrange
        let (mut simulation, clock) = setup_simulation(quiet_config(3, 10));
        simulation.add_request(4, 2).unwrap();
        clock.advance(1_000);
        simulation.tick();

        // Act
        let first = simulation.system_state();
        clock.advance(5_000);
        let second = simulation.system_state();

        // Assert
        assert_eq!(first, second);
        assert_eq!(first.metrics.timestamp, second.metrics.timestamp);
    }

    #[test]
    fn test_floor_count_change_resets() {
        // Arrange
        let (mut simulation, _clock) = setup_simulation(quiet_config(3, 10));
        simulation.start();
        simulation.add_request(8, 9).unwrap();
        simulation.add_request(1, 6).unwrap();

        // Act
        let update = ConfigUpdate {
            number_of_floors: Some(5),
            ..ConfigUpdate::default()
        };
        let reset = simulation.update_config(&update).unwrap();

        // Assert
        assert!(reset);
        let state = simulation.system_state();
        assert!(state.requests.is_empty());
        assert_eq!(state.floors.len(), 5);
        assert!(state.floors.iter().all(|f| f.waiting_passengers == 0));
        assert_eq!(state.config.number_of_floors, 5);
        assert!(!state.is_running);
        assert_eq!(state.metrics.total_requests, 0);
    }

    #[test]
    fn test_live_config_update_keeps_state() {
        // Arrange
        let (mut simulation, _clock) = setup_simulation(quiet_config(3, 10));
        simulation.start();
        simulation.add_request(8, 9).unwrap();

        // Act
        let update = ConfigUpdate {
            simulation_speed: Some(4.0),
            peak_traffic_mode: Some(true),
            number_of_floors: Some(10),
            ..ConfigUpdate::default()
        };
        let reset = simulation.update_config(&update).unwrap();

        // Assert
        assert!(!reset);
        assert!(simulation.is_running());
        assert_eq!(simulation.requests().len(), 1);
        assert!(simulation.config().peak_traffic_mode);
        assert_eq!(simulation.tick_interval(), std::time::Duration::from_millis(250));
    }

    #[test]
    fn test_invalid_config_update_is_rejected() {
        // Arrange
        let (mut simulation, _clock) = setup_simulation(quiet_config(3, 10));
        let before = simulation.config().clone();

        // Act
        let result = simulation.update_config(&ConfigUpdate {
            number_of_floors: Some(1),
            ..ConfigUpdate::default()
        });

        // Assert
        assert!(matches!(result, Err(SimError::InvalidConfig(_))));
        assert_eq!(simulation.config(), &before);
        assert_eq!(simulation.floors().len(), 10);
    }

    #[test]
    fn test_unrepresentable_speed_is_rejected() {
        // Arrange
        let (mut simulation, _clock) = setup_simulation(quiet_config(2, 6));
        simulation.start();
        let before = simulation.config().clone();

        // Act
        let result = simulation.update_config(&ConfigUpdate {
            simulation_speed: Some(1e-30),
            ..ConfigUpdate::default()
        });

        // Assert
        assert!(matches!(result, Err(SimError::InvalidConfig(_))));
        assert_eq!(simulation.config(), &before);
        assert_eq!(simulation.tick_interval(), std::time::Duration::from_secs(1));
        assert!(simulation.is_running());
    }

    #[test]
    fn test_start_stop_are_idempotent() {
        // Arrange
        let (mut simulation, _clock) = setup_simulation(quiet_config(1, 4));

        // Act & Assert
        assert!(simulation.start());
        assert!(!simulation.start());
        assert!(simulation.is_running());
        assert!(simulation.config().is_running);
        assert!(simulation.stop());
        assert!(!simulation.stop());
        assert!(!simulation.is_running());
    }

    #[test]
    fn test_random_requests_are_valid() {
        // Arrange
        let mut config = quiet_config(3, 6);
        config.request_frequency = 1.0;
        let (mut simulation, clock) = setup_simulation(config);

        // Act
        for _ in 0..50 {
            clock.advance(100);
            simulation.tick();
        }

        // Assert
        assert_eq!(simulation.metrics().total_requests, 50);
        assert_eq!(simulation.requests().len(), 50);
        for request in simulation.requests() {
            assert_ne!(request.origin_floor, request.destination_floor);
            assert!(request.origin_floor < 6);
            assert!(request.destination_floor < 6);
        }
    }

    #[test]
    fn test_wait_time_metrics() {
        // Arrange
        let (mut simulation, clock) = setup_simulation(quiet_config(1, 10));
        simulation.add_request(5, 9).unwrap();
        simulation.add_request(7, 2).unwrap();

        // Act
        clock.advance(5_000);
        simulation.tick();

        // Assert
        let metrics = simulation.metrics();
        assert_eq!(metrics.pending_requests, 2);
        assert_eq!(metrics.max_wait_time, 5_000);
        assert!((metrics.average_wait_time - 5_000.0).abs() < 1e-9);
        assert_eq!(metrics.timestamp, START + 5_000);
        let statuses: Vec<_> = simulation.requests().iter().map(|r| r.status).collect();
        assert_eq!(statuses, vec![Assigned, Pending]);
    }

    #[test]
    fn test_arrival_clears_whole_floor() {
        // Arrange
        let (mut simulation, clock) = setup_simulation(quiet_config(1, 10));
        simulation.add_request(0, 3).unwrap();
        simulation.add_request(0, 5).unwrap();

        // Act
        clock.advance(1_000);
        simulation.tick(); // binds the first request
        clock.advance(1_000);
        simulation.tick(); // arrives at the lobby

        // Assert
        let floor = &simulation.floors()[0];
        assert!(!floor.up_request);
        assert_eq!(floor.waiting_passengers, 0);
        let statuses: Vec<_> = simulation.requests().iter().map(|r| r.status).collect();
        assert_eq!(statuses, vec![PickedUp, Pending]);
        assert_eq!(simulation.elevators()[0].passenger_count, 1);
    }

    #[test]
    fn test_peak_traffic_spreads_idle_elevators() {
        // Arrange
        let mut config = quiet_config(3, 10);
        config.peak_traffic_mode = true;
        let (mut simulation, clock) = setup_simulation(config);

        // Act
        clock.advance(1_000);
        simulation.tick();

        // Assert
        let targets: Vec<_> = simulation.elevators().iter().map(|e| e.target_floor).collect();
        assert_eq!(targets, vec![None, Some(3), Some(6)]);
    }
}
