/*
 * Unit tests for the elevator state machine
 *
 * The unit tests follows the Arrange, Act, Assert pattern.
 *
 * Tests:
 *  - test_door_cycle
 *  - test_door_stays_open_until_deadline
 *  - test_move_arrives_immediately_at_target
 *  - test_move_up_one_floor_per_successful_roll
 *  - test_move_down_and_arrive
 *  - test_move_waits_on_failed_roll
 *  - test_move_requires_closed_doors
 */

/***************************************/
/*             Unit tests              */
/***************************************/
#[cfg(test)]
mod fsm_tests {
    use crate::elevator::{move_elevator, update_door_state, DOOR_OPEN_TIME_MS};
    use crate::shared::Direction::{Down, Idle, Up};
    use crate::shared::DoorState::{Closed, Closing, Open, Opening};
    use crate::shared::{Elevator, ElevatorId};
    use rand::rngs::mock::StepRng;

    fn always_move() -> StepRng {
        StepRng::new(0, 0)
    }

    fn never_move() -> StepRng {
        StepRng::new(u64::MAX, 0)
    }

    fn setup_elevator(floor: u8, target: Option<u8>) -> Elevator {
        let mut elevator = Elevator::new(ElevatorId(0), 8, 0);
        elevator.current_floor = floor;
        elevator.target_floor = target;
        elevator
    }

    #[test]
    fn test_door_cycle() {
        // Arrange
        let mut elevator = setup_elevator(0, None);
        elevator.door_state = Opening;

        // Act & Assert
        update_door_state(&mut elevator, 1_000);
        assert_eq!(elevator.door_state, Open);
        assert_eq!(elevator.door_close_at, Some(1_000 + DOOR_OPEN_TIME_MS));

        update_door_state(&mut elevator, 1_000 + DOOR_OPEN_TIME_MS);
        assert_eq!(elevator.door_state, Closing);
        assert_eq!(elevator.door_close_at, None);

        update_door_state(&mut elevator, 1_000 + DOOR_OPEN_TIME_MS + 1);
        assert_eq!(elevator.door_state, Closed);

        update_door_state(&mut elevator, 1_000 + DOOR_OPEN_TIME_MS + 2);
        assert_eq!(elevator.door_state, Closed);
    }

    #[test]
    fn test_door_stays_open_until_deadline() {
        // Arrange
        let mut elevator = setup_elevator(0, None);
        elevator.door_state = Opening;
        update_door_state(&mut elevator, 0);

        // Act
        for now in [1, 1_000, 2_999] {
            update_door_state(&mut elevator, now);
        }

        // Assert
        assert_eq!(elevator.door_state, Open);
    }

    #[test]
    fn test_move_arrives_immediately_at_target() {
        // Arrange
        let mut elevator = setup_elevator(4, Some(4));
        let mut rng = never_move();

        // Act
        let arrived = move_elevator(&mut elevator, &mut rng);

        // Assert
        assert_eq!(arrived, Some(4));
        assert_eq!(elevator.target_floor, None);
        assert_eq!(elevator.direction, Idle);
        assert_eq!(elevator.door_state, Opening);
        assert!(!elevator.is_moving);
    }

    #[test]
    fn test_move_up_one_floor_per_successful_roll() {
        // Arrange
        let mut elevator = setup_elevator(1, Some(3));
        let mut rng = always_move();

        // Act
        let first = move_elevator(&mut elevator, &mut rng);

        // Assert
        assert_eq!(first, None);
        assert_eq!(elevator.current_floor, 2);
        assert_eq!(elevator.direction, Up);
        assert!(elevator.is_moving);

        // Act
        let second = move_elevator(&mut elevator, &mut rng);

        // Assert
        assert_eq!(second, Some(3));
        assert_eq!(elevator.current_floor, 3);
        assert_eq!(elevator.door_state, Opening);
    }

    #[test]
    fn test_move_down_and_arrive() {
        // Arrange
        let mut elevator = setup_elevator(1, Some(0));
        let mut rng = always_move();

        // Act
        let arrived = move_elevator(&mut elevator, &mut rng);

        // Assert
        assert_eq!(arrived, Some(0));
        assert_eq!(elevator.current_floor, 0);
        assert_eq!(elevator.direction, Idle);
    }

    #[test]
    fn test_move_waits_on_failed_roll() {
        // Arrange
        let mut elevator = setup_elevator(5, Some(2));
        let mut rng = never_move();

        // Act
        let arrived = move_elevator(&mut elevator, &mut rng);

        // Assert
        assert_eq!(arrived, None);
        assert_eq!(elevator.current_floor, 5);
        assert_eq!(elevator.direction, Down);
        assert!(elevator.is_moving);
    }

    #[test]
    fn test_move_requires_closed_doors() {
        // Arrange
        let mut elevator = setup_elevator(5, Some(2));
        elevator.door_state = Closing;
        let mut rng = always_move();

        // Act
        let arrived = move_elevator(&mut elevator, &mut rng);

        // Assert
        assert_eq!(arrived, None);
        assert_eq!(elevator.current_floor, 5);
        assert_eq!(elevator.direction, Idle);
    }
}
