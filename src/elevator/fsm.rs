/***************************************/
/*        3rd party libraries          */
/***************************************/
use log::trace;
use rand::Rng;

/***************************************/
/*           Local modules             */
/***************************************/
use crate::shared::{Direction, DoorState, Elevator};

/***************************************/
/*             Constants               */
/***************************************/
/// Wall-clock time a door stays open, independent of simulation speed.
pub const DOOR_OPEN_TIME_MS: u64 = 3_000;
/// Chance per tick that a travelling car reaches the next floor.
pub const MOVE_PROBABILITY: f64 = 0.1;

/**
 * Per-car state machine, stepped once per tick.
 *
 * The door phase and the motion phase are independent. The door phase
 * always runs; the motion phase only does something while the doors are
 * closed and a target is set.
 *
 * # Door phase
 * - `Opening -> Open`:     immediately, arming the close deadline.
 * - `Open -> Closing`:     once the close deadline has passed.
 * - `Closing -> Closed`:   on the next tick.
 *
 * # Motion phase
 * Each tick the car advances one floor with probability `MOVE_PROBABILITY`.
 * A car already at its target arrives without a roll.
 */
pub fn update_door_state(elevator: &mut Elevator, now: u64) {
    match elevator.door_state {
        DoorState::Opening => {
            elevator.door_state = DoorState::Open;
            elevator.door_close_at = Some(now + DOOR_OPEN_TIME_MS);
        }
        DoorState::Open => {
            // A missing deadline means the door was opened outside the
            // state machine; let it close on the next pass.
            let expired = elevator.door_close_at.map_or(true, |deadline| now >= deadline);
            if expired {
                elevator.door_state = DoorState::Closing;
                elevator.door_close_at = None;
            }
        }
        DoorState::Closing => {
            elevator.door_state = DoorState::Closed;
        }
        DoorState::Closed => {}
    }
}

/// Moves the car towards its target. Returns the floor it arrived at, if any.
pub fn move_elevator<R: Rng + ?Sized>(elevator: &mut Elevator, rng: &mut R) -> Option<u8> {
    if elevator.door_state != DoorState::Closed {
        return None;
    }
    let target = elevator.target_floor?;

    if elevator.current_floor == target {
        arrive(elevator, target);
        return Some(target);
    }

    let going_up = elevator.current_floor < target;
    elevator.direction = if going_up { Direction::Up } else { Direction::Down };
    elevator.is_moving = true;

    if rng.gen_bool(MOVE_PROBABILITY) {
        if going_up {
            elevator.current_floor += 1;
        } else {
            elevator.current_floor -= 1;
        }
        trace!("{} passed floor {}", elevator.id, elevator.current_floor);

        if elevator.current_floor == target {
            arrive(elevator, target);
            return Some(target);
        }
    }

    None
}

fn arrive(elevator: &mut Elevator, floor: u8) {
    elevator.current_floor = floor;
    elevator.target_floor = None;
    elevator.direction = Direction::Idle;
    elevator.is_moving = false;
    elevator.door_state = DoorState::Opening;
}
