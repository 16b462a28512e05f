pub mod fsm;
mod fsm_tests;

pub use fsm::{move_elevator, update_door_state, DOOR_OPEN_TIME_MS, MOVE_PROBABILITY};
