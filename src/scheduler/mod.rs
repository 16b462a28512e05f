pub mod scheduler;

pub use scheduler::{
    assign_elevator, optimize_route, pre_position_idle_elevators, scan, score_elevator,
    SchedulingScore,
};
