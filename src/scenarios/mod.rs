pub mod scenarios;

pub use scenarios::{all_scenarios, find_scenario, run_scenario, Scenario, ScheduledRequest};
