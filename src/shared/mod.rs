pub mod clock;
pub mod error;
pub mod macros;
pub mod structs;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{SimError, SimResult};
pub use structs::ConfigUpdate;
pub use structs::Direction;
pub use structs::DoorState;
pub use structs::Elevator;
pub use structs::ElevatorId;
pub use structs::Floor;
pub use structs::Metrics;
pub use structs::Request;
pub use structs::RequestDirection;
pub use structs::RequestId;
pub use structs::RequestStatus;
pub use structs::SimulationConfig;
pub use structs::SystemState;
