/***************************************/
/*        3rd party libraries          */
/***************************************/
use crossbeam_channel as cbc;
use log::{debug, info};
use std::thread::{Builder, JoinHandle};
use std::time::{Duration, Instant};

/***************************************/
/*           Local modules             */
/***************************************/
use crate::shared::{
    ConfigUpdate, Elevator, Floor, Metrics, Request, SimError, SimResult, SystemState,
};
use crate::simulation::Simulation;

/***************************************/
/*               Enums                 */
/***************************************/
enum Command {
    GetSystemState(cbc::Sender<SystemState>),
    GetMetrics(cbc::Sender<Metrics>),
    GetElevators(cbc::Sender<Vec<Elevator>>),
    GetFloors(cbc::Sender<Vec<Floor>>),
    GetRequests(cbc::Sender<Vec<Request>>),
    Start(cbc::Sender<bool>),
    Stop(cbc::Sender<bool>),
    Reset(cbc::Sender<()>),
    UpdateConfig(ConfigUpdate, cbc::Sender<SimResult<bool>>),
    AddRequest(u8, u8, cbc::Sender<SimResult<Request>>),
    Terminate,
}

enum Event {
    Command(Command),
    Tick,
    Disconnected,
}

/***************************************/
/*             Public API              */
/***************************************/

/**
 * Owns the simulation on its own thread and is the only place it is mutated.
 *
 * Commands from any number of `SimulationHandle`s and the tick timer are
 * multiplexed through one `select!`, so a tick never overlaps a command.
 * While the simulation is stopped the timer is `never()`; after every
 * command it is re-synchronized with the simulation's running flag and
 * speed.
 *
 * # Fields
 * - `simulation`:      The engine.
 * - `command_rx`:      Commands from handles.
 * - `ticker`:          Tick timer, or `never()` while stopped.
 * - `tick_interval`:   Period of the active timer, `None` while stopped.
 */
pub struct Coordinator {
    simulation: Simulation,
    command_rx: cbc::Receiver<Command>,
    ticker: cbc::Receiver<Instant>,
    tick_interval: Option<Duration>,
}

impl Coordinator {
    fn new(simulation: Simulation, command_rx: cbc::Receiver<Command>) -> Coordinator {
        let mut coordinator = Coordinator {
            simulation,
            command_rx,
            ticker: cbc::never(),
            tick_interval: None,
        };
        coordinator.sync_ticker();
        coordinator
    }

    /// Moves `simulation` onto a new thread and returns a handle to it.
    pub fn spawn(simulation: Simulation) -> SimResult<(SimulationHandle, JoinHandle<()>)> {
        let (command_tx, command_rx) = cbc::unbounded::<Command>();
        let coordinator = Coordinator::new(simulation, command_rx);

        let coordinator_thread = Builder::new()
            .name("coordinator".into())
            .spawn(move || coordinator.run())?;

        Ok((SimulationHandle { command_tx }, coordinator_thread))
    }

    pub fn run(mut self) {
        info!("Coordinator running");
        loop {
            match self.wait_for_event() {
                Event::Command(Command::Terminate) | Event::Disconnected => break,
                Event::Command(command) => {
                    self.handle_command(command);
                    self.sync_ticker();
                }
                Event::Tick => self.simulation.tick(),
            }
        }
        info!("Coordinator terminated");
    }

    fn wait_for_event(&self) -> Event {
        cbc::select! {
            recv(self.command_rx) -> command => match command {
                Ok(command) => Event::Command(command),
                Err(_) => Event::Disconnected,
            },
            recv(self.ticker) -> _ => Event::Tick,
        }
    }

    // Replies are best effort: a caller that gave up waiting is not an error.
    fn handle_command(&mut self, command: Command) {
        match command {
            Command::GetSystemState(reply) => {
                let _ = reply.send(self.simulation.system_state());
            }
            Command::GetMetrics(reply) => {
                let _ = reply.send(self.simulation.metrics().clone());
            }
            Command::GetElevators(reply) => {
                let _ = reply.send(self.simulation.elevators().to_vec());
            }
            Command::GetFloors(reply) => {
                let _ = reply.send(self.simulation.floors().to_vec());
            }
            Command::GetRequests(reply) => {
                let _ = reply.send(self.simulation.requests().to_vec());
            }
            Command::Start(reply) => {
                let _ = reply.send(self.simulation.start());
            }
            Command::Stop(reply) => {
                let _ = reply.send(self.simulation.stop());
            }
            Command::Reset(reply) => {
                self.simulation.reset();
                let _ = reply.send(());
            }
            Command::UpdateConfig(update, reply) => {
                let _ = reply.send(self.simulation.update_config(&update));
            }
            Command::AddRequest(origin, destination, reply) => {
                let _ = reply.send(self.simulation.add_request(origin, destination));
            }
            Command::Terminate => {}
        }
    }

    fn sync_ticker(&mut self) {
        let wanted = if self.simulation.is_running() {
            Some(self.simulation.tick_interval())
        } else {
            None
        };

        if wanted == self.tick_interval {
            return;
        }

        self.ticker = match wanted {
            Some(interval) => {
                debug!("Tick timer set to {:?}", interval);
                cbc::tick(interval)
            }
            None => {
                debug!("Tick timer cancelled");
                cbc::never()
            }
        };
        self.tick_interval = wanted;
    }
}

/**
 * Cloneable, thread-safe access to a running `Coordinator`.
 *
 * Every call is answered by the coordinator thread before it returns.
 * Calls fail with `SimError::Disconnected` once the coordinator is gone.
 */
#[derive(Clone)]
pub struct SimulationHandle {
    command_tx: cbc::Sender<Command>,
}

impl SimulationHandle {
    pub fn system_state(&self) -> SimResult<SystemState> {
        self.request(Command::GetSystemState)
    }

    pub fn metrics(&self) -> SimResult<Metrics> {
        self.request(Command::GetMetrics)
    }

    pub fn elevators(&self) -> SimResult<Vec<Elevator>> {
        self.request(Command::GetElevators)
    }

    pub fn floors(&self) -> SimResult<Vec<Floor>> {
        self.request(Command::GetFloors)
    }

    pub fn requests(&self) -> SimResult<Vec<Request>> {
        self.request(Command::GetRequests)
    }

    /// Returns false if the simulation was already running.
    pub fn start(&self) -> SimResult<bool> {
        self.request(Command::Start)
    }

    /// Returns false if the simulation was already stopped.
    pub fn stop(&self) -> SimResult<bool> {
        self.request(Command::Stop)
    }

    pub fn reset(&self) -> SimResult<()> {
        self.request(Command::Reset)
    }

    /// Returns whether the update reset the system.
    pub fn update_config(&self, update: ConfigUpdate) -> SimResult<bool> {
        self.request(|reply| Command::UpdateConfig(update, reply))?
    }

    pub fn add_request(&self, origin_floor: u8, destination_floor: u8) -> SimResult<Request> {
        self.request(|reply| Command::AddRequest(origin_floor, destination_floor, reply))?
    }

    /// Stops the coordinator thread. Later calls on any handle fail.
    pub fn shutdown(&self) -> SimResult<()> {
        self.command_tx
            .send(Command::Terminate)
            .map_err(|_| SimError::Disconnected)
    }

    fn request<T>(&self, command: impl FnOnce(cbc::Sender<T>) -> Command) -> SimResult<T> {
        let (reply_tx, reply_rx) = cbc::bounded::<T>(1);
        self.command_tx
            .send(command(reply_tx))
            .map_err(|_| SimError::Disconnected)?;
        reply_rx.recv().map_err(|_| SimError::Disconnected)
    }
}
