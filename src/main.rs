/* 3rd party libraries */
use clap::{Arg, Command};
use crossbeam_channel as cbc;
use log::{info, warn};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use std::thread::{sleep, Builder};
use std::time::Duration;

/* Custom libraries */
use elevator_sim::config::{self, ObserverConfig};
use elevator_sim::scenarios;
use elevator_sim::shared::SimResult;
use elevator_sim::unwrap_or_exit;
use elevator_sim::{Coordinator, Simulation, SimulationHandle, SystemState};

/* Main */
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let matches = Command::new("elevator-sim")
        .about("Multi-elevator dispatch simulator")
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .takes_value(true)
                .default_value("config.toml")
                .help("Path to the TOML configuration file"),
        )
        .arg(
            Arg::new("scenario")
                .long("scenario")
                .short('s')
                .takes_value(true)
                .help("Run a scenario preset, e.g. morning-rush-hour"),
        )
        .arg(
            Arg::new("duration-ms")
                .long("duration-ms")
                .takes_value(true)
                .default_value("30000")
                .help("How long to run without a scenario"),
        )
        .arg(
            Arg::new("list-scenarios")
                .long("list-scenarios")
                .help("Print the scenario presets as JSON and exit"),
        )
        .get_matches();

    // Scenario presets are drawn from their own generator
    let mut rng = SmallRng::from_entropy();

    if matches.is_present("list-scenarios") {
        let presets = scenarios::all_scenarios(&mut rng);
        let listing = unwrap_or_exit!(
            serde_json::to_string_pretty(&presets),
            "listing scenarios"
        );
        println!("{}", listing);
        return;
    }

    // Load the configuration
    let config_path = matches.value_of("config").unwrap_or("config.toml");
    let config = match config::load_config(config_path) {
        Ok(config) => config,
        Err(e) => {
            warn!("Using default configuration ({}: {})", config_path, e);
            config::Config::default()
        }
    };

    // Start the coordinator
    let simulation = unwrap_or_exit!(
        Simulation::new(config.simulation.clone()),
        "building the simulation"
    );
    let (handle, coordinator_thread) =
        unwrap_or_exit!(Coordinator::spawn(simulation), "spawning the coordinator");

    // Start the observer
    let (observer_terminate_tx, observer_terminate_rx) = cbc::unbounded::<()>();
    let observer_handle = handle.clone();
    let observer_config = config.observer.clone();
    let observer_thread = unwrap_or_exit!(
        Builder::new()
            .name("observer".into())
            .spawn(move || observe(observer_handle, &observer_config, observer_terminate_rx)),
        "spawning the observer"
    );

    // Drive the simulation
    let final_state = match matches.value_of("scenario") {
        Some(slug) => {
            let scenario = unwrap_or_exit!(
                scenarios::find_scenario(slug, &mut rng),
                "looking up the scenario"
            );
            unwrap_or_exit!(scenarios::run_scenario(&handle, &scenario), "running the scenario")
        }
        None => {
            let duration_ms: u64 = unwrap_or_exit!(
                matches
                    .value_of("duration-ms")
                    .unwrap_or("30000")
                    .parse::<u64>(),
                "parsing --duration-ms"
            );
            unwrap_or_exit!(
                run_free(&handle, Duration::from_millis(duration_ms)),
                "running the simulation"
            )
        }
    };

    // Cleanup
    let _ = observer_terminate_tx.send(());
    let _ = observer_thread.join();
    let _ = handle.shutdown();
    let _ = coordinator_thread.join();

    log_metrics(&final_state);
    let output = if config.observer.pretty {
        serde_json::to_string_pretty(&final_state)
    } else {
        serde_json::to_string(&final_state)
    };
    println!("{}", unwrap_or_exit!(output, "serializing the final state"));
}

fn run_free(handle: &SimulationHandle, duration: Duration) -> SimResult<SystemState> {
    info!("Running for {:?}", duration);
    handle.start()?;
    sleep(duration);
    handle.stop()?;
    handle.system_state()
}

fn observe(handle: SimulationHandle, config: &ObserverConfig, terminate_rx: cbc::Receiver<()>) {
    let interval = Duration::from_millis(config.poll_interval_ms.max(1));
    loop {
        cbc::select! {
            recv(terminate_rx) -> _ => return,
            default(interval) => match handle.system_state() {
                Ok(state) => log_metrics(&state),
                Err(_) => return,
            },
        }
    }
}

fn log_metrics(state: &SystemState) {
    let metrics = &state.metrics;
    info!(
        "tick {}: {} requests, {} completed, {} pending, avg wait {:.0}ms, max wait {}ms, avg travel {:.0}ms, utilization {:?}",
        state.tick,
        metrics.total_requests,
        metrics.completed_requests,
        metrics.pending_requests,
        metrics.average_wait_time,
        metrics.max_wait_time,
        metrics.average_travel_time,
        metrics.elevator_utilization
    );
}
