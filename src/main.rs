/* 3rd party libraries */
use clap::Parser;
use log::{debug, info};
use std::io;
use std::thread::sleep;
use std::time::Duration;

/* Modules */
mod car;
mod config;
mod dispatcher;
mod shared;

/* Main */
fn main() {
    let args = config::Args::parse();
    init_logger(args.log_level.as_deref());

    // Load the configuration, asking the operator for anything missing
    let mut config = unwrap_or_exit!(config::load_config(&args.config));
    config.apply_args(&args);
    let request_count = unwrap_or_exit!(config.resolve_counts(&mut io::stdin().lock(), &mut io::stdout()));

    // Start the cars, the request generator and the dispatch tick
    let dispatcher = unwrap_or_exit!(dispatcher::start_simulation(&config));
    info!(
        "Simulating {} requests on {} cars across {} floors",
        request_count, config.simulation.car_count, config.simulation.n_floors
    );

    // Termination is polled, nothing is pushed into the cars
    let poll_interval = Duration::from_millis(config.simulation.poll_interval_ms);
    loop {
        sleep(poll_interval);
        if dispatcher.is_finished() {
            break;
        }
        debug!("{} request(s) waiting for a car", dispatcher.pending_requests());
    }
    dispatcher.shutdown();

    match serde_json::to_string_pretty(&dispatcher.snapshot()) {
        Ok(snapshot) => debug!("Final fleet state: {}", snapshot),
        Err(e) => debug!("Could not serialize final fleet state: {}", e),
    }
    info!("All requests have been processed.");
}

fn init_logger(level: Option<&str>) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if let Some(level) = level {
        builder.parse_filters(level);
    }
    builder.format_target(false).init();
}
