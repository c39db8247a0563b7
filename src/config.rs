/***************************************/
/*        3rd party libraries          */
/***************************************/
use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::Deserialize;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

/***************************************/
/*           Local modules             */
/***************************************/
use crate::shared::CarId;

/***************************************/
/*       Public data structures        */
/***************************************/
#[derive(Deserialize, Clone, Debug)]
pub struct Config {
    pub simulation: SimulationConfig,
    pub car: CarConfig,
    pub dispatcher: DispatcherConfig,
    pub generator: GeneratorConfig,
}

#[derive(Deserialize, Clone, Debug)]
pub struct SimulationConfig {
    pub n_floors: u8,
    pub car_count: usize,
    pub request_count: Option<usize>,
    pub poll_interval_ms: u64,
}

#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct CarConfig {
    pub floor_travel_time_ms: u64,
    pub passenger_transition_time_ms: u64,
}

#[derive(Deserialize, Clone, Debug)]
pub struct DispatcherConfig {
    pub tick_interval_ms: u64,
}

#[derive(Deserialize, Clone, Debug)]
pub struct GeneratorConfig {
    pub min_interval_ms: u64,
    pub max_interval_ms: u64,
    pub preassign_destination: bool,
}

/// Command line overrides for `config.toml`.
#[derive(Parser, Debug, Default)]
#[clap(name = "elevator-sim", about = "Simulates a small fleet of elevator cars")]
pub struct Args {
    /// Path to the configuration file
    #[clap(long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Number of cars in the fleet (1-4)
    #[clap(long)]
    pub cars: Option<usize>,

    /// Number of random requests to generate
    #[clap(long)]
    pub requests: Option<usize>,

    /// Log filter, e.g. `info` or `elevator_sim=debug`
    #[clap(long)]
    pub log_level: Option<String>,
}

/***************************************/
/*             Public API              */
/***************************************/
pub fn load_config(path: &Path) -> Result<Config> {
    let config_str = fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration file {}", path.display()))?;
    parse_config(&config_str)
        .with_context(|| format!("Failed to parse configuration file {}", path.display()))
}

pub fn parse_config(config_str: &str) -> Result<Config> {
    let config: Config = toml::from_str(config_str)?;
    config.validate()?;
    Ok(config)
}

impl Config {
    pub fn apply_args(&mut self, args: &Args) {
        if let Some(cars) = args.cars {
            self.simulation.car_count = cars;
        }
        if let Some(requests) = args.requests {
            self.simulation.request_count = Some(requests);
        }
    }

    /// Checks the settings an operator cannot fix at the prompt.
    pub fn validate(&self) -> Result<()> {
        if self.simulation.n_floors < 2 {
            bail!("n_floors must be at least 2, got {}", self.simulation.n_floors);
        }
        if self.dispatcher.tick_interval_ms == 0 {
            bail!("tick_interval_ms must be positive");
        }
        if self.generator.min_interval_ms > self.generator.max_interval_ms {
            bail!(
                "min_interval_ms ({}) is larger than max_interval_ms ({})",
                self.generator.min_interval_ms,
                self.generator.max_interval_ms
            );
        }
        Ok(())
    }

    /**
     * Makes sure car count and request count are usable, asking the operator
     * on `input` until they are.
     *
     * Returns the final request count.
     */
    pub fn resolve_counts<R: BufRead, W: Write>(
        &mut self,
        input: &mut R,
        output: &mut W,
    ) -> io::Result<usize> {
        if let Err(reason) = validate_car_count(self.simulation.car_count) {
            writeln!(output, "{}", reason)?;
            self.simulation.car_count = prompt_until_valid(
                input,
                output,
                "Enter number of elevator cars (1-4): ",
                validate_car_count,
            )?;
        }

        let request_count = match self.simulation.request_count.map(validate_request_count) {
            Some(Ok(count)) => count,
            Some(Err(reason)) => {
                writeln!(output, "{}", reason)?;
                self.prompt_request_count(input, output)?
            }
            None => self.prompt_request_count(input, output)?,
        };
        self.simulation.request_count = Some(request_count);
        Ok(request_count)
    }

    fn prompt_request_count<R: BufRead, W: Write>(
        &self,
        input: &mut R,
        output: &mut W,
    ) -> io::Result<usize> {
        prompt_until_valid(
            input,
            output,
            "Enter number of random calls for the elevator: ",
            validate_request_count,
        )
    }
}

pub fn validate_car_count(count: usize) -> Result<usize, String> {
    match CarId::fleet(count) {
        Some(_) => Ok(count),
        None => Err(format!(
            "Car count must be between 1 and {}, got {}.",
            CarId::ALL.len(),
            count
        )),
    }
}

pub fn validate_request_count(count: usize) -> Result<usize, String> {
    if count == 0 {
        return Err("Request count must be a positive number.".to_string());
    }
    Ok(count)
}

/// Repeats `prompt` until a line parses and passes `validate`. EOF is an error.
pub fn prompt_until_valid<R, W, F>(
    input: &mut R,
    output: &mut W,
    prompt: &str,
    validate: F,
) -> io::Result<usize>
where
    R: BufRead,
    W: Write,
    F: Fn(usize) -> Result<usize, String>,
{
    loop {
        write!(output, "{}", prompt)?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "input closed before a valid value was entered",
            ));
        }

        match line.trim().parse::<usize>() {
            Ok(value) => match validate(value) {
                Ok(value) => return Ok(value),
                Err(reason) => writeln!(output, "{}", reason)?,
            },
            Err(_) => writeln!(output, "Please enter a whole number.")?,
        }
    }
}
