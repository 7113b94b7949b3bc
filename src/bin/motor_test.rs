//! TB6612FNG bench test.
//!
//! Runs either the scripted demo or an interactive session against one of
//! the GPIO backends. Without a subcommand a menu is read from stdin.
//!
//! # Usage
//!
//! ```bash
//! # Simulated pins, pick a mode from the menu
//! motor_test
//!
//! # Scripted demo through the pigpio daemon on another host
//! motor_test --backend pigpiod --host raspberrypi.local demo
//!
//! # Native GPIO (build with --features rpi)
//! sudo motor_test --backend rppal interactive --speed 70
//! ```
//!
//! Log verbosity follows `RUST_LOG` (default `info`).
//!
//! # Exit status
//!
//! `0` on normal completion and on Ctrl-C. `1` when initialization, the
//! demo or the session fails; the driver is shut down first.

use std::io;
use std::path::PathBuf;
use std::process::{self, ExitCode};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tb6612_bringup::config::{short_string, BackendKind, Config};
use tb6612_bringup::demo::{run_demo, DemoScript};
use tb6612_bringup::hal::{PigpiodGpio, SimGpio, StdDelay};
use tb6612_bringup::interactive::{prompt_mode, run_interactive, Mode};
use tb6612_bringup::{Gpio, SharedDriver, Tb6612};

/// Bring-up test for a TB6612FNG dual motor driver
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// JSON config file; fields it omits keep their defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// GPIO backend: sim, rppal or pigpiod
    #[arg(short, long)]
    backend: Option<BackendKind>,

    /// pigpio daemon host
    #[arg(long)]
    host: Option<String>,

    /// pigpio daemon port
    #[arg(long)]
    port: Option<u16>,

    /// Speed for interactive motion commands (percent)
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(0..=100))]
    speed: Option<u8>,

    #[command(subcommand)]
    mode: Option<ModeArg>,
}

#[derive(Debug, Subcommand)]
enum ModeArg {
    /// Run the automated test sequence
    Demo,
    /// Read motor commands from stdin
    Interactive,
}

fn main() -> anyhow::Result<ExitCode> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = load_config(&args)?;

    let mode = match args.mode {
        Some(ModeArg::Demo) => Mode::Demo,
        Some(ModeArg::Interactive) => Mode::Interactive,
        None => match prompt_mode(io::stdin().lock(), &mut io::stdout())? {
            Some(mode) => mode,
            None => {
                println!("Invalid choice!");
                return Ok(ExitCode::SUCCESS);
            }
        },
    };

    log::info!(
        "Platform: {} {}",
        std::env::consts::OS,
        std::env::consts::ARCH
    );
    log::info!("Pin configuration: {}", config.pins);
    log::info!("Make sure STBY is connected and VM is connected to power supply!");

    match config.backend {
        BackendKind::Sim => {
            log::warn!("Running in simulation mode - no actual GPIO control");
            run(SimGpio::new(), &config, mode)
        }
        BackendKind::Pigpiod => {
            let host = config.pigpiod.host.as_str();
            let port = config.pigpiod.port;
            let gpio = PigpiodGpio::connect(host, port)
                .with_context(|| format!("could not reach pigpiod at {host}:{port} (is it running?)"))?;
            run(gpio, &config, mode)
        }
        BackendKind::Rppal => run_rppal(&config, mode),
    }
}

fn load_config(args: &Args) -> anyhow::Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::from_json_file(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => Config::default(),
    };

    if let Some(backend) = args.backend {
        config.backend = backend;
    }
    if let Some(host) = &args.host {
        config.pigpiod.host = short_string(host);
    }
    if let Some(port) = args.port {
        config.pigpiod.port = port;
    }
    if let Some(speed) = args.speed {
        config.speed.interactive = speed;
    }

    config.validate().context("invalid configuration")?;
    Ok(config)
}

#[cfg(feature = "rpi")]
fn run_rppal(config: &Config, mode: Mode) -> anyhow::Result<ExitCode> {
    let gpio = tb6612_bringup::hal::RppalGpio::new()
        .context("could not open GPIO (run with sudo or join the gpio group)")?;
    run(gpio, config, mode)
}

#[cfg(not(feature = "rpi"))]
fn run_rppal(_config: &Config, _mode: Mode) -> anyhow::Result<ExitCode> {
    anyhow::bail!("the rppal backend needs a build with `--features rpi`")
}

fn run<G>(gpio: G, config: &Config, mode: Mode) -> anyhow::Result<ExitCode>
where
    G: Gpio + Send + 'static,
{
    let driver = SharedDriver::new(Tb6612::from_config(gpio, config));

    let handler = driver.clone();
    ctrlc::set_handler(move || {
        log::info!("Interrupted by user");
        handler.shutdown();
        process::exit(0);
    })
    .context("failed to install Ctrl-C handler")?;

    if let Err(err) = driver.with_driver(|d| d.initialize()) {
        let err = anyhow::Error::from(err);
        log::error!("Error during GPIO setup: {err:#}");
        if config.backend == BackendKind::Rppal {
            log::error!("Check that the program runs with access to /dev/gpiomem");
        }
        driver.shutdown();
        return Ok(ExitCode::FAILURE);
    }

    let outcome = match mode {
        Mode::Demo => {
            let script = DemoScript::from_config(&config.demo);
            run_demo(&driver, &script, &mut StdDelay).map_err(anyhow::Error::from)
        }
        Mode::Interactive => {
            let speed = i32::from(config.speed.interactive);
            run_interactive(&driver, io::stdin().lock(), &mut io::stdout(), speed)
                .map(|summary| {
                    log::debug!(
                        "session: {} applied, {} unknown, {} failed",
                        summary.applied,
                        summary.unknown,
                        summary.failed
                    );
                })
                .map_err(anyhow::Error::from)
        }
    };

    driver.shutdown();

    match outcome {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(err) => {
            log::error!("Error during test: {err:#}");
            Ok(ExitCode::FAILURE)
        }
    }
}
