//! `ummeter` command line tool.

use std::error::Error as _;
use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use clap::{ArgAction, ArgGroup, Parser, Subcommand};
use thiserror::Error;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;
use ummeter_interface::{InterfaceError, MeterInterface, SerialConfig, TtyInterface};
use ummeter_protocol::Reading;
use ummeter_runner::telemetry::describe_metrics;
use ummeter_runner::{format_decimal, format_time, CsvExporter, ExportError, Meter, MeterError, MeterResult};

/// Poll granularity while waiting between readings.
const SLEEP_SLICE: Duration = Duration::from_millis(50);

#[derive(Parser, Debug)]
#[command(name = "ummeter", version, about = "Read and control RDTech UM24C/UM25C/UM34C USB meters")]
#[command(group(ArgGroup::new("device").required(true).args(["tty", "bluetooth"])))]
struct Cli {
    /// Serial device (USB adapter or bound RFCOMM node, e.g. /dev/rfcomm0)
    #[arg(long, value_name = "PATH")]
    tty: Option<String>,

    /// Bluetooth address of the meter (XX:XX:XX:XX:XX:XX)
    #[arg(long, value_name = "MAC")]
    bluetooth: Option<String>,

    /// Receive timeout in seconds
    #[arg(long, value_name = "SECS", default_value = "1", value_parser = parse_seconds)]
    timeout: Duration,

    /// Increase log verbosity (-v debug, -vv trace). RUST_LOG overrides.
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Poll the meter and print readings until interrupted
    Monitor {
        /// Seconds between two readings
        #[arg(long, value_name = "SECS", default_value = "1.0", value_parser = parse_seconds)]
        refresh: Duration,

        /// Append readings to a CSV file (truncated first)
        #[arg(long, value_name = "CSV")]
        export: Option<PathBuf>,

        /// Print one JSON object per reading
        #[arg(long)]
        json: bool,

        /// Stop after this many readings
        #[arg(long, value_name = "N")]
        count: Option<u64>,
    },

    /// Screen control
    Screen {
        #[command(subcommand)]
        action: ScreenAction,
    },

    /// Data group control
    Group {
        #[command(subcommand)]
        action: GroupAction,
    },

    /// Set the recording current threshold (0-300 mA)
    Threshold {
        #[arg(allow_negative_numbers = true)]
        milliamps: i32,
    },
}

#[derive(Subcommand, Debug)]
enum ScreenAction {
    /// Next screen
    Next,
    /// Previous screen (UM25C/UM34C)
    Previous,
    /// Rotate the screen
    Rotate,
    /// Screen timeout in minutes (0-9)
    Timeout {
        #[arg(allow_negative_numbers = true)]
        minutes: i32,
    },
    /// Screen brightness (0-5)
    Brightness {
        #[arg(allow_negative_numbers = true)]
        level: i32,
    },
}

#[derive(Subcommand, Debug)]
enum GroupAction {
    /// Select a data group (UM25C/UM34C, 0-9)
    Select {
        #[arg(allow_negative_numbers = true)]
        group: i32,
    },
    /// Next data group (UM24C)
    Next,
    /// Clear the current data group
    Clear,
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Interface(#[from] InterfaceError),

    #[error(transparent)]
    Meter(#[from] MeterError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error("failed to write output")]
    Output(#[from] io::Error),

    #[error("failed to serialize reading")]
    Json(#[from] serde_json::Error),

    #[error("failed to install Ctrl-C handler")]
    Signal(#[from] ctrlc::Error),
}

fn parse_seconds(s: &str) -> Result<Duration, String> {
    let secs: f64 = s.parse().map_err(|e| format!("invalid number of seconds: {e}"))?;
    Duration::try_from_secs_f64(secs).map_err(|e| format!("invalid duration {s}: {e}"))
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn connect(cli: &Cli) -> Result<Box<dyn MeterInterface>, CliError> {
    if let Some(path) = &cli.tty {
        let config = SerialConfig {
            timeout: cli.timeout,
            ..SerialConfig::default()
        };
        let tty = TtyInterface::with_config(path.as_str(), config)?;
        info!("using {}", tty);
        return Ok(Box::new(tty));
    }
    match &cli.bluetooth {
        Some(address) => connect_bluetooth(address),
        None => Err(InterfaceError::InvalidPath(String::new()).into()),
    }
}

#[cfg(target_os = "linux")]
fn connect_bluetooth(address: &str) -> Result<Box<dyn MeterInterface>, CliError> {
    let bt = ummeter_interface::BluetoothInterface::new(address)?;
    info!("using {}", bt);
    Ok(Box::new(bt))
}

#[cfg(not(target_os = "linux"))]
fn connect_bluetooth(_address: &str) -> Result<Box<dyn MeterInterface>, CliError> {
    Err(InterfaceError::Unsupported("Bluetooth RFCOMM").into())
}

fn format_line(time: &DateTime<Local>, reading: &Reading) -> String {
    format!(
        "[{}] {} {:1.4}V {:1.4}A {:1.4}W {}Ohm",
        reading.model,
        format_time(time.time()),
        reading.voltage,
        reading.intensity,
        reading.power,
        format_decimal(reading.resistance),
    )
}

/// Sleep for `duration`, returning early once `running` is cleared.
fn sleep_while_running(duration: Duration, running: &AtomicBool) {
    let deadline = Instant::now() + duration;
    while running.load(Ordering::SeqCst) {
        let now = Instant::now();
        if now >= deadline {
            break;
        }
        thread::sleep(SLEEP_SLICE.min(deadline - now));
    }
}

fn monitor<I: MeterInterface>(
    meter: &mut Meter<I>,
    timeout: Duration,
    refresh: Duration,
    export: Option<PathBuf>,
    json: bool,
    count: Option<u64>,
) -> Result<(), CliError> {
    let running = Arc::new(AtomicBool::new(true));
    let handler_flag = Arc::clone(&running);
    ctrlc::set_handler(move || handler_flag.store(false, Ordering::SeqCst))?;

    let mut exporter = export.as_ref().map(CsvExporter::<File>::create).transpose()?;
    let mut session = meter.session()?;
    session.set_timeout(timeout)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut readings = 0u64;

    while running.load(Ordering::SeqCst) {
        match session.poll()? {
            Some(reading) => {
                let now = Local::now();
                if json {
                    serde_json::to_writer(&mut out, &reading)?;
                    writeln!(out)?;
                } else {
                    writeln!(out, "{}", format_line(&now, &reading))?;
                }
                out.flush()?;

                if let Some(exporter) = exporter.as_mut() {
                    exporter.update(now.naive_local(), &reading)?;
                }

                readings += 1;
                if count.is_some_and(|n| readings >= n) {
                    break;
                }
            }
            None => warn!("no complete reading received"),
        }
        sleep_while_running(refresh, &running);
    }

    debug!("monitor stopped after {} readings", readings);
    Ok(())
}

/// Send one control command inside a session.
fn control<I: MeterInterface>(
    meter: &mut Meter<I>,
    timeout: Duration,
    send: impl FnOnce(&mut Meter<I>) -> MeterResult<()>,
) -> Result<(), CliError> {
    let mut session = meter.session()?;
    session.set_timeout(timeout)?;
    send(&mut *session)?;
    info!("command sent");
    Ok(())
}

fn run(cli: Cli) -> Result<(), CliError> {
    let mut meter = Meter::new(connect(&cli)?);
    let timeout = cli.timeout;

    match cli.command {
        Commands::Monitor {
            refresh,
            export,
            json,
            count,
        } => monitor(&mut meter, timeout, refresh, export, json, count),
        Commands::Screen { action } => control(&mut meter, timeout, |m| match action {
            ScreenAction::Next => m.screen_next(),
            ScreenAction::Previous => m.screen_previous(),
            ScreenAction::Rotate => m.screen_rotate(),
            ScreenAction::Timeout { minutes } => m.screen_timeout(minutes),
            ScreenAction::Brightness { level } => m.screen_brightness(level),
        }),
        Commands::Group { action } => control(&mut meter, timeout, |m| match action {
            GroupAction::Select { group } => m.data_group_select(group),
            GroupAction::Next => m.data_group_next(),
            GroupAction::Clear => m.data_group_clear(),
        }),
        Commands::Threshold { milliamps } => control(&mut meter, timeout, |m| m.record_threshold(milliamps)),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    describe_metrics();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let mut message = err.to_string();
            let mut source = err.source();
            while let Some(cause) = source {
                message.push_str(": ");
                message.push_str(&cause.to_string());
                source = cause.source();
            }
            error!("{}", message);
            ExitCode::FAILURE
        }
    }
}
