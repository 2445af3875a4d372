// Simulator binary: parses the run configuration, wires Ctrl+C to the
// cancellation handle, runs the simulation, and prints the report.

use schedsim::{Policy, Simulation, SimulationConfig};
use std::time::Duration;

/// Command-line options parsed from program arguments.
struct CliOptions {
    config: SimulationConfig,
    /// Emit the full report as JSON instead of the text summary.
    json: bool,
}

fn parse_policy(value: &str, current: Policy) -> Policy {
    match value.to_ascii_lowercase().as_str() {
        "sjf" | "shortest-job-first" => Policy::Sjf,
        "rr" | "round-robin" | "round_robin" => Policy::RoundRobin,
        _ => current,
    }
}

/// Parse command-line arguments into `CliOptions`.
///
/// Every option accepts both `--key=value` and `--key value`:
/// - `--policy`: `sjf` (default) or `rr`
/// - `--processes`: number of processes to create
/// - `--capacity`: admission gate bound
/// - `--consumers`: consumer thread count
/// - `--quantum`: round-robin quantum in burst units
/// - `--burst-min` / `--burst-max`: burst range
/// - `--time-unit-ms`: simulated cost of one burst unit
/// - `--seed`: fix the RNG for a reproducible run
/// - `--json`: print the report as JSON
fn parse_cli_options() -> CliOptions {
    let mut config = SimulationConfig::default();
    let mut json = false;

    let apply = |key: &str, value: &str, config: &mut SimulationConfig| match key {
        "--policy" => config.policy = parse_policy(value, config.policy),
        "--processes" => {
            if let Ok(count) = value.parse() {
                config.target_count = count;
            }
        }
        "--capacity" => {
            if let Ok(capacity) = value.parse() {
                config.capacity = capacity;
            }
        }
        "--consumers" => {
            if let Ok(consumers) = value.parse() {
                config.consumers = consumers;
            }
        }
        "--quantum" => {
            if let Ok(quantum) = value.parse() {
                config.quantum = quantum;
            }
        }
        "--burst-min" => {
            if let Ok(burst) = value.parse() {
                config.burst_min = burst;
            }
        }
        "--burst-max" => {
            if let Ok(burst) = value.parse() {
                config.burst_max = burst;
            }
        }
        "--time-unit-ms" => {
            if let Ok(ms) = value.parse() {
                config.time_unit = Duration::from_millis(ms);
            }
        }
        "--seed" => {
            if let Ok(seed) = value.parse() {
                config.seed = Some(seed);
            }
        }
        _ => {}
    };

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--json" {
            json = true;
        } else if let Some((key, value)) = arg.split_once('=') {
            apply(key, value, &mut config);
        } else if let Some(value) = args.next() {
            apply(&arg, &value, &mut config);
        }
    }
    CliOptions { config, json }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let options = parse_cli_options();

    let simulation = Simulation::new(options.config);

    // First Ctrl+C drains the run early; the process exits once all
    // simulation threads have joined.
    let cancel = simulation.cancel_handle();
    ctrlc::set_handler(move || cancel.cancel())?;

    let report = simulation.run();

    if options.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    for completion in &report.completions {
        println!(
            "pid {:>4}: response {} ms, turnaround {} ms",
            completion.id, completion.response_ms, completion.turnaround_ms
        );
    }
    println!(
        "{} finished {}/{} processes in {} ms{}",
        report.policy,
        report.finished,
        report.created,
        report.elapsed_ms,
        if report.cancelled { " (cancelled)" } else { "" }
    );
    println!(
        "average response time = {:.1} ms, average turnaround time = {:.1} ms",
        report.avg_response_ms, report.avg_turnaround_ms
    );
    Ok(())
}
