mod menu;

use common::config::{load_config, ExperimentConfig};
use common::metrics::TickRecord;

const DEFAULT_CONFIG: &str = "configs/damper_baseline.toml";

fn main() {
    println!("===========================================");
    println!("Welcome to the Attitude Wobble Damper Testbed");
    println!("===========================================");

    loop {
        menu::show_menu();

        match menu::get_user_choice() {
            Ok(1) => run_threaded_demo(),
            Ok(2) => run_async_demo(),
            Ok(3) => run_benchmark_comparison(),
            Ok(4) => run_realtime_dashboard(),
            Ok(5) => {
                println!("Goodbye!");
                break;
            }
            _ => println!("Invalid choice. Please select 1-5."),
        }
    }
}

fn describe_config(config: &ExperimentConfig) {
    println!(
        "Configuration: {} mode, {}ms physics period, {} seconds duration",
        config.mode, config.physics_period_ms, config.duration_secs
    );
    if config.damper.plus_enabled {
        println!(
            "Damper tunables: min response limit {:.2}, min clamp {:.2}, rate threshold {:.2} rad/s",
            config.damper.min_response_limit, config.damper.min_clamp, config.damper.threshold
        );
    } else {
        println!("Damper: fixed parameters (tuning gate disabled)");
    }
}

fn run_threaded_demo() {
    println!("\n=== Running Threaded Implementation Demo ===");

    let mut config = load_config(DEFAULT_CONFIG).expect("Failed to load config");
    config.enable_logging = true; // Enable logging for demo
    describe_config(&config);

    let recorder = threaded_impl::run_experiment(config);
    display_results(&recorder.get_results());

    menu::wait_for_enter();
}

fn run_async_demo() {
    println!("\n=== Running Async Implementation Demo ===");

    let mut config = load_config(DEFAULT_CONFIG).expect("Failed to load config");
    config.enable_logging = true; // Enable logging for demo
    describe_config(&config);

    let rt = tokio::runtime::Runtime::new().unwrap();
    let recorder = rt.block_on(async_impl::run_experiment(config));
    display_results(&recorder.get_results());

    menu::wait_for_enter();
}

fn run_benchmark_comparison() {
    println!("\n=== Running Benchmark Comparison (Async vs Threaded) ===");

    let mut config = load_config(DEFAULT_CONFIG).expect("Failed to load config");
    config.enable_logging = false; // Disable logging for valid benchmarks

    println!("Benchmark Configuration:");
    println!("- Config: {}", DEFAULT_CONFIG);
    println!("- Duration: {} seconds", config.duration_secs);
    println!("- Physics period: {} ms", config.physics_period_ms);
    println!("- Logging disabled for methodological validity");

    println!("\n--- Running THREADED Implementation ---");
    let threaded_start = std::time::Instant::now();
    let threaded_recorder = threaded_impl::run_experiment(config.clone());
    let threaded_duration = threaded_start.elapsed();
    let threaded_results = threaded_recorder.get_results();
    summarize_run("Threaded", &threaded_results, threaded_duration);

    println!("\n--- Running ASYNC Implementation ---");
    let async_start = std::time::Instant::now();
    let rt = tokio::runtime::Runtime::new().unwrap();
    let async_recorder = rt.block_on(async_impl::run_experiment(config.clone()));
    let async_duration = async_start.elapsed();
    let async_results = async_recorder.get_results();
    summarize_run("Async", &async_results, async_duration);

    println!("\n=== Benchmark Comparison Summary ===");
    println!(
        "- Threaded: {} ticks, final response limit {:.2}",
        threaded_results.len(),
        threaded_results.last().map_or(1.0, |r| r.response_limit)
    );
    println!(
        "- Async: {} ticks, final response limit {:.2}",
        async_results.len(),
        async_results.last().map_or(1.0, |r| r.response_limit)
    );

    menu::wait_for_enter();
}

fn summarize_run(name: &str, results: &[TickRecord], duration: std::time::Duration) {
    let damped = results.iter().filter(|r| r.damped).count();
    println!("{} Results:", name);
    println!("- Execution time: {:.2}s", duration.as_secs_f64());
    println!("- Total ticks: {}", results.len());
    if !results.is_empty() {
        println!(
            "- Damped ticks: {} ({:.1}%)",
            damped,
            damped as f64 / results.len() as f64 * 100.0
        );
    }
}

fn run_realtime_dashboard() {
    println!("\n=== Launching Real-Time Dashboard ===");
    println!("Note: Close the GUI window to return to menu");

    // Launch the visualiser as a subprocess; it owns the GUI event loop.
    match std::process::Command::new("cargo")
        .args(["run", "--release", "--bin", "visualiser", DEFAULT_CONFIG, "threaded"])
        .status()
    {
        Ok(status) if status.success() => {
            println!("Dashboard closed successfully.");
        }
        Ok(status) => {
            println!("Dashboard exited with status: {}", status);
        }
        Err(e) => {
            println!("Failed to launch dashboard: {}", e);
            println!("Make sure you have the visualiser binary available.");
        }
    }

    menu::wait_for_enter();
}

fn display_results(results: &[TickRecord]) {
    if results.is_empty() {
        println!("No results to display.");
        return;
    }

    let total = results.len();
    let damped = results.iter().filter(|r| r.damped).count();
    let max_error = results
        .iter()
        .map(|r| r.error_angle_deg)
        .fold(f64::NEG_INFINITY, f64::max);
    let min_response = results
        .iter()
        .map(|r| r.response_limit)
        .fold(f64::INFINITY, f64::min);
    let last = results.last().unwrap();

    println!("\n=== Experiment Results ===");
    println!("Total ticks: {}", total);
    println!(
        "Damped ticks: {} ({:.1}%)",
        damped,
        damped as f64 / total as f64 * 100.0
    );
    println!("Max error angle: {:.2} deg", max_error);
    println!(
        "Response limit: final {:.2}, min reached {:.2}",
        last.response_limit, min_response
    );
    println!("Clamp factor: final {:.2}", last.clamp_factor);
}
