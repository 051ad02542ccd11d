use std::env;

use common::config::{load_config, ExperimentConfig};
use common::metrics::TickRecord;
use criterion::{black_box, Criterion};

fn analyze_results_detailed(results: &[TickRecord], config: &ExperimentConfig, name: &str) {
    if results.is_empty() {
        println!("{}: No results to analyze", name);
        return;
    }

    let total = results.len();
    let damped = results.iter().filter(|r| r.damped).count();
    let damped_rate = damped as f64 / total as f64 * 100.0;

    let min_response = results
        .iter()
        .map(|r| r.response_limit)
        .fold(f64::INFINITY, f64::min);
    let first_damped = results.iter().find(|r| r.damped).map(|r| r.tick_id);
    let max_error = results
        .iter()
        .map(|r| r.error_angle_deg)
        .fold(f64::NEG_INFINITY, f64::max);

    let bounds_violations = results
        .iter()
        .filter(|r| {
            !(config.damper.min_response_limit..=1.0).contains(&r.response_limit)
                || !(config.damper.min_clamp..=1.0).contains(&r.clamp_factor)
        })
        .count();

    let latenesses: Vec<f64> = results
        .iter()
        .map(|r| r.lateness_ns as f64 / 1000.0) // Convert to μs
        .collect();
    let avg_lateness = latenesses.iter().sum::<f64>() / latenesses.len() as f64;
    let max_lateness = latenesses.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b));

    let last = results.last().unwrap();

    println!("\n=== {} Detailed Analysis ===", name);
    println!("Total ticks: {}", total);
    println!("Damped ticks: {} ({:.1}%)", damped, damped_rate);
    match first_damped {
        Some(tick) => println!("First damped tick: {}", tick),
        None => println!("First damped tick: never"),
    }
    println!("Max error angle: {:.2} deg", max_error);
    println!(
        "Response limit: final {:.2}, min reached {:.2} (floor {:.2})",
        last.response_limit, min_response, config.damper.min_response_limit
    );
    println!(
        "Clamp factor: final {:.2} (floor {:.2})",
        last.clamp_factor, config.damper.min_clamp
    );
    println!("Bound violations: {}", bounds_violations);
    println!(
        "Tick lateness (μs): avg={:.2}, max={:.2}",
        avg_lateness, max_lateness
    );
}

fn benchmark_threaded(c: &mut Criterion, config: &ExperimentConfig) {
    let config = config.clone();
    c.bench_function("threaded_experiment", |b| {
        b.iter(|| {
            let recorder = threaded_impl::run_experiment(black_box(config.clone()));
            black_box(recorder.get_results());
        });
    });
}

fn benchmark_async(c: &mut Criterion, config: &ExperimentConfig) {
    let config = config.clone();
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("async_experiment", |b| {
        b.iter(|| {
            let recorder = rt.block_on(async_impl::run_experiment(black_box(config.clone())));
            black_box(recorder.get_results());
        });
    });
}

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: benchmark_runner <config_file> [threaded|async|both] [--criterion]");
        eprintln!("Example: benchmark_runner configs/damper_baseline.toml both");
        eprintln!("Example: benchmark_runner configs/damper_baseline.toml both --criterion");
        std::process::exit(1);
    }

    let config_path = &args[1];
    let mode = args.get(2).map(|s| s.as_str()).unwrap_or("both");
    let use_criterion = args.contains(&"--criterion".to_string());

    let mut config = load_config(config_path).expect("Failed to load config");

    // Disable logging during Criterion benchmarks for methodological validity
    if use_criterion {
        config.enable_logging = false;
    }

    println!("========================================");
    println!("Attitude Wobble Damper Benchmark");
    println!("========================================");
    println!("Config: {}", config_path);
    println!("Experiment: {}", config.experiment_name);
    println!("Duration: {} seconds", config.duration_secs);
    println!("Physics period: {} ms", config.physics_period_ms);
    println!("Frame period: {} ms", config.frame_period_ms);
    if use_criterion {
        println!("Using Criterion for statistical analysis");
        println!("Logging disabled for benchmark validity");
    }
    println!("========================================\n");

    if use_criterion {
        let mut criterion = Criterion::default()
            .sample_size(10)
            .measurement_time(std::time::Duration::from_secs(30));

        if mode == "threaded" || mode == "both" {
            println!("Running THREADED statistical benchmarks...");
            benchmark_threaded(&mut criterion, &config);
        }

        if mode == "async" || mode == "both" {
            println!("\nRunning ASYNC statistical benchmarks...");
            benchmark_async(&mut criterion, &config);
        }

        println!("\n========================================");
        println!("Criterion statistical analysis complete!");
        println!("Check the target/criterion directory for detailed HTML reports.");
        println!("========================================");
    } else {
        if mode == "threaded" || mode == "both" {
            println!("Running THREADED experiment...");
            let start = std::time::Instant::now();
            let recorder = threaded_impl::run_experiment(config.clone());
            let elapsed = start.elapsed();

            println!(
                "Threaded experiment completed in {:.2} seconds",
                elapsed.as_secs_f64()
            );

            let results = recorder.get_results();
            analyze_results_detailed(&results, &config, "THREADED");

            recorder
                .save_to_csv("threaded_results.csv")
                .expect("Failed to save threaded CSV");
            println!("Results saved to threaded_results.csv");
        }

        if mode == "async" || mode == "both" {
            println!("\nRunning ASYNC experiment...");
            let start = std::time::Instant::now();
            let recorder = tokio::runtime::Runtime::new()
                .unwrap()
                .block_on(async_impl::run_experiment(config.clone()));
            let elapsed = start.elapsed();

            println!(
                "Async experiment completed in {:.2} seconds",
                elapsed.as_secs_f64()
            );

            let results = recorder.get_results();
            analyze_results_detailed(&results, &config, "ASYNC");

            recorder
                .save_to_csv("async_results.csv")
                .expect("Failed to save async CSV");
            println!("Results saved to async_results.csv");
        }

        println!("\n========================================");
        println!("Benchmark complete!");
        println!("========================================");
    }
}
