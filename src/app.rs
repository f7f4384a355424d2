use crate::cli::{Cli, Commands};
use anyhow::{Context, Result};
use ffplan::config::Config;
use ffplan::engine::{self, InvocationPlan, batch};
use std::path::{Path, PathBuf};
use std::process;

fn load_config() -> Config {
    Config::load().unwrap_or_else(|e| {
        eprintln!("Warning: {:#}. Using built-in defaults.", e);
        Config::default()
    })
}

pub fn run(cli: Cli) {
    match cli.command {
        Commands::Plan { job, json } => handle_plan(&job, json),
        Commands::Batch {
            directory,
            json,
            workers,
        } => handle_batch(directory, json, workers),
        Commands::InitConfig => handle_init_config(),
    }
}

fn print_plans(plans: &[InvocationPlan]) {
    for (i, plan) in plans.iter().enumerate() {
        let abort = if plan.abort_on_failure {
            " (abort on failure)"
        } else {
            ""
        };
        println!("# {}. {}{}", i + 1, plan.name, abort);
        println!("{}", plan.display());
    }
}

#[cfg(feature = "dev-logging")]
fn log_plans(plans: &[InvocationPlan]) {
    for plan in plans {
        let _ = engine::write_debug_log(&format!("{}: {}", plan.name, plan.display()));
    }
}

#[cfg(not(feature = "dev-logging"))]
fn log_plans(_plans: &[InvocationPlan]) {}

fn compile_job_file(path: &Path, config: &Config) -> Result<Vec<InvocationPlan>> {
    let mut job = engine::load_job(path)?;
    config.fill_defaults(&mut job.options);

    let plans = engine::build_plans(&job.options, job.side_data.as_ref(), &config.null_sink())
        .with_context(|| format!("Failed to plan {}", path.display()))?;
    log_plans(&plans);
    Ok(plans)
}

fn handle_plan(job: &Path, json: bool) {
    let config = load_config();

    match compile_job_file(job, &config) {
        Ok(plans) => {
            if json || config.defaults.json {
                match serde_json::to_string_pretty(&plans) {
                    Ok(text) => println!("{}", text),
                    Err(e) => {
                        eprintln!("Error: {:#}", e);
                        process::exit(1);
                    }
                }
            } else if plans.is_empty() {
                println!("Nothing to do: no rate-control mode selected");
            } else {
                print_plans(&plans);
            }
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}

fn handle_batch(directory: Option<PathBuf>, json: bool, workers: Option<u32>) {
    let dir = directory.unwrap_or_else(|| {
        std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
    });
    let config = load_config();

    let files = match engine::scan(&dir) {
        Ok(files) => files,
        Err(e) => {
            eprintln!("Error scanning directory: {:#}", e);
            process::exit(1);
        }
    };

    let mut queue = Vec::new();
    let mut load_failures = 0usize;
    for path in files {
        match engine::load_job(&path) {
            Ok(mut job) => {
                config.fill_defaults(&mut job.options);
                queue.push(batch::QueuedJob::new(path, job));
            }
            Err(e) => {
                eprintln!("Skipping: {:#}", e);
                load_failures += 1;
            }
        }
    }

    let max_workers = workers.unwrap_or(config.defaults.max_workers) as usize;
    let reports = batch::compile_batch(&queue, &config.null_sink(), max_workers);
    for report in &reports {
        log_plans(&report.plans);
    }
    let rejected = reports.iter().filter(|r| !r.is_ok()).count();

    if json || config.defaults.json {
        match serde_json::to_string_pretty(&reports) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("Error: {:#}", e);
                process::exit(1);
            }
        }
    } else {
        for report in &reports {
            println!("== {} [{}]", report.job_path.display(), report.job_id);
            match &report.error {
                Some(error) => println!("rejected: {}", error),
                None if report.plans.is_empty() => println!("nothing to do"),
                None => print_plans(&report.plans),
            }
        }
        println!(
            "Total jobs: {} ({} rejected, {} unreadable)",
            reports.len() + load_failures,
            rejected,
            load_failures
        );
    }

    if rejected > 0 || load_failures > 0 {
        process::exit(1);
    }
}

fn handle_init_config() {
    match Config::config_path() {
        Ok(path) if path.exists() => match Config::load_from(&path) {
            Ok(cfg) => {
                println!("Config loaded successfully from {}", path.display());
                println!("{:#?}", cfg);
            }
            Err(e) => {
                eprintln!("Config invalid: {:#}", e);
                process::exit(1);
            }
        },
        Ok(path) => {
            println!("Creating default config...");
            if let Err(err) = Config::ensure_default() {
                eprintln!("Failed to save default config: {:#}", err);
                process::exit(1);
            }
            println!("Default config saved to {}", path.display());
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}
