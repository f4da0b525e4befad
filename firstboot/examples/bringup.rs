//! Bring-up example: configure every device in a testbed
//!
//! Loads a YAML testbed, fills in missing defaults, then runs the
//! first-boot console dialogs and, optionally, the SSH provision pass.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example bringup -- --testbed lab.yaml --workers 8 --provision
//! ```

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use firstboot::{AutofillPolicy, NetworkOpener, Phase, Provisioner, Topology};

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    // Initialize logging (set RUST_LOG=debug for every exchange)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    println!("Loading {}...", args.testbed.display());
    let topology = Topology::from_yaml_file(&args.testbed)?;
    println!("{} devices", topology.len());

    let (provisioner, filled) =
        Provisioner::prepare(topology, &AutofillPolicy::default(), NetworkOpener::default());
    let provisioner = provisioner.with_workers(args.workers);
    println!("Autofill set {} values", filled.len());

    if let Some(routes) = provisioner.routes() {
        for (label, subnet) in routes.iter() {
            println!("  {label}: {subnet}");
        }
    }

    let mut phases = vec![Phase::Initial];
    if args.provision {
        phases.push(Phase::Provision);
    }

    let mut failed = 0;
    for phase in phases {
        println!("\n{} phase", phase);
        println!("{}", "-".repeat(50));
        for report in provisioner.configure_all(phase).await {
            println!("{report}");
            if !report.status.is_success() && report.status != firstboot::DeviceStatus::Skipped {
                failed += 1;
            }
        }
    }

    println!("\nDone, {failed} failures");
    Ok(if failed == 0 { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

/// Simple argument parser (avoiding external dependencies)
struct Args {
    testbed: PathBuf,
    workers: usize,
    provision: bool,
}

impl Args {
    fn parse() -> Self {
        let args: Vec<String> = env::args().collect();
        let mut testbed = PathBuf::from("testbed.yaml");
        let mut workers = firstboot::pool::DEFAULT_WORKERS;
        let mut provision = false;

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--testbed" | "-t" => {
                    i += 1;
                    if i < args.len() {
                        testbed = PathBuf::from(&args[i]);
                    }
                }
                "--workers" | "-w" => {
                    i += 1;
                    if i < args.len() {
                        workers = args[i].parse().unwrap_or(workers);
                    }
                }
                "--provision" => provision = true,
                "--help" => {
                    println!(
                        "USAGE:\n    cargo run --example bringup -- [--testbed <PATH>] [--workers <N>] [--provision]"
                    );
                    std::process::exit(0);
                }
                _ => {
                    eprintln!("Unknown argument: {}", args[i]);
                }
            }
            i += 1;
        }

        Self {
            testbed,
            workers,
            provision,
        }
    }
}
