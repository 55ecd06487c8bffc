//! Verifies that the documented ports, credentials and file locations match
//! what the compose files declare.
//!
//! Usage:
//!   stack-check                       # check every known stack under .
//!   stack-check --stack rust          # check one stack
//!   stack-check --root ../hackathon --strict

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use storefront_core::stack::{check_frontends, check_stack, StackContract, StackReport};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "stack-check", about = "Check compose files against the documented stack")]
struct Args {
    /// Repository root containing the compose files
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Stack to check (php, python, rust); repeatable, defaults to all
    #[arg(long = "stack")]
    stacks: Vec<String>,

    /// Also check the frontend boilerplate directories
    #[arg(long)]
    frontends: bool,

    /// Treat warnings as failures
    #[arg(long)]
    strict: bool,
}

fn print_report(report: &StackReport, strict: bool) -> bool {
    let passed = report.passed(strict);
    println!("{}: {}", report.stack, if passed { "ok" } else { "FAILED" });
    for finding in &report.findings {
        println!("  {}", finding);
    }
    passed
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let contract = StackContract::hackathon();

    let stacks = if args.stacks.is_empty() {
        contract.stacks.clone()
    } else {
        let mut selected = Vec::with_capacity(args.stacks.len());
        for name in &args.stacks {
            match contract.stack(name) {
                Some(stack) => selected.push(stack.clone()),
                None => {
                    let known: Vec<&str> = contract.stacks.iter().map(|s| s.name.as_str()).collect();
                    eprintln!("unknown stack '{}' (known: {})", name, known.join(", "));
                    return ExitCode::from(2);
                }
            }
        }
        selected
    };

    let mut all_passed = true;
    for stack in &stacks {
        let report = check_stack(&args.root, stack, &contract);
        all_passed &= print_report(&report, args.strict);
    }
    if args.frontends {
        let report = check_frontends(&args.root, &contract);
        all_passed &= print_report(&report, args.strict);
    }

    if all_passed {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
