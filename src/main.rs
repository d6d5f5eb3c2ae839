//! settlement-engine CLI
//!
//! Run settlement scenarios from the command line.
//!
//! # Usage
//!
//! ```bash
//! # Execute a scenario file
//! settlement-engine run --input scenario.json
//!
//! # Output as JSON
//! settlement-engine run --input scenario.json --format json
//!
//! # Generate a random payout scenario
//! settlement-engine generate --recipients 25 --asset USDC
//!
//! # Price a purchase
//! settlement-engine quote --price 0.25 --amount 40
//! ```

use settlement_engine::core::asset::AssetId;
use settlement_engine::core::units::{format_units, parse_units};
use settlement_engine::settlement::crowdsale::purchase_cost;
use settlement_engine::simulation::generator::{generate_payout_scenario, PayoutConfig};
use settlement_engine::simulation::scenario::Scenario;
use std::fs;
use std::process;

fn print_usage() {
    eprintln!(
        r#"settlement-engine: atomic batch payouts and token-purchase settlement

USAGE:
    settlement-engine <COMMAND> [OPTIONS]

COMMANDS:
    run         Execute a scenario file step by step
    generate    Generate a random payout scenario (for testing)
    quote       Compute the cost of a token purchase
    help        Show this message

OPTIONS (run):
    --input <FILE>      Path to JSON scenario file
    --format <FORMAT>   Output format: text (default) or json

OPTIONS (generate):
    --recipients <N>    Number of payout recipients (default: 10)
    --asset <ASSET>     "native" (default) or a token address
    --output <FILE>     Write to file instead of stdout

OPTIONS (quote):
    --price <UNITS>     Price of one whole token
    --amount <UNITS>    Number of tokens to buy

Logging is controlled by RUST_LOG (e.g. RUST_LOG=settlement_engine=debug).

EXAMPLES:
    settlement-engine run --input payroll.json
    settlement-engine run --input sale.json --format json
    settlement-engine generate --recipients 100 --output payroll.json
    settlement-engine quote --price 0.5 --amount 12"#
    );
}

fn required_value(args: &[String], i: usize, flag: &str, what: &str) -> String {
    args.get(i).cloned().unwrap_or_else(|| {
        eprintln!("{} requires {}", flag, what);
        process::exit(1);
    })
}

fn cmd_run(args: &[String]) {
    let mut input_path = None;
    let mut format = "text".to_string();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--input" => {
                i += 1;
                input_path = Some(required_value(args, i, "--input", "a file path"));
            }
            "--format" => {
                i += 1;
                format = required_value(args, i, "--format", "'text' or 'json'");
            }
            _ => {
                eprintln!("Unknown option: {}", args[i]);
                process::exit(1);
            }
        }
        i += 1;
    }

    let path = input_path.unwrap_or_else(|| {
        eprintln!("Error: --input <FILE> is required");
        process::exit(1);
    });

    let scenario = Scenario::load(&path).unwrap_or_else(|e| {
        eprintln!("Error loading '{}': {}", path, e);
        process::exit(1);
    });

    let (_, report) = scenario.run().unwrap_or_else(|e| {
        eprintln!("Error running '{}': {}", path, e);
        process::exit(1);
    });

    if format == "json" {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error serializing report: {}", e);
                process::exit(1);
            }
        }
    } else {
        print!("{}", report);
    }

    if report.failed() > 0 {
        process::exit(2);
    }
}

fn cmd_generate(args: &[String]) {
    let mut config = PayoutConfig::default();
    let mut output_path: Option<String> = None;
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--recipients" => {
                i += 1;
                config.recipients = args
                    .get(i)
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_else(|| {
                        eprintln!("--recipients requires a number");
                        process::exit(1);
                    });
            }
            "--asset" => {
                i += 1;
                let text = required_value(args, i, "--asset", "'native' or a token address");
                config.asset = text.parse::<AssetId>().unwrap_or_else(|e| {
                    eprintln!("Invalid asset '{}': {}", text, e);
                    process::exit(1);
                });
            }
            "--output" => {
                i += 1;
                output_path = Some(required_value(args, i, "--output", "a file path"));
            }
            _ => {
                eprintln!("Unknown option: {}", args[i]);
                process::exit(1);
            }
        }
        i += 1;
    }

    let scenario = generate_payout_scenario(&config);
    let json = serde_json::to_string_pretty(&scenario).unwrap_or_else(|e| {
        eprintln!("Error serializing scenario: {}", e);
        process::exit(1);
    });

    if let Some(path) = output_path {
        fs::write(&path, &json).unwrap_or_else(|e| {
            eprintln!("Error writing to '{}': {}", path, e);
            process::exit(1);
        });
        eprintln!(
            "Generated payout of {} to {} recipients → {}",
            config.asset, config.recipients, path
        );
    } else {
        println!("{}", json);
    }
}

fn cmd_quote(args: &[String]) {
    let mut price = None;
    let mut amount = None;
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--price" | "--amount" => {
                let flag = args[i].clone();
                i += 1;
                let text = required_value(args, i, &flag, "a decimal amount");
                let parsed = parse_units(&text).unwrap_or_else(|e| {
                    eprintln!("Invalid {} '{}': {}", flag, text, e);
                    process::exit(1);
                });
                if flag == "--price" {
                    price = Some(parsed);
                } else {
                    amount = Some(parsed);
                }
            }
            _ => {
                eprintln!("Unknown option: {}", args[i]);
                process::exit(1);
            }
        }
        i += 1;
    }

    let (price, amount) = match (price, amount) {
        (Some(p), Some(a)) => (p, a),
        _ => {
            eprintln!("Error: --price and --amount are required");
            process::exit(1);
        }
    };

    match purchase_cost(amount, price) {
        Ok(cost) => println!(
            "{} tokens at {} each cost {}",
            format_units(amount),
            format_units(price),
            format_units(cost)
        ),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let command = args[1].as_str();
    let rest = &args[2..];

    match command {
        "run" => cmd_run(rest),
        "generate" => cmd_generate(rest),
        "quote" => cmd_quote(rest),
        "help" | "--help" | "-h" => print_usage(),
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
            process::exit(1);
        }
    }
}
