//! CLI tool to mint a development session token.
//!
//! Usage:
//!   cargo run --bin issue-token -- --user-id <uuid> --role teacher

use std::env;

use uuid::Uuid;

use school_records_lib::auth::SessionKeys;
use school_records_lib::config::Config;
use school_records_lib::models::Role;

fn main() {
    dotenvy::dotenv().ok();

    let args: Vec<String> = env::args().collect();

    let mut user_id: Option<String> = None;
    let mut role = "admin".to_string();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--user-id" | "-u" => {
                i += 1;
                if i < args.len() {
                    user_id = Some(args[i].clone());
                }
            }
            "--role" | "-r" => {
                i += 1;
                if i < args.len() {
                    role = args[i].clone();
                }
            }
            "--help" | "-h" => {
                print_usage();
                return;
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    let user_id = match user_id.as_deref().map(Uuid::parse_str) {
        Some(Ok(id)) => id,
        Some(Err(e)) => {
            eprintln!("Error: --user-id is not a valid UUID: {}", e);
            std::process::exit(1);
        }
        None => {
            eprintln!("Error: --user-id is required");
            print_usage();
            std::process::exit(1);
        }
    };

    let role = match Role::parse(&role) {
        Some(r) => r,
        None => {
            eprintln!(
                "Error: Invalid role '{}'. Must be: admin, teacher, student",
                role
            );
            std::process::exit(1);
        }
    };

    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            std::process::exit(1);
        }
    };

    let keys = SessionKeys::from_settings(&config.session);
    let token = match keys.issue(user_id, role) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("Error issuing token: {}", e);
            std::process::exit(1);
        }
    };

    println!();
    println!("  User:    {}", user_id);
    println!("  Role:    {}", role);
    println!("  Expires: in {}s", config.session.ttl_secs);
    println!();
    println!("  Token:   {}", token);
    println!();
}

fn print_usage() {
    eprintln!();
    eprintln!("Usage: issue-token --user-id <uuid> [--role <role>]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --user-id, -u  User id to put in the token (required)");
    eprintln!("  --role, -r     Role: admin, teacher, student (default: admin)");
    eprintln!("  --help, -h     Show this help");
    eprintln!();
}
