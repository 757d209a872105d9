//! acct - keep several logins of one CLI tool and swap the live one
//!
//! # Usage
//!
//! ```bash
//! # Save whoever is logged in right now
//! acct save
//!
//! # Swap to the second saved account
//! acct switch 2 --pretty
//!
//! # Inspect masked tokens and resolved identities
//! acct debug --pretty
//! ```

use acct_cli::{Cli, render, render_error, run};

use std::process::ExitCode;

use clap::Parser;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(&cli).await.and_then(|value| render(&value, cli.pretty)) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}", render_error(&e));
            ExitCode::FAILURE
        }
    }
}
