//! TAP escrow simulator.
//!
//! Replays a JSON script of escrow operations against an in-memory token and collection
//! sink, then prints the event log, the collateral accounts and the token balances as
//! JSON on stdout.
//!
//! The simulator signs every proof and voucher itself from the named keys in the script,
//! unless a step carries an explicit hex signature.
//!
//! Environment:
//! - `.env` values loaded at startup
//! - `CONFIG`, `SCRIPT` select the configuration and script files
//! - `RUST_LOG` controls log verbosity (logs go to stderr)
//! - `OTEL_*` variables enable span export over OTLP

mod config;
mod run;
mod script;
mod telemetry;

use std::process;

use crate::run::run;

#[tokio::main]
async fn main() {
    let result = run().await;
    if let Err(e) = result {
        eprintln!("{e}");
        process::exit(1)
    }
}
