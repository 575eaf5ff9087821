//! Ignite CLI - Replay notification and deep-link scenarios headlessly
//!
//! Each scenario line is one JSON step applied to the client core, wired
//! against the local push provider, URI opener and tag transport.
//!
//! # Usage
//!
//! ```bash
//! # Build the CLI binary
//! cargo build --features cli --bin ignite-cli
//!
//! # Replay a scenario file
//! ./target/debug/ignite-cli demos/banner.jsonl
//!
//! # JSON output for scripting
//! ./target/debug/ignite-cli demos/banner.jsonl --json | jq .
//!
//! # Pipe steps on stdin
//! echo '{"type":"open_url","uri":"igniteGym://home"}' | ./target/debug/ignite-cli
//! ```
//!
//! # Features
//!
//! This binary requires the `cli` feature flag.

use anyhow::Result;
use clap::Parser;

use ignite_gym_lib::cli::{initialize, run_scenario, Args};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Read input before wiring anything, so a missing file fails fast
    let source = args.read_scenario().await?;

    let ctx = initialize(&args).await?;
    let result = run_scenario(&ctx, &source).await;

    if let Ok(applied) = &result {
        if args.verbose {
            eprintln!("[scenario] {} step(s) applied", applied);
        }
    }

    // Graceful shutdown
    ctx.shutdown().await?;

    result.map(|_| ())
}
