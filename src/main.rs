//! otelagg entry point.

use otel_metrics_sdk::cli::{self, Cli};
use otel_metrics_sdk::core::Result;

fn main() -> Result<()> {
    let cli = Cli::parse_args();
    cli::execute(cli)
}
