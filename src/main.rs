use clap::Parser;

use fusionlink::cli::{self, Cli};
use fusionlink::init_logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging()?;
    let cli = Cli::parse();
    cli::run(cli).await
}
