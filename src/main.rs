use std::error::Error;
use std::sync::Arc;

use clap::Parser;
use env_logger;

use food_desert_dashboard::cli::Cli;
use food_desert_dashboard::server;
use food_desert_dashboard::{Dashboard, DashboardConfig};


#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let cli = Cli::parse();

    // everything is loaded up front; a bad data file stops us here
    let config = DashboardConfig::from_file(&cli.config)?;
    let dashboard = Dashboard::from_config(&config)?;

    let addr = cli.listen_addr().await?;
    server::serve(Arc::new(dashboard), addr).await?;
    Ok(())
}
