use anyhow::Result;
use clap::Parser;
use investor_scout::cli::{self, Args};
use investor_scout::generator::workflow::launch;
use tracing::error;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    cli::init_tracing(args.verbose, args.log_format);

    let config = args.into_config().inspect_err(|e| error!(error = %e, "invalid configuration"))?;

    println!("🔎 Researching {} investors in {}", config.target_industry, config.region());
    let report = launch(&config)
        .await
        .inspect_err(|e| error!(error = %e, "run aborted"))?;

    println!("\n📊 Run summary\n{}", report.summary());
    println!("⏱️ {}", report.timing_report);

    Ok(())
}
