use clap::Parser;

use pubsub_subscriber::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    pubsub_observability::init_with(cli.log_format);

    pubsub_subscriber::run(cli).await
}
