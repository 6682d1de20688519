use clap::{Args, Parser, Subcommand};
use servicelog_relay::{
    cmd::{CheckConfigArgs, check_config},
    context::AppContextBuilder,
    supervisor::Supervisor,
};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Runs the webhook receivers until terminated.
    Run(RunArgs),
    /// Validates the configuration and definition files, then exits.
    CheckConfig(CheckConfigArgs),
}

#[derive(Args)]
struct RunArgs {
    /// Directory holding `app.yaml` and the definition files.
    #[arg(short, long)]
    config_dir: Option<String>,

    /// Overrides `database_url` from the configuration.
    #[arg(long)]
    database_url: Option<String>,
}

#[tokio::main]
#[tracing::instrument(level = "info")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing subscriber
    let subscriber =
        FmtSubscriber::builder().with_env_filter(EnvFilter::from_default_env()).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => run_supervisor(args).await?,
        Commands::CheckConfig(args) => {
            check_config::execute(&args)?;
        }
    }

    Ok(())
}

async fn run_supervisor(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut builder = AppContextBuilder::new(args.config_dir);
    if let Some(url) = args.database_url {
        builder = builder.database_url(url);
    }
    let context = builder.build().await?;
    tracing::info!(namespace = %context.config.namespace, cluster_id = %context.config.cluster_id, "Application context initialized.");

    let supervisor = Supervisor::builder()
        .config(context.config)
        .store(context.store)
        .sender(context.sender)
        .template_service(context.template_service)
        .app_metrics(context.metrics)
        .build()?;

    tracing::info!("Supervisor initialized, starting webhook receivers...");

    supervisor.run().await?;

    Ok(())
}
