mod analysis;

use clap::{Parser, Subcommand};
use reviewscope_core::{LlmType, Locale};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use crate::analysis::{parse_sort_arg, SortArg};

#[derive(Debug, Parser)]
#[command(name = "reviewscope-cli")]
#[command(about = "Resolve products and discover review videos")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Print the input type of a raw input string
    Classify { input: String },
    /// Find or create the analysis for an input, then discover videos
    Analyze {
        input: String,
        #[arg(long)]
        locale: Option<Locale>,
        #[arg(long)]
        model: Option<LlmType>,
        /// Resolve the product name only
        #[arg(long)]
        skip_discovery: bool,
    },
    /// List stored video candidates for an analysis as JSON
    Videos {
        /// Raw input or resolved product name
        #[arg(long)]
        input: String,
        #[arg(long)]
        analysis_id: Uuid,
        #[arg(long)]
        locale: Option<Locale>,
        /// `field:dir`, e.g. `viewCount:desc`; repeatable
        #[arg(long, value_parser = parse_sort_arg)]
        sort: Vec<SortArg>,
    },
    /// Delete an analysis and its video candidates
    Forget { analysis_id: Uuid },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Check database connectivity
    Ping,
    /// Apply pending migrations
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let default_level =
        std::env::var("REVIEWSCOPE_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default_level))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("reviewscope-cli: run with --help for usage");
        return Ok(());
    };

    if let Commands::Classify { input } = &command {
        println!("{}", reviewscope_core::classify(input));
        return Ok(());
    }

    let config = reviewscope_core::load_app_config()?;
    let pool_config = reviewscope_db::PoolConfig::from_app_config(&config);
    let pool = reviewscope_db::connect_pool(&config.database_url, pool_config).await?;

    match command {
        Commands::Db { command } => match command {
            DbCommands::Ping => {
                reviewscope_db::health_check(&pool).await?;
                println!("database ok");
            }
            DbCommands::Migrate => {
                let applied = reviewscope_db::run_migrations(&pool).await?;
                println!("applied {applied} migrations");
            }
        },
        Commands::Classify { .. } => {}
        Commands::Analyze {
            input,
            locale,
            model,
            skip_discovery,
        } => {
            let service = reviewscope_pipeline::build_service(&config, pool)?;
            analysis::run_analyze(&service, input, locale, model, skip_discovery).await?;
        }
        Commands::Videos {
            input,
            analysis_id,
            locale,
            sort,
        } => {
            let service = reviewscope_pipeline::build_service(&config, pool)?;
            analysis::run_videos(&service, input, analysis_id, locale, &sort).await?;
        }
        Commands::Forget { analysis_id } => {
            let service = reviewscope_pipeline::build_service(&config, pool)?;
            analysis::run_forget(&service, analysis_id).await?;
        }
    }

    Ok(())
}
