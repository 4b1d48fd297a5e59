use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use fxgate::core::currency::ApiVersion;
use fxgate::core::log::init_logging;
use fxgate::core::metadata::CurrencyListingQuery;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Api {
    V1,
    V2,
}

impl From<Api> for ApiVersion {
    fn from(api: Api) -> ApiVersion {
        match api {
            Api::V1 => ApiVersion::V1,
            Api::V2 => ApiVersion::V2,
        }
    }
}

impl From<Commands> for fxgate::AppCommand {
    fn from(cmd: Commands) -> fxgate::AppCommand {
        match cmd {
            Commands::Convert { from, to, api } => fxgate::AppCommand::Convert {
                version: api.into(),
                from,
                to,
            },
            Commands::AccountInfo => fxgate::AppCommand::AccountInfo,
            Commands::Currencies {
                iso,
                obsolete,
                language,
                additional_info,
                crypto,
            } => fxgate::AppCommand::Currencies(CurrencyListingQuery {
                iso,
                obsolete,
                language,
                additional_info,
                crypto,
            }),
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Convert one unit of a currency into another
    Convert {
        /// Source currency code, e.g. USD
        #[arg(long)]
        from: String,
        /// Target currency code, e.g. EUR
        #[arg(long)]
        to: String,
        /// Upstream API version
        #[arg(long, value_enum, default_value_t = Api::V1)]
        api: Api,
    },
    /// Show the V2 provider account information
    AccountInfo,
    /// List currencies known to the V2 provider
    Currencies {
        /// Comma separated ISO codes to restrict the listing
        #[arg(long)]
        iso: Option<String>,
        /// Include obsolete currencies
        #[arg(long)]
        obsolete: bool,
        /// Language for currency names
        #[arg(long, default_value = "en")]
        language: String,
        /// Extra fields to request, forwarded as is
        #[arg(long)]
        additional_info: Option<String>,
        /// Include crypto currencies
        #[arg(long)]
        crypto: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => fxgate::setup::setup().map(|path| {
            println!("Created default configuration at {}", path.display());
        }),
        Some(cmd) => run(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}

async fn run(command: fxgate::AppCommand, config_path: Option<&str>) -> Result<()> {
    let envelope = fxgate::run_command(command, config_path).await?;
    println!("{}", serde_json::to_string_pretty(&envelope)?);

    if !envelope.is_success() {
        anyhow::bail!("Request failed with status {}", envelope.status());
    }
    Ok(())
}
