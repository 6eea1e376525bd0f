use clap::{Parser, Subcommand};

use threeleg::cli::authorize::{resolve_timeout, run_authorize, AuthorizeOptions};
use threeleg::cli::output::{print_error, OutputMode};
use threeleg::cli::provider::ProviderOptions;
use threeleg::cli::request::{run_get, run_sign};
use threeleg::cli::status::{run_logout, run_status};

#[derive(Parser)]
#[command(name = "threeleg", version, about = "Three-legged OAuth 1.0a client: authorize, sign and call APIs")]
struct Cli {
    /// Config file to load before the default locations
    #[arg(long, global = true)]
    config: Option<String>,

    /// JSON output
    #[arg(long, global = true)]
    json: bool,

    /// Permit cleartext http:// endpoints
    #[arg(long, global = true)]
    allow_http: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the authorization flow for a provider and store the token
    Authorize {
        /// Provider name from the config file
        provider: String,

        /// OAuth timeout in milliseconds
        #[arg(long, env = "THREELEG_OAUTH_TIMEOUT_MS")]
        oauth_timeout: Option<u64>,

        /// Print the authorize URL instead of opening a browser
        #[arg(long)]
        no_browser: bool,

        /// Redirect URL already obtained from the provider
        #[arg(long)]
        redirect_url: Option<String>,
    },

    /// Authenticated GET; prints the response body
    Get {
        provider: String,
        url: String,
    },

    /// Print the Authorization header for an authenticated GET
    Sign {
        provider: String,
        url: String,
    },

    /// Show whether token credentials are stored
    Status { provider: String },

    /// Remove stored token credentials
    Logout { provider: String },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("THREELEG_LOG_LEVEL")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mode = OutputMode::from_flag(cli.json);

    if let Err(e) = run(cli, mode).await {
        print_error(&e, mode);
        std::process::exit(1);
    }
}

async fn run(cli: Cli, mode: OutputMode) -> Result<(), threeleg::ThreelegError> {
    let options = ProviderOptions {
        config_path: cli.config,
        allow_http: cli.allow_http,
    };

    match cli.command {
        Commands::Authorize {
            provider,
            oauth_timeout,
            no_browser,
            redirect_url,
        } => {
            let authorize = AuthorizeOptions {
                timeout: resolve_timeout(oauth_timeout),
                open_browser: !no_browser,
                redirect_url,
            };
            run_authorize(&provider, &options, &authorize, mode).await
        }
        Commands::Get { provider, url } => run_get(&provider, &url, &options, mode).await,
        Commands::Sign { provider, url } => run_sign(&provider, &url, &options, mode),
        Commands::Status { provider } => run_status(&provider, &options, mode),
        Commands::Logout { provider } => run_logout(&provider, &options, mode),
    }
}
