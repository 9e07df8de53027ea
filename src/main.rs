use clap::{
    CommandFactory, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};

use streamlib::{cli, config, error};

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .usage(AnsiColor::White.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightBlue.on_default())
        .placeholder(AnsiColor::BrightGreen.on_default())
}

#[derive(Parser, Debug, Clone)]
#[clap(
  version = env!("CARGO_PKG_VERSION"),
  name=env!("CARGO_PKG_NAME"),
  bin_name=env!("CARGO_PKG_NAME"),
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
)]
struct Cli {
    /// Paste the redirect URI instead of running the local callback listener
    #[clap(long, global = true)]
    manual: bool,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Authorize with Spotify API
    Auth(AuthOptions),

    /// Print a valid access token
    Token,

    /// List cached credentials
    Cache,

    /// Show songs by id
    Track(TrackOptions),

    /// List songs saved in your library
    Saved(SavedOptions),

    /// Save songs to your library
    Save(TrackOptions),

    /// Get shell completions
    Completions(CompletionsOption),
}

#[derive(Parser, Debug, Clone)]
pub struct AuthOptions {
    /// Log in again even if a cached credential exists
    #[clap(long)]
    pub no_cache: bool,

    /// Do not write the credential to the cache
    #[clap(long)]
    pub no_update: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct TrackOptions {
    /// Spotify song ids
    #[clap(required = true, num_args = 1..)]
    pub ids: Vec<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct SavedOptions {
    /// Filter by song, album or artist name
    #[clap(long)]
    pub search: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

#[tokio::main]
async fn main() {
    if let Err(e) = config::load_env().await {
        error!("Cannot load environment. Err: {}", e);
    }

    let cli = Cli::parse();

    match cli.command {
        Command::Auth(opt) => cli::auth(cli.manual, !opt.no_cache, !opt.no_update).await,
        Command::Token => cli::token(cli.manual).await,
        Command::Cache => cli::cache().await,
        Command::Track(opt) => cli::track(opt.ids, cli.manual).await,
        Command::Saved(opt) => cli::saved(opt.search, cli.manual).await,
        Command::Save(opt) => cli::save(opt.ids, cli.manual).await,
        Command::Completions(opt) => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(opt.shell, &mut cmd, name, &mut std::io::stdout())
        }
    }
}
