//! Ludus Control - CLI client for the Ludus rewards daemon
//!
//! Submits completions, manages replay unlocks, and inspects progress,
//! wallets, and leaderboards over the daemon's HTTP API.

mod client;
mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "ludusctl")]
#[command(about = "Ludus - Game progression and rewards ledger", long_about = None)]
#[command(version)]
struct Cli {
    /// Daemon base URL
    #[arg(long, global = true, default_value = "http://127.0.0.1:7440")]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show daemon health
    Health,

    /// Show a learner's progress on one game
    Progress { learner: String, game: String },

    /// Show a learner's progress across games
    Batch {
        learner: String,

        /// Only games whose id starts with this category prefix
        #[arg(long)]
        category: Option<String>,
    },

    /// Show a learner's wallet and recent transactions
    Wallet { learner: String },

    /// Show the leaderboard for a period (daily, weekly, monthly, all-time)
    Leaderboard { period: String },

    /// Submit a game completion
    Complete {
        learner: String,
        game: String,

        /// Coins-equivalent performance achieved in the run
        #[arg(long)]
        score: u64,

        /// The run covered every level
        #[arg(long)]
        full: bool,

        /// Seconds spent in the run
        #[arg(long, default_value_t = 0)]
        time: u64,

        /// Mark the submission as a replay
        #[arg(long)]
        replay: bool,

        /// Idempotency key for safe retries
        #[arg(long)]
        key: Option<String>,
    },

    /// Purchase a replay of a fully-completed game
    UnlockReplay { learner: String, game: String },

    /// Create or update a learner profile
    SetLearner {
        learner: String,

        #[arg(long)]
        name: Option<String>,

        /// Birth date, YYYY-MM-DD
        #[arg(long)]
        dob: Option<String>,

        #[arg(long)]
        tenant: Option<String>,

        /// free, full_access, or pending
        #[arg(long)]
        plan: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let client = client::LudusClient::new(cli.server);

    match cli.command {
        Commands::Health => commands::health(&client).await,
        Commands::Progress { learner, game } => commands::progress(&client, &learner, &game).await,
        Commands::Batch { learner, category } => {
            commands::batch(&client, &learner, category.as_deref()).await
        }
        Commands::Wallet { learner } => commands::wallet(&client, &learner).await,
        Commands::Leaderboard { period } => commands::leaderboard(&client, &period).await,
        Commands::Complete {
            learner,
            game,
            score,
            full,
            time,
            replay,
            key,
        } => commands::complete(&client, &learner, &game, score, full, time, replay, key).await,
        Commands::UnlockReplay { learner, game } => {
            commands::unlock_replay(&client, &learner, &game).await
        }
        Commands::SetLearner {
            learner,
            name,
            dob,
            tenant,
            plan,
        } => commands::set_learner(&client, &learner, name, dob, tenant, plan).await,
    }
}
