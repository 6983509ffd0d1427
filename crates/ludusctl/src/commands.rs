//! Command implementations for ludusctl.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use owo_colors::OwoColorize;

use ludus_common::rpc::{CompleteGameRequest, LearnerUpsert, ProgressView};
use ludus_common::SubscriptionPlan;

use crate::client::LudusClient;

pub async fn health(client: &LudusClient) -> Result<()> {
    let health = client.health().await?;
    println!("{} v{}", "ludusd".bold(), health.version);
    println!("  Uptime:   {}s", health.uptime_seconds);
    println!("  Catalog:  {} games", health.games_in_catalog);
    println!("  Learners: {}", health.learners_tracked);
    Ok(())
}

fn print_progress(game: &str, view: &ProgressView) {
    let status = if view.fully_completed {
        "completed".green().to_string()
    } else {
        format!("{:?}", view.state).dimmed().to_string()
    };
    println!("{} [{status}]", game.bold());
    println!(
        "  Levels {}/{}  Score {}/{}  Coins {}  Streak {}",
        view.levels_completed,
        view.total_levels,
        view.highest_score,
        view.max_score,
        view.total_coins_earned,
        view.current_streak
    );
    if view.replay_unlocked {
        println!("  {}", "Replay unlocked".cyan());
    }
    if let Some(badge) = &view.badge {
        println!("  Badge: {}", badge.name.yellow());
    }
    if !view.achievements.is_empty() {
        println!("  Achievements: {}", view.achievements.join(", "));
    }
}

pub async fn progress(client: &LudusClient, learner: &str, game: &str) -> Result<()> {
    let view = client.progress(learner, game).await?;
    print_progress(game, &view);
    Ok(())
}

pub async fn batch(client: &LudusClient, learner: &str, category: Option<&str>) -> Result<()> {
    let views = client.batch(learner, category).await?;
    if views.is_empty() {
        println!("No progress recorded");
        return Ok(());
    }
    for (game, view) in &views {
        print_progress(game, view);
    }
    Ok(())
}

pub async fn wallet(client: &LudusClient, learner: &str) -> Result<()> {
    let wallet = client.wallet(learner).await?;
    println!("{}: {} coins", learner.bold(), wallet.balance.to_string().green());
    for tx in &wallet.transactions {
        println!(
            "  {} {:>5}  {}  {}",
            format!("{:?}", tx.direction).dimmed(),
            tx.amount,
            tx.timestamp.format("%Y-%m-%d %H:%M"),
            tx.reason
        );
    }
    Ok(())
}

pub async fn leaderboard(client: &LudusClient, period: &str) -> Result<()> {
    let entries = client.leaderboard(period).await?;
    if entries.is_empty() {
        println!("No completions in this window");
        return Ok(());
    }
    println!("{}", format!("Top learners ({period})").bold());
    for (rank, entry) in entries.iter().enumerate() {
        println!(
            "  {:>2}. {:<24} {:>6} pts  {} games",
            rank + 1,
            entry.display_name,
            entry.total_score,
            entry.games_played
        );
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub async fn complete(
    client: &LudusClient,
    learner: &str,
    game: &str,
    score: u64,
    full: bool,
    time: u64,
    replay: bool,
    key: Option<String>,
) -> Result<()> {
    let req = CompleteGameRequest {
        score,
        time_played_secs: time,
        is_full_completion: full,
        is_replay: replay,
        idempotency_key: key,
        ..Default::default()
    };
    let resp = client.complete(learner, game, &req).await?;

    if resp.is_replay {
        println!("{}", "Replay recorded (no reward)".cyan());
    } else if resp.coins_earned > 0 {
        println!(
            "{} +{} coins, +{} XP",
            "Reward:".green().bold(),
            resp.coins_earned,
            resp.xp_earned
        );
    } else {
        println!("No reward for this run");
    }
    if resp.badge_earned {
        println!("{}", "Badge earned!".yellow().bold());
    }
    println!(
        "  Balance {}  Level {}  Streak {}  Game streak {}",
        resp.new_balance, resp.level, resp.streak, resp.game_streak
    );
    Ok(())
}

pub async fn unlock_replay(client: &LudusClient, learner: &str, game: &str) -> Result<()> {
    let resp = client.unlock_replay(learner, game).await?;
    if resp.coins_spent > 0 {
        println!(
            "{} for {} coins (balance {})",
            "Replay unlocked".green(),
            resp.coins_spent,
            resp.new_balance
        );
    } else {
        println!("Replay already unlocked (balance {})", resp.new_balance);
    }
    Ok(())
}

pub async fn set_learner(
    client: &LudusClient,
    learner: &str,
    name: Option<String>,
    dob: Option<String>,
    tenant: Option<String>,
    plan: Option<String>,
) -> Result<()> {
    let date_of_birth = match dob {
        Some(raw) => Some(
            NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
                .context("birth date must be YYYY-MM-DD")?,
        ),
        None => None,
    };
    let plan = match plan.as_deref() {
        Some("free") => Some(SubscriptionPlan::Free),
        Some("full_access") => Some(SubscriptionPlan::FullAccess),
        Some("pending") => Some(SubscriptionPlan::Pending),
        Some(other) => anyhow::bail!("unknown plan: {other}"),
        None => None,
    };
    let update = LearnerUpsert {
        display_name: name,
        date_of_birth,
        tenant,
        plan,
    };
    let saved = client.put_learner(learner, &update).await?;
    println!("Saved profile for {}", saved.id.bold());
    Ok(())
}
