//! CLI - Command-line argument parsing
//!
//! Defines the CLI structure using clap, separate from execution in main.rs.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use levelshare::progression::seed_from_label;
use levelshare::{QuestLog, SessionMember};

/// Levelshare CLI
#[derive(Parser, Debug)]
#[command(name = "levelshare")]
#[command(about = "Party XP division and level-scaled XP transfers", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Read rules from a RON file instead of the config directory
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the level caps and their scaled equivalents
    Table,

    /// Show the target's XP after receiving all of the donor's XP
    Gift {
        donor_exp: u32,
        target_exp: u32,
    },

    /// Divide a session's XP and gold across the party
    Session {
        /// XP pool expression, e.g. `1200` or `800+10%`
        exp_pool: String,

        /// Participants as `name=exp`, optionally suffixed `:written` or `:fast`
        #[arg(required = true, value_parser = parse_member)]
        members: Vec<SessionMember>,

        /// Gold expression, e.g. `250` or `120+35`
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        gold: String,

        /// Seed for the quest log gold rolls. Non-numeric labels are hashed.
        #[arg(long, value_parser = parse_seed)]
        seed: Option<u64>,

        /// Highest level across the whole roster, for the catch-up rule
        #[arg(long)]
        reference_level: Option<u32>,
    },
}

/// Parse `name=exp` with an optional `:written` or `:fast` quest log suffix
fn parse_member(arg: &str) -> Result<SessionMember, String> {
    let (name, rest) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected name=exp, got '{}'", arg))?;
    if name.is_empty() {
        return Err(format!("missing name in '{}'", arg));
    }
    let (exp, quest_log) = match rest.split_once(':') {
        Some((exp, "written")) => (exp, QuestLog::Written),
        Some((exp, "fast")) => (exp, QuestLog::Fast),
        Some((_, other)) => return Err(format!("unknown quest log '{}' for {}", other, name)),
        None => (rest, QuestLog::None),
    };
    let exp = exp
        .parse::<u32>()
        .map_err(|e| format!("invalid XP '{}' for {}: {}", exp, name, e))?;

    Ok(SessionMember::new(name, exp).with_quest_log(quest_log))
}

fn parse_seed(arg: &str) -> Result<u64, String> {
    Ok(arg.parse::<u64>().unwrap_or_else(|_| seed_from_label(arg)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_member() {
        assert_eq!(parse_member("ash=300").unwrap(), SessionMember::new("ash", 300));
        assert_eq!(
            parse_member("bryn=900:fast").unwrap(),
            SessionMember::new("bryn", 900).with_quest_log(QuestLog::Fast)
        );
        assert_eq!(parse_member("cato=0:written").unwrap().quest_log, QuestLog::Written);
        assert!(parse_member("ash").is_err());
        assert!(parse_member("=300").is_err());
        assert!(parse_member("ash=lots").is_err());
        assert!(parse_member("ash=300:slow").is_err());
    }

    #[test]
    fn test_session_args() {
        let cli = Cli::try_parse_from([
            "levelshare", "session", "800+10%", "ash=300:fast", "bryn=900", "--gold", "60+40", "--seed", "42",
        ])
        .unwrap();

        let Commands::Session { exp_pool, members, gold, seed, reference_level } = cli.command else {
            panic!("expected a session command");
        };
        assert_eq!(exp_pool, "800+10%");
        assert_eq!(members.len(), 2);
        assert_eq!(members[0].quest_log, QuestLog::Fast);
        assert_eq!(gold, "60+40");
        assert_eq!(seed, Some(42));
        assert_eq!(reference_level, None);
    }

    #[test]
    fn test_session_defaults_and_label_seed() {
        let cli = Cli::try_parse_from(["levelshare", "session", "100", "ash=0", "--seed", "2024-05-01"]).unwrap();
        let Commands::Session { gold, seed, .. } = cli.command else {
            panic!("expected a session command");
        };
        assert_eq!(gold, "0");
        assert_eq!(seed, Some(seed_from_label("2024-05-01")));
    }

    #[test]
    fn test_global_config_and_gift() {
        let cli = Cli::try_parse_from(["levelshare", "gift", "23000", "300", "--config", "rules.ron"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("rules.ron")));
        assert!(matches!(cli.command, Commands::Gift { donor_exp: 23_000, target_exp: 300 }));
    }

    #[test]
    fn test_rejected_args() {
        assert!(Cli::try_parse_from(["levelshare"]).is_err());
        assert!(Cli::try_parse_from(["levelshare", "gift", "100"]).is_err());
        assert!(Cli::try_parse_from(["levelshare", "session", "100"]).is_err());
        assert!(Cli::try_parse_from(["levelshare", "session", "100", "ash"]).is_err());
    }
}
