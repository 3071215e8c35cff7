//! Command-line definitions for the `spirit` admin tool.

use clap::{Parser, Subcommand};
use spirit_core::types::{DbId, Timestamp};

#[derive(Parser)]
#[command(name = "spirit")]
#[command(about = "Administer missions, keys, and standings of the school spirit engine")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Apply pending database migrations
    Migrate,

    /// Manage cohorts
    Cohort {
        #[command(subcommand)]
        command: CohortCommands,
    },

    /// Manage accounts
    Account {
        #[command(subcommand)]
        command: AccountCommands,
    },

    /// Manage missions
    Mission {
        #[command(subcommand)]
        command: MissionCommands,
    },

    /// Mint and inspect mission keys
    Key {
        #[command(subcommand)]
        command: KeyCommands,
    },

    /// Redeem a mission key on behalf of an account
    Redeem {
        #[arg(long)]
        account: DbId,
        #[arg(long)]
        key: String,
    },

    /// Show level, XP progress, rank, and health of an account
    Progression {
        #[arg(long)]
        account: DbId,
    },

    /// Show the top accounts or cohorts by points
    Leaderboard {
        #[command(subcommand)]
        command: LeaderboardCommands,
    },

    /// List every mission with its status for an account
    Missions {
        #[arg(long)]
        account: DbId,
    },
}

#[derive(Debug, Subcommand)]
pub enum CohortCommands {
    /// Create a cohort
    Add { name: String },
    /// List cohorts by name
    List,
    /// Delete a cohort; members keep their accounts
    Delete { id: DbId },
}

#[derive(Debug, Subcommand)]
pub enum AccountCommands {
    /// Register an account
    Add {
        username: String,
        #[arg(long)]
        cohort: Option<DbId>,
    },
    /// Move an account into a cohort, or out of any cohort when omitted
    SetCohort {
        id: DbId,
        #[arg(long)]
        cohort: Option<DbId>,
    },
    /// List the missions an account has completed
    History { id: DbId },
}

#[derive(Debug, Subcommand)]
pub enum MissionCommands {
    /// Create a mission
    Add {
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value = "")]
        location: String,
        /// Points credited to the account and its cohort
        #[arg(long)]
        value: i64,
        /// XP credited to the account
        #[arg(long)]
        xp: i64,
        /// RFC 3339 start of the claim window
        #[arg(long)]
        start: Timestamp,
        /// RFC 3339 end of the claim window
        #[arg(long)]
        end: Timestamp,
    },
    /// List missions by start time
    List,
    /// Delete a mission with its keys and completions
    Delete { id: DbId },
}

#[derive(Debug, Subcommand)]
pub enum KeyCommands {
    /// Mint fresh keys for a mission
    Mint {
        mission_id: DbId,
        /// Each key may be redeemed only once across all accounts
        #[arg(long)]
        one_use: bool,
        #[arg(long, default_value_t = 1)]
        count: u32,
    },
    /// List the keys of a mission
    List { mission_id: DbId },
}

#[derive(Debug, Subcommand)]
pub enum LeaderboardCommands {
    Accounts {
        #[arg(long, short = 'n')]
        limit: Option<u32>,
    },
    Cohorts {
        #[arg(long, short = 'n')]
        limit: Option<u32>,
    },
}
