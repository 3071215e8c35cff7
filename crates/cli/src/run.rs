//! Command handlers. Every handler prints its result as JSON on stdout.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use serde::Serialize;
use spirit_core::clock::SystemClock;
use spirit_core::error::CoreError;
use spirit_core::types::DbId;
use spirit_db::errors::{is_unique_violation, UQ_ACCOUNT_USERNAME, UQ_COHORT_NAME};
use spirit_db::models::account::CreateAccount;
use spirit_db::models::cohort::CreateCohort;
use spirit_db::models::mission::CreateMission;
use spirit_db::models::mission_key::MintMissionKeys;
use spirit_db::repositories::{
    AccountRepo, CohortRepo, CompletedMissionRepo, MissionKeyRepo, MissionRepo,
};
use spirit_db::DbPool;
use spirit_engine::{Engine, EngineConfig, EngineError, PgStore};
use validator::Validate;

use crate::commands::{
    AccountCommands, CohortCommands, Commands, KeyCommands, LeaderboardCommands, MissionCommands,
};

/// Exit code for a refused redemption.
const EXIT_REJECTED: u8 = 2;

pub async fn run(command: Commands, pool: DbPool, config: &EngineConfig) -> Result<ExitCode> {
    let engine = Engine::new(Arc::new(PgStore::new(pool.clone())), Arc::new(SystemClock))
        .with_leaderboard_limit(config.leaderboard_limit);

    match command {
        Commands::Migrate => {
            spirit_db::run_migrations(&pool)
                .await
                .context("Failed to run database migrations")?;
            tracing::info!("Database migrations applied");
        }
        Commands::Cohort { command } => cohort(&pool, command).await?,
        Commands::Account { command } => account(&pool, command).await?,
        Commands::Mission { command } => mission(&pool, command).await?,
        Commands::Key { command } => key(&pool, config, command).await?,
        Commands::Redeem { account, key } => return redeem(&engine, account, &key).await,
        Commands::Progression { account } => {
            print_json(&engine.compute_progression(account).await?)?;
        }
        Commands::Leaderboard { command } => match command {
            LeaderboardCommands::Accounts { limit } => {
                print_json(&engine.account_leaderboard(limit).await?)?;
            }
            LeaderboardCommands::Cohorts { limit } => {
                print_json(&engine.cohort_leaderboard(limit).await?)?;
            }
        },
        Commands::Missions { account } => print_json(&engine.mission_board(account).await?)?,
    }
    Ok(ExitCode::SUCCESS)
}

async fn redeem(engine: &Engine, account_id: DbId, key: &str) -> Result<ExitCode> {
    #[derive(Serialize)]
    struct Rejection {
        rejected: &'static str,
        message: String,
    }

    match engine.redeem(key, account_id).await {
        Ok(view) => {
            print_json(&view)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(EngineError::Rejected(reason)) => {
            print_json(&Rejection {
                rejected: reason.code(),
                message: reason.to_string(),
            })?;
            Ok(ExitCode::from(EXIT_REJECTED))
        }
        Err(err) => Err(err.into()),
    }
}

async fn cohort(pool: &DbPool, command: CohortCommands) -> Result<()> {
    match command {
        CohortCommands::Add { name } => {
            let input = CreateCohort { name };
            input.validate().map_err(CoreError::from)?;
            match CohortRepo::create(pool, &input).await {
                Ok(cohort) => print_json(&cohort),
                Err(err) if is_unique_violation(&err, UQ_COHORT_NAME) => {
                    bail!("Cohort '{}' already exists", input.name)
                }
                Err(err) => Err(err.into()),
            }
        }
        CohortCommands::List => print_json(&CohortRepo::list(pool).await?),
        CohortCommands::Delete { id } => {
            if !CohortRepo::delete(pool, id).await? {
                bail!("Cohort {id} not found");
            }
            tracing::info!(cohort_id = id, "Cohort deleted");
            Ok(())
        }
    }
}

async fn account(pool: &DbPool, command: AccountCommands) -> Result<()> {
    match command {
        AccountCommands::Add { username, cohort } => {
            let input = CreateAccount {
                username,
                cohort_id: cohort,
            };
            input.validate().map_err(CoreError::from)?;
            ensure_cohort(pool, cohort).await?;
            match AccountRepo::create(pool, &input).await {
                Ok(account) => print_json(&account),
                Err(err) if is_unique_violation(&err, UQ_ACCOUNT_USERNAME) => {
                    bail!("Username '{}' is taken", input.username)
                }
                Err(err) => Err(err.into()),
            }
        }
        AccountCommands::SetCohort { id, cohort } => {
            ensure_cohort(pool, cohort).await?;
            match AccountRepo::set_cohort(pool, id, cohort).await? {
                Some(account) => print_json(&account),
                None => bail!("Account {id} not found"),
            }
        }
        AccountCommands::History { id } => {
            print_json(&CompletedMissionRepo::list_by_account(pool, id).await?)
        }
    }
}

async fn ensure_cohort(pool: &DbPool, cohort_id: Option<DbId>) -> Result<()> {
    if let Some(cohort_id) = cohort_id {
        if CohortRepo::find_by_id(pool, cohort_id).await?.is_none() {
            bail!("Cohort {cohort_id} not found");
        }
    }
    Ok(())
}

async fn mission(pool: &DbPool, command: MissionCommands) -> Result<()> {
    match command {
        MissionCommands::Add {
            title,
            description,
            location,
            value,
            xp,
            start,
            end,
        } => {
            let input = CreateMission {
                title,
                description,
                location,
                value,
                xp_points: xp,
                start_time: start,
                end_time: end,
            };
            input.validate().map_err(CoreError::from)?;
            let mission = MissionRepo::create(pool, &input).await?;
            tracing::info!(mission_id = mission.id, "Mission created");
            print_json(&mission)
        }
        MissionCommands::List => print_json(&MissionRepo::list(pool).await?),
        MissionCommands::Delete { id } => {
            if !MissionRepo::delete(pool, id).await? {
                bail!("Mission {id} not found");
            }
            tracing::info!(mission_id = id, "Mission deleted");
            Ok(())
        }
    }
}

async fn key(pool: &DbPool, config: &EngineConfig, command: KeyCommands) -> Result<()> {
    match command {
        KeyCommands::Mint {
            mission_id,
            one_use,
            count,
        } => {
            let input = MintMissionKeys {
                mission_id,
                one_use,
                count,
            };
            input.validate().map_err(CoreError::from)?;
            if MissionRepo::find_by_id(pool, mission_id).await?.is_none() {
                bail!("Mission {mission_id} not found");
            }

            let mut keys = Vec::with_capacity(count as usize);
            for _ in 0..input.count {
                let key = MissionKeyRepo::mint(pool, mission_id, one_use, config.key_mint_attempts)
                    .await
                    .context("Failed to mint mission key")?;
                keys.push(key);
            }
            tracing::info!(mission_id, count = keys.len(), one_use, "Mission keys minted");
            print_json(&keys)
        }
        KeyCommands::List { mission_id } => {
            print_json(&MissionKeyRepo::list_by_mission(pool, mission_id).await?)
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
