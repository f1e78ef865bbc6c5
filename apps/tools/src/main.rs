use admin_module::{
    actions::{check_password, get_password_hash},
    hashing::{HashAlgorithm, HashInstance, HashSettings, PasswordHashFactory},
};
use anyhow::{bail, Result};
use chrono::{DateTime, Duration, Utc};
use clap::{Args, Parser, Subcommand};
use shared::domain::{HashMode, SessionId, MODULE_IDENTIFIER};
use storage::Storage;

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, default_value = "sqlite://./data/examples.db")]
    database_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct HashArgs {
    /// FE or BE
    #[arg(long, default_value = "FE")]
    mode: String,
    #[arg(long, default_value = "argon2i")]
    algorithm: String,
    #[arg(long, default_value_t = 65536)]
    memory_kib: u32,
    #[arg(long, default_value_t = 16)]
    iterations: u32,
    #[arg(long, default_value_t = 1)]
    parallelism: u32,
}

impl HashArgs {
    fn factory_and_mode(&self) -> Result<(PasswordHashFactory, HashMode)> {
        let mode: HashMode = self.mode.parse()?;
        let algorithm: HashAlgorithm = self.algorithm.parse()?;
        let settings = HashSettings {
            algorithm,
            memory_kib: self.memory_kib,
            iterations: self.iterations,
            parallelism: self.parallelism,
        };
        Ok((PasswordHashFactory::new(settings, settings), mode))
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    HashPassword {
        password: String,
        #[command(flatten)]
        hash: HashArgs,
    },
    CheckPassword {
        password: String,
        hashed_password: String,
        #[command(flatten)]
        hash: HashArgs,
    },
    ClearSettings {
        session_id: String,
    },
    PurgeSessions {
        #[arg(long, default_value_t = 30)]
        older_than_days: u32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::HashPassword { password, hash } => {
            let (factory, mode) = hash.factory_and_mode()?;
            let hashed = get_password_hash(&factory, &password, mode).await?;
            println!("{hashed}");
        }
        Command::CheckPassword {
            password,
            hashed_password,
            hash,
        } => {
            let (factory, mode) = hash.factory_and_mode()?;
            if !check_password(&factory, &hashed_password, &password, mode).await? {
                bail!("password does not match hash");
            }
            println!("password matches");
            if factory
                .default_hash_instance(mode)?
                .is_hash_update_needed(&hashed_password)
            {
                println!("hash uses outdated settings; rehash with hash-password");
            }
        }
        Command::ClearSettings { session_id } => {
            let storage = Storage::new(&cli.database_url).await?;
            let removed = storage
                .clear_module_data(&SessionId(session_id.clone()), MODULE_IDENTIFIER)
                .await?;
            println!("session={session_id} cleared={removed}");
        }
        Command::PurgeSessions { older_than_days } => {
            let cutoff = purge_cutoff(Utc::now(), older_than_days)?;
            let storage = Storage::new(&cli.database_url).await?;
            let removed = storage.purge_sessions_before(cutoff).await?;
            println!("purged {removed} sessions");
        }
    }

    Ok(())
}

fn purge_cutoff(now: DateTime<Utc>, older_than_days: u32) -> Result<DateTime<Utc>> {
    let Some(age) = Duration::try_days(i64::from(older_than_days)) else {
        bail!("--older-than-days {older_than_days} is out of range");
    };
    match now.checked_sub_signed(age) {
        Some(cutoff) => Ok(cutoff),
        None => bail!("--older-than-days {older_than_days} reaches before the earliest date"),
    }
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
