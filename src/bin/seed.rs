//! Out-of-band provisioning. Self-service signup refuses the ADMIN role;
//! this tool is how the top tier (and demo data) gets into the store.

use std::str::FromStr;

use anyhow::Context;
use clap::Parser;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use uuid::Uuid;

use trackr_api::policy::Role;
use trackr_api::utils::{hash_password, utc_now};

#[derive(Parser, Debug)]
#[command(author, version, about = "trackr provisioning tool", long_about = None)]
struct Cli {
    /// Override DATABASE_URL from the environment
    #[arg(long)]
    database_url: Option<String>,

    /// Skip the demo assets, only provision accounts
    #[arg(long)]
    accounts_only: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if dotenvy::dotenv().is_err() {
        let crate_env = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
        let _ = dotenvy::from_path(crate_env);
    }

    let cli = Cli::parse();

    let database_url = match cli.database_url {
        Some(url) => url,
        None => std::env::var("DATABASE_URL").context("DATABASE_URL not set")?,
    };

    let options = SqliteConnectOptions::from_str(&database_url)
        .context("invalid DATABASE_URL")?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(2)
        .connect_with(options)
        .await
        .context("failed to connect to database")?;

    sqlx::migrate!().run(&pool).await.context("failed to run migrations")?;

    seed_user(&pool, "Admin User", "admin@trackr.gov", "AdminPassword123!", Role::Admin, "IT Department").await?;
    seed_user(&pool, "IT Officer", "officer@trackr.gov", "OfficerPassword123!", Role::ItOfficer, "IT Department").await?;
    seed_user(&pool, "Staff Member", "staff@trackr.gov", "StaffPassword123!", Role::Staff, "Finance").await?;

    if !cli.accounts_only {
        seed_asset(&pool, "ASSET-001", "COMPUTER", "Finance", "Intel Core i7-13700K", "32GB DDR5", "1TB SSD", "SN-2024-001").await?;
        seed_asset(&pool, "ASSET-002", "COMPUTER", "HR", "Intel Core i5-13600K", "16GB DDR5", "512GB SSD", "SN-2024-002").await?;
    }

    println!("Seed complete");

    Ok(())
}

async fn seed_user(
    pool: &SqlitePool,
    name: &str,
    email: &str,
    password: &str,
    role: Role,
    department: &str,
) -> anyhow::Result<()> {
    let password_hash = hash_password(password)?;
    let now = utc_now();

    let result = sqlx::query(
        "INSERT INTO users (id, name, email, password_hash, role, department, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?) ON CONFLICT(email) DO NOTHING",
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(email)
    .bind(password_hash)
    .bind(role.as_str())
    .bind(department)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    if result.rows_affected() > 0 {
        println!("created {} ({})", email, role);
    } else {
        println!("exists  {}", email);
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn seed_asset(
    pool: &SqlitePool,
    asset_tag: &str,
    asset_type: &str,
    department: &str,
    cpu: &str,
    ram: &str,
    storage: &str,
    serial_number: &str,
) -> anyhow::Result<()> {
    let now = utc_now();

    let result = sqlx::query(
        "INSERT INTO assets (id, asset_tag, asset_type, department, cpu, ram, storage, serial_number, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?) ON CONFLICT(asset_tag) DO NOTHING",
    )
    .bind(Uuid::new_v4())
    .bind(asset_tag)
    .bind(asset_type)
    .bind(department)
    .bind(cpu)
    .bind(ram)
    .bind(storage)
    .bind(serial_number)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    if result.rows_affected() > 0 {
        println!("created asset {}", asset_tag);
    } else {
        println!("exists  asset {}", asset_tag);
    }

    Ok(())
}
