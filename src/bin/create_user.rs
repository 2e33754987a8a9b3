use blogpost_api::{
    config::AppConfig, models::NewUser, password::hash_password, repository::Repository,
    PostgresRepository,
};
use clap::Parser;
use sqlx::postgres::PgPoolOptions;
use std::error::Error;

/// Creates a user account. Accounts cannot be created over HTTP.
#[derive(Parser, Debug)]
#[command(name = "create-user", version, about)]
struct Args {
    /// Unique login name (at most 150 characters).
    username: String,

    #[arg(long, default_value = "")]
    email: String,

    #[arg(long, env = "CREATE_USER_PASSWORD")]
    password: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "blogpost_api=info,create_user=info".into()),
        )
        .init();

    let args = Args::parse();
    if args.username.trim().is_empty() || args.username.chars().count() > 150 {
        return Err("username must be between 1 and 150 characters".into());
    }

    let config = AppConfig::load()?;
    let db_url = config
        .db_url
        .as_deref()
        .ok_or("DATABASE_URL must be set to create users")?;

    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(db_url)
        .await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let repo = PostgresRepository::new(pool);
    let user = repo
        .create_user(NewUser {
            username: args.username,
            email: args.email,
            password_hash: hash_password(&args.password)?,
        })
        .await?;

    tracing::info!(user_id = user.id, username = %user.username, "user created");
    Ok(())
}
