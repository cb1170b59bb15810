use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use dialoguer::{Input, Password};
use dotenvy::dotenv;

use gradebook_config::DatabaseConfig;
use gradebook_core::{Role, hash_password};
use gradebook_db::{PgPool, init_db_pool, run_migrations};
use gradebook_models::UserId;

#[derive(Parser)]
#[command(name = "gradebook-cli")]
#[command(about = "Gradebook CLI - Administrative tools for Gradebook", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an administrator account
    CreateAdmin {
        /// Login name
        #[arg(short = 'u', long)]
        username: Option<String>,

        /// First name of the admin
        #[arg(short = 'f', long)]
        first_name: Option<String>,

        /// Last name of the admin
        #[arg(short = 'l', long)]
        last_name: Option<String>,

        /// Email address
        #[arg(short = 'e', long)]
        email: Option<String>,

        /// Password (will be prompted securely if not provided)
        #[arg(short = 'p', long)]
        password: Option<String>,
    },
    /// Apply pending database migrations
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = DatabaseConfig::from_env().context("DATABASE_URL must be set")?;
    let pool = init_db_pool(&config)
        .await
        .context("Failed to connect to database")?;

    let cli = Cli::parse();

    match cli.command {
        Commands::CreateAdmin {
            username,
            first_name,
            last_name,
            email,
            password,
        } => {
            let admin = AdminInput {
                username: prompt_unless_given(username, "Username")?,
                first_name: prompt_unless_given(first_name, "First name")?,
                last_name: prompt_unless_given(last_name, "Last name")?,
                email: prompt_unless_given(email, "Email address")?,
                password: match password {
                    Some(password) => password,
                    None => Password::new()
                        .with_prompt("Password")
                        .with_confirmation("Confirm password", "Passwords don't match")
                        .interact()
                        .context("Failed to read password")?,
                },
            };
            let id = create_admin(&pool, &admin).await?;
            println!("\n✅ Admin created successfully!");
            println!("   ID: {}", id);
            println!("   Username: {}", admin.username);
            println!("   Name: {} {}", admin.first_name, admin.last_name);
        }
        Commands::Migrate => {
            run_migrations(&pool)
                .await
                .context("Failed to apply migrations")?;
            println!("✅ Migrations applied");
        }
    }

    Ok(())
}

struct AdminInput {
    username: String,
    first_name: String,
    last_name: String,
    email: String,
    password: String,
}

fn prompt_unless_given(value: Option<String>, prompt: &str) -> anyhow::Result<String> {
    match value {
        Some(value) => Ok(value),
        None => Input::new()
            .with_prompt(prompt)
            .interact_text()
            .with_context(|| format!("Failed to read {}", prompt.to_lowercase())),
    }
}

async fn create_admin(db: &PgPool, admin: &AdminInput) -> anyhow::Result<UserId> {
    if admin.password.len() < 8 {
        bail!("Password must be at least 8 characters");
    }
    let hashed_password =
        hash_password(&admin.password).map_err(|e| anyhow::anyhow!("{}", e.error))?;

    let id = sqlx::query_scalar::<_, UserId>(
        "INSERT INTO users (username, first_name, last_name, email, password, role)
         VALUES ($1, $2, $3, $4, $5, $6)
         ON CONFLICT DO NOTHING
         RETURNING id",
    )
    .bind(&admin.username)
    .bind(&admin.first_name)
    .bind(&admin.last_name)
    .bind(&admin.email)
    .bind(&hashed_password)
    .bind(Role::Admin)
    .fetch_optional(db)
    .await
    .context("Failed to insert admin")?;

    match id {
        Some(id) => Ok(id),
        None => bail!("A user with this username or email already exists"),
    }
}
