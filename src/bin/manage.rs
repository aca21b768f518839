use std::sync::Arc;

use beacon::{
    config::Settings,
    db,
    domain::{CreateAccountRequest, NewAnnouncement, PasswordInput, Role},
    repository::{
        AccountRepository, AnnouncementRepository, SqliteAccountRepository,
        SqliteAnnouncementRepository,
    },
    service::account_service::AccountService,
};
use clap::{Parser, Subcommand};
use fake::{
    faker::internet::en::{Password, SafeEmail, Username},
    Fake,
};
use uuid::Uuid;

#[derive(Parser)]
#[command(author, version, about = "Beacon operator commands", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    #[command(about = "Create a super admin account")]
    CreateSuperuser {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long, required_unless_present = "password_hash", conflicts_with = "password_hash")]
        password: Option<String>,
        /// Existing argon2 PHC string, e.g. when migrating an account
        #[arg(long)]
        password_hash: Option<String>,
    },
    #[command(about = "Create fake regular accounts for local development")]
    SeedDemo {
        #[arg(long, default_value_t = 10)]
        users: usize,
    },
    #[command(about = "Publish an announcement")]
    Announce {
        #[arg(long)]
        message: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        link: Option<String>,
        /// Store without making it visible to the app
        #[arg(long)]
        inactive: bool,
    },
    #[command(about = "List all announcements, newest first")]
    Announcements,
    #[command(about = "Make an announcement visible")]
    AnnouncementActivate { id: Uuid },
    #[command(about = "Hide an announcement")]
    AnnouncementDeactivate { id: Uuid },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "beacon=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let settings = Settings::new()?;

    let (db_pool, _source) = db::connect(&settings.database).await?;
    db::migrate(&db_pool).await?;

    let account_repo: Arc<dyn AccountRepository> =
        Arc::new(SqliteAccountRepository::new(db_pool.clone()));
    let announcement_repo = SqliteAnnouncementRepository::new(db_pool.clone());
    let accounts = AccountService::new(account_repo);

    match cli.command {
        Command::CreateSuperuser { username, email, password, password_hash } => {
            let password = match (password, password_hash) {
                (_, Some(hash)) => PasswordInput::Hashed(hash),
                (Some(plain), None) => PasswordInput::Plain(plain),
                (None, None) => anyhow::bail!("either --password or --password-hash is required"),
            };

            let account = accounts
                .create_account(CreateAccountRequest {
                    username,
                    email,
                    password,
                    role: Role::SuperAdmin,
                })
                .await?;
            println!("Created super admin {} ({})", account.username, account.id);
        }
        Command::SeedDemo { users } => {
            for i in 0..users {
                let username: String = Username().fake();
                let email: String = SafeEmail().fake();
                let password: String = Password(12..20).fake();

                let account = accounts
                    .create_account(CreateAccountRequest {
                        username: format!("{}{}", username, i),
                        email: format!("{}.{}", i, email),
                        password: PasswordInput::Plain(password),
                        role: Role::Regular,
                    })
                    .await?;
                println!("  {} <{}>", account.username, account.email);
            }
            println!("Created {} demo accounts", users);
        }
        Command::Announce { message, title, link, inactive } => {
            let announcement = announcement_repo
                .create(NewAnnouncement {
                    title,
                    message,
                    link,
                    active: !inactive,
                })
                .await?;
            println!("Created announcement {}", announcement.id);
        }
        Command::Announcements => {
            for a in announcement_repo.list().await? {
                println!(
                    "{}  {}  {}  {}",
                    a.id,
                    if a.active { "active  " } else { "inactive" },
                    a.created_at.format("%Y-%m-%d %H:%M"),
                    a.title.as_deref().unwrap_or(&a.message),
                );
            }
        }
        Command::AnnouncementActivate { id } => {
            announcement_repo.set_active(id, true).await?;
            println!("Announcement {} is active", id);
        }
        Command::AnnouncementDeactivate { id } => {
            announcement_repo.set_active(id, false).await?;
            println!("Announcement {} is inactive", id);
        }
    }

    Ok(())
}
