use std::{sync::Arc, time::Duration};

use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use interpreter::Interpreter;
use ledger::{CategoryKind, Currency, Ledger, Money, NewAccount, NewCategory};
use migration::{Migrator, MigratorTrait};
use settings::Database;
use tokio::io::{AsyncBufReadExt, BufReader};
use uuid::Uuid;

mod settings;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Parser, Debug)]
#[command(name = "chanchito")]
#[command(about = "Chat bookkeeping in Argentine Spanish")]
struct Cli {
    /// Settings file, without extension.
    #[arg(long, env = "CHANCHITO_CONFIG", default_value = "settings")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the Telegram bot.
    Bot,
    /// Talk to the interpreter from the terminal. Lines starting with `!`
    /// are sent as button presses (`!confirm:yes`).
    Chat(ChatArgs),
    User(UserCmd),
    /// Link a chat identity to a user.
    Link(LinkArgs),
    Account(AccountCmd),
    Category(CategoryCmd),
    /// Delete expired conversations once.
    Sweep,
}

#[derive(Args, Debug)]
struct ChatArgs {
    #[arg(long, default_value = "cli")]
    platform: String,
    #[arg(long)]
    id: String,
}

#[derive(Args, Debug)]
struct UserCmd {
    #[command(subcommand)]
    command: UserCommand,
}

#[derive(Subcommand, Debug)]
enum UserCommand {
    Add {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "ARS", value_parser = parse_currency)]
        currency: Currency,
    },
}

#[derive(Args, Debug)]
struct LinkArgs {
    #[arg(long)]
    platform: String,
    #[arg(long)]
    id: String,
    #[arg(long)]
    user: Uuid,
    /// Leave the link pending verification.
    #[arg(long)]
    unverified: bool,
}

#[derive(Args, Debug)]
struct AccountCmd {
    #[command(subcommand)]
    command: AccountCommand,
}

#[derive(Subcommand, Debug)]
enum AccountCommand {
    Add {
        #[arg(long)]
        user: Uuid,
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "ARS", value_parser = parse_currency)]
        currency: Currency,
        /// Opening balance in major units ("1500", "2,5k").
        #[arg(long, value_parser = parse_money)]
        balance: Option<Money>,
        /// Marks the account as a credit card closing on this day.
        #[arg(long)]
        closing_day: Option<u32>,
        #[arg(long)]
        icon: Option<String>,
    },
}

#[derive(Args, Debug)]
struct CategoryCmd {
    #[command(subcommand)]
    command: CategoryCommand,
}

#[derive(Subcommand, Debug)]
enum CategoryCommand {
    Add {
        #[arg(long)]
        user: Uuid,
        #[arg(long)]
        name: String,
        #[arg(long, value_parser = parse_kind)]
        kind: CategoryKind,
        #[arg(long)]
        icon: Option<String>,
    },
}

fn parse_currency(value: &str) -> Result<Currency, String> {
    Currency::try_from(value).map_err(|err| err.to_string())
}

fn parse_kind(value: &str) -> Result<CategoryKind, String> {
    CategoryKind::try_from(value).map_err(|err| err.to_string())
}

fn parse_money(value: &str) -> Result<Money, String> {
    interpreter::extract::amount::parse_amount_input(value)
        .map(|(amount, _)| amount)
        .map_err(|err| err.to_string())
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let cli = Cli::parse();
    let settings = settings::Settings::new(&cli.config)?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "chanchito={level},telegram_bot={level},interpreter={level},ledger={level}",
            level = settings.app.level
        ))
        .init();

    let ledger = Arc::new(open_ledger(&settings.database).await?);

    match cli.command {
        Command::Bot => run_bot(settings, ledger).await?,
        Command::Chat(args) => {
            let interpreter = build_interpreter(&settings, ledger)?;
            chat(&interpreter, &args.platform, &args.id).await?;
        }
        Command::User(UserCmd {
            command: UserCommand::Add { name, currency },
        }) => {
            let id = ledger.create_user(&name, currency).await?;
            println!("{id}");
        }
        Command::Link(args) => {
            ledger
                .link_platform_user(&args.platform, &args.id, args.user, !args.unverified)
                .await?;
            tracing::info!(platform = %args.platform, user = %args.user, "platform user linked");
        }
        Command::Account(AccountCmd {
            command:
                AccountCommand::Add {
                    user,
                    name,
                    currency,
                    balance,
                    closing_day,
                    icon,
                },
        }) => {
            let mut cmd = NewAccount::new(user, name, currency);
            if let Some(balance) = balance {
                cmd = cmd.initial_balance(balance);
            }
            if let Some(day) = closing_day {
                cmd = cmd.credit_card(day);
            }
            if let Some(icon) = icon {
                cmd = cmd.icon(icon);
            }
            println!("{}", ledger.create_account(cmd).await?);
        }
        Command::Category(CategoryCmd {
            command:
                CategoryCommand::Add {
                    user,
                    name,
                    kind,
                    icon,
                },
        }) => {
            let mut cmd = NewCategory::new(user, name, kind);
            if let Some(icon) = icon {
                cmd = cmd.icon(icon);
            }
            println!("{}", ledger.create_category(cmd).await?);
        }
        Command::Sweep => {
            let removed = ledger.sweep_expired_conversations(Utc::now()).await?;
            tracing::info!(removed, "expired conversations swept");
        }
    }

    Ok(())
}

async fn open_ledger(config: &Database) -> Result<Ledger, BoxError> {
    let url = match config {
        Database::Memory => String::from("sqlite::memory:"),
        Database::Sqlite(path) => format!("sqlite:{path}?mode=rwc"),
    };

    let database = sea_orm::Database::connect(url).await?;
    Migrator::up(&database, None).await?;
    Ok(Ledger::builder().database(database).build().await?)
}

fn build_interpreter(
    settings: &settings::Settings,
    ledger: Arc<Ledger>,
) -> Result<Interpreter, BoxError> {
    let interpreter = Interpreter::builder()
        .store(ledger)
        .config(settings.interpreter.clone())
        .timezone(settings.app.timezone()?)
        .llm_config(&settings.llm)?
        .build()?;
    Ok(interpreter)
}

async fn run_bot(settings: settings::Settings, ledger: Arc<Ledger>) -> Result<(), BoxError> {
    let Some(telegram) = settings.telegram.as_ref() else {
        return Err("missing [telegram] settings".into());
    };
    let interpreter = Arc::new(build_interpreter(&settings, ledger)?);
    let mut tasks = tokio::task::JoinSet::new();

    let sweeper = interpreter.clone();
    let every = Duration::from_secs(settings.app.sweep_interval_secs.max(1));
    tasks.spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            match sweeper.sweep_expired(Utc::now()).await {
                Ok(0) => {}
                Ok(removed) => tracing::debug!(removed, "expired conversations swept"),
                Err(err) => tracing::error!("failed to sweep conversations: {err}"),
            }
        }
    });

    tracing::info!("Found telegram settings...");
    let bot = telegram_bot::Bot::builder()
        .token(&telegram.token)
        .allowed_users(
            telegram
                .allowed_users
                .iter()
                .map(|id| telegram_bot::UserId(*id))
                .collect(),
        )
        .interpreter(interpreter)
        .build()?;
    tasks.spawn(async move { bot.run().await });

    // The bot stops on ctrl-c; take the sweeper down with it.
    while tasks.join_next().await.is_some() {
        tasks.shutdown().await;
    }
    Ok(())
}

async fn chat(interpreter: &Interpreter, platform: &str, id: &str) -> Result<(), BoxError> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    println!("Escribí un mensaje (ctrl-d para salir).");
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let reply = match line.strip_prefix('!') {
            Some(token) => interpreter.process_callback(platform, id, token).await,
            None => interpreter.process_message(platform, id, line).await,
        };
        println!("{}", reply.response_text);
        for button in &reply.buttons {
            println!("  [{}] !{}", button.label, button.token);
        }
    }
    Ok(())
}
