use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use feedshelf::app::{App, EntryChanges, Lookup};
use feedshelf::config::{Config, Environment, ENVIRONMENT_VAR};
use feedshelf::feed::FeedClient;
use feedshelf::storage::{Database, DatabaseError};
use feedshelf::util::EntryForm;

/// Get the config directory path (~/.config/feedshelf/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".config").join("feedshelf"))
}

fn ensure_private_dir(dir: &std::path::Path) -> Result<()> {
    if !dir.exists() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory {}", dir.display()))?;
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Err(e) = std::fs::set_permissions(dir, std::fs::Permissions::from_mode(0o700)) {
            tracing::warn!(
                path = %dir.display(),
                error = %e,
                "Failed to set directory permissions to 0700"
            );
        }
    }
    Ok(())
}

#[derive(Parser, Debug)]
#[command(name = "feedshelf", version, about = "Keep a shelf of RSS feeds and read them")]
struct Args {
    /// Config file (default: ~/.config/feedshelf/config.toml)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Database file, overriding the config file
    #[arg(long, global = true, value_name = "FILE")]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List all feed entries
    List {
        /// Print entries as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one entry by title or route
    Show {
        #[arg(required_unless_present = "route")]
        title: Option<String>,
        #[arg(long, conflicts_with = "title")]
        route: Option<String>,
    },
    /// Add a feed entry
    Add {
        title: String,
        url: String,
        /// Route name; derived from the title when omitted
        #[arg(long)]
        route: Option<String>,
        /// Open item links in a new tab
        #[arg(long)]
        new_tab: bool,
    },
    /// Change an entry's title, address or new-tab flag
    Edit {
        title: String,
        #[arg(long = "title", value_name = "NEW_TITLE")]
        new_title: Option<String>,
        #[arg(long)]
        url: Option<String>,
        #[arg(long, value_name = "BOOL")]
        new_tab: Option<bool>,
    },
    /// Remove an entry by title
    Remove { title: String },
    /// Fetch a feed and print its items
    Read {
        #[arg(required_unless_present = "route")]
        title: Option<String>,
        #[arg(long, conflicts_with = "title")]
        route: Option<String>,
        /// Number of items to print
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Write seed entries into an empty database
    Seed {
        /// Environment to seed as, overriding the config
        #[arg(long)]
        environment: Option<Environment>,
    },
}

fn lookup(title: Option<String>, route: Option<String>) -> Lookup {
    match route {
        Some(route) => Lookup::Route(route),
        None => Lookup::Title(title.unwrap_or_default()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config_dir = get_config_dir()?;
    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| config_dir.join("config.toml"));

    let mut config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;
    config
        .apply_environment_override(std::env::var(ENVIRONMENT_VAR).ok().as_deref())
        .with_context(|| format!("Invalid {}", ENVIRONMENT_VAR))?;

    let db_path = match args.db.clone().or_else(|| config.database_path.clone()) {
        Some(path) => path,
        None => {
            ensure_private_dir(&config_dir)?;
            config_dir.join("feeds.db")
        }
    };

    let db_path_str = db_path
        .to_str()
        .ok_or_else(|| anyhow::anyhow!("Invalid UTF-8 in database path"))?;
    let db = match Database::open(db_path_str).await {
        Ok(db) => db,
        Err(DatabaseError::InstanceLocked) => {
            eprintln!(
                "Error: The feed database at {} is locked by another process. Please close it and try again.",
                db_path.display()
            );
            std::process::exit(1);
        }
        Err(e) => {
            return Err(anyhow::anyhow!("Failed to open database: {}", e));
        }
    };

    let seeded = db
        .seed_if_empty(&config.seed_feeds, config.environment)
        .await
        .context("Failed to seed feed database")?;
    if seeded > 0 {
        tracing::info!(count = seeded, "Startup seeding complete");
    }

    let client = FeedClient::new(&config.fetch).context("Failed to create HTTP client")?;
    let app = App::new(db, client, config.item_limit);

    let mut stdout = std::io::stdout().lock();
    let success = match args.command {
        Command::List { json } => {
            app.list(&mut stdout, json).await?;
            true
        }
        Command::Show { title, route } => app.show(&mut stdout, &lookup(title, route)).await?,
        Command::Add {
            title,
            url,
            route,
            new_tab,
        } => {
            let form = EntryForm::new(&title, &url, new_tab);
            app.add(&mut stdout, &form, route.as_deref()).await?;
            true
        }
        Command::Edit {
            title,
            new_title,
            url,
            new_tab,
        } => {
            let changes = EntryChanges {
                title: new_title,
                web_address: url,
                open_in_new_tab: new_tab,
            };
            app.edit(&mut stdout, &title, &changes).await? > 0
        }
        Command::Remove { title } => app.remove(&mut stdout, &title).await? > 0,
        Command::Read {
            title,
            route,
            limit,
        } => {
            app.read(&mut stdout, &lookup(title, route), limit)
                .await?
        }
        Command::Seed { environment } => {
            let environment = environment.unwrap_or(config.environment);
            app.seed(&mut stdout, &config.seed_feeds, environment)
                .await?;
            true
        }
    };

    if !success {
        std::process::exit(1);
    }
    Ok(())
}
