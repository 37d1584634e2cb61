//! CLI module for the blogdesk command-line interface.
//!
//! Provides subcommands for talking to a blog backend through the gateway:
//! - `login` / `logout` - Start or end a session
//! - `whoami` - Show the backend's view of the logged-in user
//! - `session` - Show the locally stored session
//! - `skin` - Show the skin preference or preview a skin
//! - `articles list|show` - Browse articles
//! - `config check` - Validate configuration file

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;

use crate::api::{ArticleQuery, BlogApi, EmailLogin};
use crate::config::{AuthFailurePolicy, Config};
use crate::gateway::{Gateway, GatewayOptions};
use crate::notifications::ConsoleNotifier;
use crate::session::{CredentialStore, FileSlot, Session, Skin};

/// CLI arguments structure
#[derive(Parser, Debug)]
#[command(name = "blogdesk")]
#[command(author, version, about = "Session-aware client for the blog backend", long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "blogdesk.toml")]
    pub config: PathBuf,

    /// Override log level
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// Backend base URL (overrides `[api] base_url`)
    #[arg(long, env = "BLOGDESK_API_URL")]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log in with email and password
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },

    /// Log out and drop the stored session
    Logout,

    /// Fetch the logged-in user's profile from the backend
    Whoami,

    /// Show the locally stored session
    Session,

    /// Skin preference commands
    #[command(subcommand)]
    Skin(SkinCommands),

    /// Article commands
    #[command(subcommand)]
    Articles(ArticlesCommands),

    /// Configuration management commands
    #[command(subcommand)]
    Config(ConfigCommands),
}

/// Skin subcommands
#[derive(Subcommand, Debug)]
pub enum SkinCommands {
    /// Show the current skin
    Get,
    /// Show the stylesheet a skin (shallow or deep) applies. Nothing is
    /// saved: skin choice does not outlive the process.
    Preview { name: String },
}

/// Articles subcommands
#[derive(Subcommand, Debug)]
pub enum ArticlesCommands {
    /// List published articles
    List {
        #[arg(long, default_value = "1")]
        page: u32,
        #[arg(long, default_value = "10")]
        size: u32,
    },
    /// Show one article
    Show { id: i64 },
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Validate configuration file
    Check,
}

/// Apply command-line overrides on top of the loaded configuration.
pub fn effective_config(cli: &Cli, mut config: Config) -> Config {
    if let Some(url) = &cli.api_url {
        config.api.base_url = url.clone();
    }
    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
    }
    config
}

/// Build the API client: file-backed credential store under the data dir,
/// console notifications.
fn create_api(config: &Config) -> Result<BlogApi> {
    let slot = FileSlot::in_dir(&config.storage.data_dir);
    let store = CredentialStore::new(Arc::new(slot), config.auth.session_ttl());
    let gateway = Gateway::new(
        GatewayOptions::from_config(config),
        store,
        Arc::new(ConsoleNotifier),
    )
    .context("Failed to create HTTP client")?;
    Ok(BlogApi::new(gateway))
}

/// Run a CLI command
pub async fn run_command(cli: &Cli, config: &Config) -> Result<()> {
    match &cli.command {
        Commands::Login { email, password } => cmd_login(config, email, password).await,
        Commands::Logout => cmd_logout(config).await,
        Commands::Whoami => cmd_whoami(config).await,
        Commands::Session => cmd_session(config),
        Commands::Skin(SkinCommands::Get) => cmd_skin_get(config),
        Commands::Skin(SkinCommands::Preview { name }) => cmd_skin_preview(name),
        Commands::Articles(ArticlesCommands::List { page, size }) => {
            cmd_articles_list(config, *page, *size).await
        }
        Commands::Articles(ArticlesCommands::Show { id }) => cmd_articles_show(config, *id).await,
        Commands::Config(ConfigCommands::Check) => cmd_config_check(cli),
    }
}

async fn cmd_login(config: &Config, email: &str, password: &str) -> Result<()> {
    let api = create_api(config)?;
    let credentials = EmailLogin {
        email: email.to_string(),
        password: password.to_string(),
    };

    let session = api.email_login(&credentials).await.context("Login failed")?;

    println!(
        "[OK] Logged in as {}",
        session.nickname.as_deref().unwrap_or(email)
    );
    println!(
        "     Session stored in {} (expires in {})",
        FileSlot::in_dir(&config.storage.data_dir).path().display(),
        format_ttl(config.auth.session_ttl_secs)
    );
    Ok(())
}

async fn cmd_logout(config: &Config) -> Result<()> {
    let api = create_api(config)?;

    match api.logout().await {
        Ok(()) => println!("[OK] Logged out"),
        Err(e) => {
            tracing::warn!(error = %e, "Backend logout failed");
            println!("[OK] Local session cleared (backend said: {})", e.message());
        }
    }
    Ok(())
}

async fn cmd_whoami(config: &Config) -> Result<()> {
    let api = create_api(config)?;

    if api.store().get_session()?.is_none() {
        println!("Not logged in. Run `blogdesk login` first.");
        return Ok(());
    }

    let info = api
        .get_user_info()
        .await
        .context("Failed to fetch user info")?;

    println!();
    for (label, key) in [
        ("Nickname", "nickname"),
        ("Email", "email"),
        ("Intro", "intro"),
        ("Website", "webSite"),
    ] {
        println!("{:<10} {}", format!("{}:", label), field_or_dash(&info, key));
    }
    println!();
    Ok(())
}

fn cmd_session(config: &Config) -> Result<()> {
    let api = create_api(config)?;

    let Some(session) = api.store().get_session()? else {
        println!("No active session.");
        return Ok(());
    };

    println!();
    println!("=== Session ===");
    println!();
    print_session(&session);
    println!("TTL:        {}", format_ttl(api.store().ttl().num_seconds()));
    println!(
        "On 401:     {}",
        match config.auth.failure_policy {
            AuthFailurePolicy::Clear => "clear session",
            AuthFailurePolicy::Confirm => "ask before clearing",
        }
    );
    println!();
    Ok(())
}

fn print_session(session: &Session) {
    println!("Token:      {}", mask_token(&session.token));
    println!(
        "User:       {}",
        session
            .user_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "-".to_string())
    );
    println!("Nickname:   {}", session.nickname.as_deref().unwrap_or("-"));
    println!(
        "Admin:      {}",
        if session.is_admin() { "yes" } else { "no" }
    );
    if !session.role_list.is_empty() {
        println!("Roles:      {}", session.role_list.join(", "));
    }
}

fn cmd_skin_get(config: &Config) -> Result<()> {
    let api = create_api(config)?;
    println!("{}", skin_line(api.store().skin()));
    Ok(())
}

fn cmd_skin_preview(name: &str) -> Result<()> {
    let skin: Skin = name.parse().map_err(anyhow::Error::msg)?;
    println!("{}", skin_line(skin));
    Ok(())
}

fn skin_line(skin: Skin) -> String {
    format!("{} ({})", skin, skin.stylesheet())
}

async fn cmd_articles_list(config: &Config, page: u32, size: u32) -> Result<()> {
    let api = create_api(config)?;

    let listing = api
        .fetch_article_list(&ArticleQuery::page(page, size))
        .await
        .context("Failed to fetch articles")?;

    if listing.records.is_empty() {
        println!("No articles found.");
        return Ok(());
    }

    println!();
    println!("{:<8}  {:<40}  {:<16}  {:<20}", "ID", "TITLE", "CATEGORY", "CREATED");
    println!("{}", "-".repeat(90));
    for article in &listing.records {
        println!(
            "{:<8}  {:<40}  {:<16}  {:<20}",
            article.id,
            truncate(&article.title, 40),
            truncate(article.category_name.as_deref().unwrap_or("-"), 16),
            article.create_time.as_deref().unwrap_or("-"),
        );
    }
    println!();
    println!(
        "Page {} of {} ({} articles)",
        page,
        page_count(listing.total, size),
        listing.total
    );
    Ok(())
}

async fn cmd_articles_show(config: &Config, id: i64) -> Result<()> {
    let api = create_api(config)?;

    let article = api
        .article_info(id)
        .await
        .with_context(|| format!("Failed to fetch article {}", id))?;

    println!();
    println!("=== {} ===", field_or_dash(&article, "title"));
    println!();
    println!("Category:   {}", field_or_dash(&article, "categoryName"));
    println!("Created:    {}", field_or_dash(&article, "createTime"));
    println!("Views:      {}", field_or_dash(&article, "quantity"));
    if let Some(summary) = article.get("summary").and_then(Value::as_str) {
        println!();
        println!("{}", summary);
    }
    println!();
    Ok(())
}

fn cmd_config_check(cli: &Cli) -> Result<()> {
    let config_path = &cli.config;

    println!("Checking configuration file: {}", config_path.display());
    println!();

    if !config_path.exists() {
        println!(
            "[!!] Configuration file not found: {}",
            config_path.display()
        );
        println!();
        println!("Defaults will be used.");
        return Ok(());
    }

    match Config::load(config_path) {
        Ok(config) => {
            let config = effective_config(cli, config);
            println!("[OK] Configuration file is valid!");
            println!();
            println!("=== Configuration Summary ===");
            println!();
            println!("API:");
            println!("  Base URL:     {}", config.api.base_url);
            println!("  Timeout:      {}s", config.api.timeout_secs);
            println!();
            println!("Auth:");
            println!("  On 401:       {:?}", config.auth.failure_policy);
            println!("  Session TTL:  {}", format_ttl(config.auth.session_ttl_secs));
            println!();
            println!("Storage:");
            println!("  Data Dir:     {}", config.storage.data_dir.display());
            println!();
            println!("Logging:");
            println!("  Level:        {}", config.logging.level);
            println!();
            Ok(())
        }
        Err(e) => {
            println!("[!!] Configuration file has errors:");
            println!();
            println!("  {:#}", e);
            anyhow::bail!("Invalid configuration")
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Show only the head and tail of a bearer token.
fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

fn field_or_dash(value: &Value, key: &str) -> String {
    match value.get(key) {
        None | Some(Value::Null) => "-".to_string(),
        Some(Value::String(s)) if s.is_empty() => "-".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn format_ttl(seconds: i64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, secs)
    } else {
        format!("{}s", secs)
    }
}

fn page_count(total: i64, size: u32) -> i64 {
    if size == 0 {
        return 0;
    }
    let size = i64::from(size);
    (total + size - 1) / size
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_login() {
        let cli = Cli::parse_from([
            "blogdesk",
            "login",
            "--email",
            "reader@example.com",
            "--password",
            "123456",
        ]);
        match cli.command {
            Commands::Login { email, password } => {
                assert_eq!(email, "reader@example.com");
                assert_eq!(password, "123456");
            }
            other => panic!("unexpected command: {:?}", other),
        }
        assert_eq!(cli.config, PathBuf::from("blogdesk.toml"));
    }

    #[test]
    fn test_parse_articles_list_defaults() {
        let cli = Cli::parse_from(["blogdesk", "articles", "list"]);
        assert!(matches!(
            cli.command,
            Commands::Articles(ArticlesCommands::List { page: 1, size: 10 })
        ));
    }

    #[test]
    fn test_skin_preview_only_describes() {
        let cli = Cli::parse_from(["blogdesk", "skin", "preview", "dark"]);
        let Commands::Skin(SkinCommands::Preview { name }) = cli.command else {
            panic!("expected skin preview");
        };
        assert_eq!(name, "dark");
        assert!(cmd_skin_preview(&name).is_ok());
        assert!(cmd_skin_preview("neon").is_err());

        assert!(Cli::try_parse_from(["blogdesk", "skin", "set", "deep"]).is_err());
        assert_eq!(skin_line(Skin::Deep), "deep (/assets/deep.css)");
    }

    #[test]
    fn test_effective_config_overrides() {
        let cli = Cli::parse_from([
            "blogdesk",
            "--api-url",
            "https://blog.example.com/api",
            "--log-level",
            "debug",
            "session",
        ]);
        let config = effective_config(&cli, Config::default());
        assert_eq!(config.api.base_url, "https://blog.example.com/api");
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.api.timeout_secs, 36);
    }

    #[test]
    fn test_mask_token() {
        assert_eq!(mask_token("mock-token-123"), "mock...-123");
        assert_eq!(mask_token("short"), "*****");
        assert_eq!(mask_token(""), "");
    }

    #[test]
    fn test_field_or_dash() {
        let value = json!({"title": "Ownership", "quantity": 42, "summary": "", "intro": null});
        assert_eq!(field_or_dash(&value, "title"), "Ownership");
        assert_eq!(field_or_dash(&value, "quantity"), "42");
        assert_eq!(field_or_dash(&value, "summary"), "-");
        assert_eq!(field_or_dash(&value, "intro"), "-");
        assert_eq!(field_or_dash(&value, "missing"), "-");
    }

    #[test]
    fn test_format_ttl() {
        assert_eq!(format_ttl(3600), "1h 0m");
        assert_eq!(format_ttl(90), "1m 30s");
        assert_eq!(format_ttl(5), "5s");
    }

    #[test]
    fn test_page_count() {
        assert_eq!(page_count(12, 10), 2);
        assert_eq!(page_count(10, 10), 1);
        assert_eq!(page_count(0, 10), 0);
        assert_eq!(page_count(5, 0), 0);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a long article title", 10), "a long ...");
        assert_eq!(truncate("所有权与借用规则", 5), "所有...");
    }
}
