//! manut - terminal console for worker dispatches
//!
//! Reads `.env`, builds a backend (REST or offline demo), restores the
//! cached session, then runs one subcommand.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use manut_client::SharedBackend;
use manut_console::controllers::{
    DashboardController, HistoryController, ReportsController, SettingsController, SitesController,
};
use manut_console::core::init_logger_with_file;
use manut_console::{AppConfig, Loaded, Notice, SessionContext, demo, export, render};
use shared::models::ThemePreference;
use shared::stats::{DayBucket, FilterCriteria, MonthBucket};

#[derive(Parser, Debug)]
#[command(name = "manut")]
#[command(about = "Dispatch console for temporary handling staff")]
struct Cli {
    /// Use an in-memory backend seeded with demo data
    #[arg(long, global = true)]
    offline_demo: bool,

    /// Session and theme directory
    #[arg(long, global = true, env = "MANUT_WORK_DIR")]
    work_dir: Option<PathBuf>,

    /// IANA timezone used for day/month buckets
    #[arg(long, global = true, env = "MANUT_TIMEZONE")]
    timezone: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Sign in with email and password
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "MANUT_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Sign out and clear the cached session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Today's and this month's totals
    Dashboard,
    /// Dispatch history with filters
    History {
        /// Exact site id
        #[arg(long)]
        site: Option<String>,
        /// Day (YYYY-MM-DD)
        #[arg(long)]
        date: Option<DayBucket>,
        /// Username substring (case-insensitive)
        #[arg(long)]
        user: Option<String>,
        #[arg(long, default_value_t = 1)]
        page: usize,
        /// Rows per page, defaults to the saved `items_per_page`
        #[arg(long)]
        page_size: Option<usize>,
        /// Write the filtered rows as CSV
        #[arg(long)]
        export: Option<PathBuf>,
    },
    /// Monthly report
    Report {
        /// Month (YYYY-MM), defaults to the current month
        #[arg(long)]
        month: Option<MonthBucket>,
        /// Write the report as CSV
        #[arg(long)]
        export: Option<PathBuf>,
    },
    /// List or search client sites
    Sites {
        #[arg(long)]
        search: Option<String>,
    },
    /// Send workers to a site
    Dispatch {
        #[arg(long)]
        site: String,
        #[arg(long)]
        quantity: i64,
        #[arg(long)]
        comment: Option<String>,
    },
    /// User settings
    Settings {
        #[command(subcommand)]
        action: Option<SettingsAction>,
    },
    /// Show or change the color theme
    Theme { theme: Option<ThemePreference> },
}

#[derive(Subcommand, Debug)]
enum SettingsAction {
    /// Print current settings
    Show,
    /// Change individual settings
    Set {
        #[arg(long)]
        full_name: Option<String>,
        #[arg(long)]
        company: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        theme: Option<ThemePreference>,
        #[arg(long)]
        auto_refresh: Option<bool>,
        #[arg(long)]
        refresh_interval: Option<u32>,
        #[arg(long)]
        default_view: Option<String>,
        #[arg(long)]
        items_per_page: Option<u32>,
    },
    /// Restore defaults
    Reset,
    /// Change the display username
    Username { name: String },
    /// Change the password
    Password {
        #[arg(long, env = "MANUT_NEW_PASSWORD", hide_env_values = true)]
        new: String,
        #[arg(long, env = "MANUT_CONFIRM_PASSWORD", hide_env_values = true)]
        confirm: String,
    },
}

struct Console {
    config: AppConfig,
    backend: SharedBackend,
    session: Arc<SessionContext>,
}

impl Console {
    fn print_notices<T>(loaded: &Loaded<T>) {
        for notice in &loaded.notices {
            Self::print_notice(notice);
        }
    }

    fn print_notice(notice: &Notice) {
        if notice.is_error() {
            eprintln!("{}", render::notice(notice));
        } else {
            println!("{}", render::notice(notice));
        }
    }

    fn write_file(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
        std::fs::write(path, bytes).with_context(|| format!("failed to write {}", path.display()))?;
        println!("Exporté: {}", path.display());
        Ok(())
    }

    async fn run(&self, command: Commands) -> anyhow::Result<bool> {
        let zone = self.config.zone;
        match command {
            Commands::Login { email, password } => match self.session.login(&email, &password).await {
                Ok(_) => {
                    Self::print_notice(&Notice::success("Connexion réussie!", "Bienvenue !"));
                    Ok(true)
                }
                Err(e) => {
                    Self::print_notice(&Notice::from_error("Erreur de connexion", &e));
                    Ok(false)
                }
            },
            Commands::Logout => {
                self.session.logout().await?;
                println!("Déconnecté.");
                Ok(true)
            }
            Commands::Whoami => match self.session.current_user() {
                Some(user) => {
                    println!("{} ({})", self.session.username(), user.email.unwrap_or_default());
                    Ok(true)
                }
                None => {
                    println!("Non connecté.");
                    Ok(false)
                }
            },
            Commands::Dashboard => {
                self.session.require_user()?;
                let controller = DashboardController::new(self.backend.clone(), self.session.clone(), zone);
                let Some(loaded) = controller.load(Utc::now()).await else {
                    return Ok(false);
                };
                Self::print_notices(&loaded);
                print!("{}", render::dashboard(&loaded.view, zone));
                Ok(!loaded.has_errors())
            }
            Commands::History {
                site,
                date,
                user,
                page,
                page_size,
                export,
            } => {
                self.session.require_user()?;
                let page_size = match page_size {
                    Some(n) => n,
                    None => SettingsController::new(self.backend.clone(), self.session.clone())
                        .page_size()
                        .await?,
                };
                let controller = HistoryController::new(self.backend.clone(), zone).with_page_size(page_size);
                let Some(loaded) = controller.load().await else {
                    return Ok(false);
                };
                Self::print_notices(&loaded);

                let criteria = FilterCriteria {
                    site_id: site,
                    date_exact: date,
                    username_substring: user,
                };
                if !criteria.is_empty() {
                    controller.apply_filters(criteria);
                }
                let view = controller.go_to_page(page);
                print!("{}", render::history(&view, zone));

                if let Some(path) = export {
                    Self::write_file(&path, &controller.export_csv())?;
                }
                Ok(!loaded.has_errors())
            }
            Commands::Report { month, export } => {
                self.session.require_user()?;
                let now = Utc::now();
                let month = month.unwrap_or_else(|| zone.month_of(now));
                let controller = ReportsController::new(self.backend.clone(), zone);
                let Some(loaded) = controller.load_month(month, now).await else {
                    return Ok(false);
                };
                Self::print_notices(&loaded);
                print!("{}", render::report(&loaded.view));

                if let Some(path) = export {
                    Self::write_file(&path, &export::report_csv(&loaded.view))?;
                }
                Ok(!loaded.has_errors())
            }
            Commands::Sites { search } => {
                self.session.require_user()?;
                let controller = SitesController::new(self.backend.clone(), self.session.clone());
                let loaded = controller.load().await;
                Self::print_notices(&loaded);
                let sites = match search {
                    Some(term) => controller.search(&term),
                    None => loaded.view.clone(),
                };
                print!("{}", render::sites(&sites));
                Ok(!loaded.has_errors())
            }
            Commands::Dispatch { site, quantity, comment } => {
                let controller = SitesController::new(self.backend.clone(), self.session.clone());
                match controller.send_workers(&site, quantity, comment.as_deref()).await {
                    Ok(receipt) => {
                        Self::print_notice(&receipt.notice);
                        Ok(true)
                    }
                    Err(e) => {
                        Self::print_notice(&SitesController::failure_notice(&e));
                        Ok(false)
                    }
                }
            }
            Commands::Settings { action } => self.settings(action.unwrap_or(SettingsAction::Show)).await,
            Commands::Theme { theme } => {
                if let Some(theme) = theme {
                    self.session.set_theme(theme)?;
                }
                println!("{}", self.session.theme().as_str());
                Ok(true)
            }
        }
    }

    async fn settings(&self, action: SettingsAction) -> anyhow::Result<bool> {
        let controller = SettingsController::new(self.backend.clone(), self.session.clone());
        match action {
            SettingsAction::Show => {
                let loaded = controller.load().await?;
                Self::print_notices(&loaded);
                print!("{}", render::settings(&loaded.view));
                Ok(!loaded.has_errors())
            }
            SettingsAction::Set {
                full_name,
                company,
                phone,
                theme,
                auto_refresh,
                refresh_interval,
                default_view,
                items_per_page,
            } => {
                let loaded = controller.load().await?;
                Self::print_notices(&loaded);
                let mut settings = loaded.view;
                if let Some(v) = full_name {
                    settings.full_name = v;
                }
                if let Some(v) = company {
                    settings.company = v;
                }
                if let Some(v) = phone {
                    settings.phone = v;
                }
                if let Some(v) = theme {
                    settings.theme = v;
                    self.session.set_theme(v)?;
                }
                if let Some(v) = auto_refresh {
                    settings.auto_refresh = v;
                }
                if let Some(v) = refresh_interval {
                    settings.refresh_interval = v;
                }
                if let Some(v) = default_view {
                    settings.default_view = v;
                }
                if let Some(v) = items_per_page {
                    settings.items_per_page = v;
                }
                let saved = controller.update(settings).await?;
                print!("{}", render::settings(&saved));
                Ok(true)
            }
            SettingsAction::Reset => {
                let saved = controller.reset().await?;
                print!("{}", render::settings(&saved));
                Ok(true)
            }
            SettingsAction::Username { name } => {
                let notice = controller.change_username(&name).await;
                Self::print_notice(&notice);
                Ok(!notice.is_error())
            }
            SettingsAction::Password { new, confirm } => {
                let notice = controller.change_password(&new, &confirm).await;
                Self::print_notice(&notice);
                Ok(!notice.is_error())
            }
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Load .env file
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let mut config = AppConfig::from_env();
    if let Some(dir) = cli.work_dir {
        config.work_dir = dir;
    }
    if let Some(tz) = cli.timezone {
        config.zone = tz.parse().map_err(anyhow::Error::msg)?;
    }

    init_logger_with_file(
        Some(config.log_level.as_str()),
        Some(config.log_json),
        config.log_dir.as_deref(),
    );

    let backend: SharedBackend = if cli.offline_demo {
        config.work_dir = config.work_dir.join("demo");
        Arc::new(demo::demo_backend(Utc::now()))
    } else {
        Arc::new(config.client_config()?.build_rest_client()?)
    };
    tracing::debug!(work_dir = %config.work_dir.display(), tz = %config.zone.tz(), "Starting console");

    let session = Arc::new(SessionContext::new(backend.clone(), &config.work_dir));
    session.init().await;
    if cli.offline_demo && !session.is_authenticated() {
        session.login(demo::DEMO_EMAIL, demo::DEMO_PASSWORD).await?;
    }

    let console = Console {
        config,
        backend,
        session,
    };
    let ok = console.run(cli.command).await?;
    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}
