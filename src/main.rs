//! todosync binary: interactive terminal front-end for the session
//! controller.
//!
//! The menu loop runs on the main task; prompts block inside
//! `spawn_blocking` while the refresher and auth listener keep running.
//! Item actions are fire-and-forget: the menu never waits on a mutation,
//! and the triggered refresh is the only feedback.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Input, Select};
use tracing_subscriber::EnvFilter;

use todosync::backend::{HttpBackend, ProviderCredential};
use todosync::config::Config;
use todosync::providers::providers_from_info;
use todosync::session::SessionController;
use todosync::ui::{NoticeLevel, TerminalView, TodoView};

#[derive(Parser, Debug)]
#[command(
    name = "todosync",
    version,
    about = "Todo list synced against a hosted backend"
)]
struct Cli {
    /// Path to the configuration file.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Backend base URL (overrides the config file).
    #[arg(long, value_name = "URL")]
    backend_url: Option<String>,

    /// Backend application id (overrides the config file).
    #[arg(long, value_name = "ID")]
    app_id: Option<String>,

    /// List refresh interval in milliseconds (overrides the config file).
    #[arg(long, value_name = "MS")]
    refresh_ms: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("todosync=info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(url) = cli.backend_url {
        config.backend.base_url = url;
    }
    if let Some(app_id) = cli.app_id {
        config.backend.app_id = app_id;
    }
    if let Some(ms) = cli.refresh_ms {
        config.refresh.interval_ms = ms;
    }
    config.validate()?;

    let backend = Arc::new(HttpBackend::new(&config.backend)?);
    let view = Arc::new(TerminalView::new());
    let controller = SessionController::new(
        backend.clone(),
        backend,
        view.clone(),
        config.refresh.interval(),
    );

    controller.spawn_auth_listener();
    controller.start().await;

    run(controller, view).await
}

async fn run(controller: SessionController, view: Arc<TerminalView>) -> Result<()> {
    loop {
        let keep_going = if controller.is_authenticated() {
            todo_menu(&controller, &view).await?
        } else {
            login_menu(&controller, &view).await?
        };
        if !keep_going {
            return Ok(());
        }
    }
}

enum LoginChoice {
    Credential(ProviderCredential),
    Quit,
}

/// One round of the login screen. Returns false to exit the program.
async fn login_menu(controller: &SessionController, view: &Arc<TerminalView>) -> Result<bool> {
    let providers = controller
        .providers()
        .map(providers_from_info)
        .unwrap_or_default();

    let view = Arc::clone(view);
    let outcome = tokio::task::spawn_blocking(move || -> Result<LoginChoice> {
        let mut labels: Vec<String> = providers
            .iter()
            .map(|p| format!("Log in with {}", p.name()))
            .collect();
        labels.push("Quit".into());

        let picked = Select::with_theme(&ColorfulTheme::default())
            .with_prompt("Sign in")
            .items(&labels)
            .default(0)
            .interact()?;
        if picked == providers.len() {
            return Ok(LoginChoice::Quit);
        }
        Ok(LoginChoice::Credential(
            providers[picked].obtain_credential(view.as_ref())?,
        ))
    })
    .await?;

    match outcome {
        Ok(LoginChoice::Credential(credential)) => {
            controller.login_with(credential).await;
            Ok(true)
        }
        Ok(LoginChoice::Quit) => Ok(false),
        Err(e) => {
            tracing::warn!(error = %e, "login flow aborted");
            Ok(true)
        }
    }
}

const TODO_ACTIONS: &[&str] = &[
    "Add item",
    "Toggle item",
    "Refresh now",
    "Clear checked",
    "Log out",
    "Quit",
];

/// One round of the todo screen. Returns false to exit the program.
async fn todo_menu(controller: &SessionController, view: &Arc<TerminalView>) -> Result<bool> {
    let picked = tokio::task::spawn_blocking(move || {
        Select::with_theme(&ColorfulTheme::default())
            .with_prompt("Todo list")
            .items(TODO_ACTIONS)
            .default(0)
            .interact()
    })
    .await?;

    let picked = match picked {
        Ok(index) => index,
        Err(e) => {
            tracing::warn!(error = %e, "menu aborted");
            return Ok(true);
        }
    };

    match picked {
        // Add item
        0 => {
            let text = tokio::task::spawn_blocking(move || {
                Input::<String>::with_theme(&ColorfulTheme::default())
                    .with_prompt("New item")
                    .allow_empty(true)
                    .interact_text()
            })
            .await?;

            match text {
                Ok(text) if !text.trim().is_empty() => {
                    let controller = controller.clone();
                    tokio::spawn(async move { controller.add_item(&text).await });
                }
                Ok(_) => {}
                Err(e) => tracing::warn!(error = %e, "add cancelled"),
            }
        }
        // Toggle item
        1 => {
            let items = view.items();
            if items.is_empty() {
                view.notify(NoticeLevel::Info, "Nothing to toggle.");
                return Ok(true);
            }
            let labels: Vec<String> = items
                .iter()
                .map(|i| format!("{} {}", if i.checked { "[x]" } else { "[ ]" }, i.text))
                .collect();

            let picked = tokio::task::spawn_blocking(move || {
                Select::with_theme(&ColorfulTheme::default())
                    .with_prompt("Toggle which item?")
                    .items(&labels)
                    .default(0)
                    .interact()
            })
            .await?;

            if let Ok(index) = picked {
                let item = items[index].clone();
                let controller = controller.clone();
                tokio::spawn(async move { controller.set_checked(&item.id, !item.checked).await });
            }
        }
        // Refresh now
        2 => controller.refresh_now().await,
        // Clear checked
        3 => {
            let controller = controller.clone();
            tokio::spawn(async move { controller.clear_checked().await });
        }
        // Log out
        4 => controller.logout().await,
        // Quit
        _ => return Ok(false),
    }

    Ok(true)
}
