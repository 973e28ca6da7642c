mod render;

use std::{sync::Arc, time::Duration};

use anyhow::{bail, Context, Result};
use chrono::Local;
use clap::{Args, Parser, Subcommand};
use client_core::{
    compose::{parse_reply_to, too_long_message},
    event_channel,
    format::greeting_at,
    load_settings,
    session::UNKNOWN_ERROR,
    validation::{fields, VALIDATION_DEBOUNCE},
    Autocomplete, ClientEvent, ComposeFlow, HttpMessagingApi, InboxEngine, LoginFlow,
    MessagingApi, RegistrationFlow, Scheduler, SubmitOutcome,
};
use shared::domain::ThreadId;
use tokio::sync::broadcast;
use tracing::warn;
use tracing_subscriber::EnvFilter;
use url::Url;

use render::Style;

#[derive(Parser, Debug)]
#[command(name = "messenger", about = "Terminal client for the messaging web app")]
struct Cli {
    /// Overrides `server_url` from client.toml and the environment.
    #[arg(long)]
    server_url: Option<String>,
    /// Print views as the HTML fragments the web page shows.
    #[arg(long)]
    html: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct Credentials {
    #[arg(long, short)]
    username: String,
    #[arg(long, short)]
    password: String,
}

#[derive(Subcommand, Debug)]
enum Command {
    Register {
        #[arg(long)]
        username: String,
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        password: String,
    },
    Inbox {
        #[command(flatten)]
        credentials: Credentials,
        /// Thread to open once the inbox is loaded.
        #[arg(long)]
        select: Option<i64>,
        /// Number of polls before exiting; 0 keeps polling until Ctrl-C.
        #[arg(long, default_value_t = 1)]
        polls: u32,
    },
    Send {
        #[command(flatten)]
        credentials: Credentials,
        #[arg(long)]
        to: Option<String>,
        /// Thread id, or a `/new_message/?reply_to=` URL.
        #[arg(long)]
        reply_to: Option<String>,
        content: String,
    },
    Search {
        #[command(flatten)]
        credentials: Credentials,
        query: String,
    },
    Logout {
        #[command(flatten)]
        credentials: Credentials,
    },
}

struct Session {
    api: Arc<dyn MessagingApi>,
    scheduler: Scheduler,
    events: broadcast::Sender<ClientEvent>,
}

impl Session {
    async fn login(&self, credentials: &Credentials) -> Result<()> {
        let flow = LoginFlow::new(
            Arc::clone(&self.api),
            self.scheduler.clone(),
            self.events.clone(),
        );
        flow.load(None)
            .await
            .context("failed to reach the login page")?;
        flow.form()
            .input(fields::USERNAME, credentials.username.clone())
            .await;
        flow.form()
            .input(fields::PASSWORD, credentials.password.clone())
            .await;
        settle().await;

        if flow.submit().await.is_some() {
            return Ok(());
        }
        let snapshot = flow.form().snapshot().await;
        if let Some(error) = snapshot.fields.iter().find_map(|field| field.error.clone()) {
            bail!(error);
        }
        bail!(flow
            .banner()
            .map(|banner| banner.message)
            .unwrap_or_else(|| UNKNOWN_ERROR.to_string()))
    }
}

/// Shows a failed request without ending the session.
fn report(events: &broadcast::Sender<ClientEvent>, context: &str, err: &impl std::fmt::Display) {
    warn!(error = %err, "{context}");
    let _ = events.send(ClientEvent::Error(format!("{context}: {err}")));
}

/// Waits until debounced validation has run.
async fn settle() {
    tokio::time::sleep(VALIDATION_DEBOUNCE + Duration::from_millis(20)).await;
}

fn reply_target(raw: &str) -> Option<String> {
    match Url::parse(raw) {
        Ok(url) => parse_reply_to(&url),
        Err(_) => Some(raw.to_string()),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let cli = Cli::parse();

    let mut settings = load_settings()?;
    if let Some(server_url) = cli.server_url {
        settings.server_url = server_url;
    }
    let api: Arc<dyn MessagingApi> = Arc::new(
        HttpMessagingApi::from_settings(&settings)
            .with_context(|| format!("invalid server url '{}'", settings.server_url))?,
    );
    let events = event_channel();
    let style = if cli.html { Style::Html } else { Style::Text };
    let renderer = render::spawn(events.subscribe(), style);
    let session = Session {
        api,
        scheduler: Scheduler::current(),
        events,
    };

    let outcome = run(&session, cli.command, settings.poll_interval()).await;

    // Let the renderer print whatever is still queued.
    tokio::task::yield_now().await;
    renderer.abort();
    outcome
}

async fn run(session: &Session, command: Command, poll_interval: Duration) -> Result<()> {
    match command {
        Command::Register {
            username,
            first_name,
            last_name,
            password,
        } => {
            let flow = RegistrationFlow::new(
                Arc::clone(&session.api),
                session.scheduler.clone(),
                session.events.clone(),
            );
            session
                .api
                .prime_csrf()
                .await
                .context("failed to reach the server")?;
            for (id, value) in [
                (fields::USERNAME, username),
                (fields::FIRST_NAME, first_name),
                (fields::LAST_NAME, last_name),
                (fields::PASSWORD, password),
            ] {
                flow.form().input(id, value).await;
            }
            settle().await;
            if flow.submit().await.is_none() {
                bail!("registration was not accepted");
            }
        }
        Command::Inbox {
            credentials,
            select,
            polls,
        } => {
            session.login(&credentials).await?;
            let greeting = greeting_at(&Local::now());
            println!("{} {}", greeting.icon(), greeting.label());

            let inbox = InboxEngine::with_poll_interval(
                Arc::clone(&session.api),
                session.scheduler.clone(),
                session.events.clone(),
                poll_interval,
            );
            let polling = inbox.start();
            if let Some(thread_id) = select {
                if let Err(err) = inbox.select_thread(ThreadId(thread_id)).await {
                    report(&session.events, "Unable to open thread", &err);
                }
            }
            if polls == 0 {
                tokio::signal::ctrl_c().await?;
            } else {
                // The first poll fires immediately.
                tokio::time::sleep(poll_interval * (polls - 1) + Duration::from_millis(500))
                    .await;
            }
            drop(polling);
        }
        Command::Send {
            credentials,
            to,
            reply_to,
            content,
        } => {
            session.login(&credentials).await?;
            let flow = ComposeFlow::new(
                Arc::clone(&session.api),
                session.scheduler.clone(),
                session.events.clone(),
            );
            let reply_to = reply_to.as_deref().and_then(reply_target);
            // A failed lookup leaves the recipient editable; the flow has
            // already reported it.
            if let Err(err) = flow.load(reply_to.as_deref()).await {
                warn!(error = %err, "send: continuing without reply pre-fill");
            }
            if let Some(to) = to {
                flow.recipient().select(&to).await;
            }
            flow.on_content_input(&content).await;

            let view = flow.snapshot().await;
            if !view.send_enabled {
                bail!(view.content_error.unwrap_or_default());
            }
            match flow.submit().await? {
                SubmitOutcome::Sent => println!("message sent"),
                SubmitOutcome::Incomplete => bail!("a recipient and message content are required"),
                SubmitOutcome::TooLong => bail!(too_long_message()),
                SubmitOutcome::Rejected(rejection) => bail!(rejection.message),
            }
        }
        Command::Search { credentials, query } => {
            session.login(&credentials).await?;
            let assistant = Autocomplete::new(
                Arc::clone(&session.api),
                session.scheduler.clone(),
                session.events.clone(),
            );
            assistant.on_input(&query).await;
            tokio::time::sleep(client_core::autocomplete::SEARCH_DEBOUNCE * 2).await;
            if !assistant.snapshot().await.open {
                println!("no users match '{query}'");
            }
        }
        Command::Logout { credentials } => {
            session.login(&credentials).await?;
            let inbox = InboxEngine::new(
                Arc::clone(&session.api),
                session.scheduler.clone(),
                session.events.clone(),
            );
            inbox.logout().await?;
        }
    }
    Ok(())
}
