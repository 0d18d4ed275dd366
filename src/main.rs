//! dialbridge - click-to-dial bridge
//!
//! Normalizes phone numbers and asks an HTTP-controlled phone system to
//! place calls, from the command line or an interactive terminal dialer.

mod config;
mod endpoint;
mod error;
mod number;
mod tui;
mod workflow;

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::Settings;
use endpoint::HttpPhoneSystem;
use error::DialError;
use workflow::{CallOutcome, CallWorkflow, ConsoleUi, FlagHost, HostContext, SharedUi, UiSink};

#[derive(Parser)]
#[command(name = "dialbridge")]
#[command(about = "Click-to-dial bridge for HTTP-controlled phone systems", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Settings file (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Check whether the phone system answers
    Status,

    /// Call a number
    Call {
        /// Number in any notation (+41 79 ..., 079/..., tel:...)
        number: String,
    },

    /// Show the canonical and display forms of a number
    Format {
        number: String,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Handle a launch parameter: tel:/callto: link or `tel=` query string
    Open {
        param: String,

        /// Launched by another program; close after an automatic call
        #[arg(long)]
        embedded: bool,

        /// Run without the interactive dialer
        #[arg(long)]
        no_dialer: bool,
    },

    /// Open the interactive dialer
    Dial {
        /// Number to pre-fill
        number: Option<String>,
    },

    /// Show or change settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the current settings (password masked)
    Show,

    /// Print the settings file path
    Path,

    /// Change settings
    Set {
        /// Call URL template, e.g. http://pbx/dial?nr={number}
        #[arg(long)]
        url: Option<String>,

        #[arg(long)]
        user: Option<String>,

        #[arg(long)]
        password: Option<String>,

        /// Call immediately when a number arrives via `open`
        #[arg(long)]
        do_not_prompt: Option<bool>,

        #[arg(long)]
        calling_device: Option<String>,

        #[arg(long)]
        timeout_secs: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // The dialer owns the terminal; its logs go to a file.
    let owns_terminal = matches!(
        cli.command,
        Commands::Dial { .. } | Commands::Open { no_dialer: false, .. }
    );
    let log_file = if owns_terminal {
        Some(Settings::cache_dir()?.join("dialbridge.log"))
    } else {
        None
    };
    init_logging(cli.verbose, log_file.as_deref())?;

    let config_path = match cli.config {
        Some(path) => path,
        None => Settings::default_path()?,
    };
    let settings = Settings::load_from(&config_path)?;

    match cli.command {
        Commands::Status => {
            let ui = Arc::new(ConsoleUi::default());
            let workflow = build_workflow(&settings, ui, FlagHost::new(false))?;
            if workflow.check_status().await.is_err() {
                bail!("phone system status check failed");
            }
        }
        Commands::Call { number } => {
            let ui = Arc::new(ConsoleUi::new(&number));
            let workflow = build_workflow(&settings, ui, FlagHost::new(false))?;
            match workflow.on_call_action().await {
                None => bail!("no number given"),
                Some(Err(e)) => return Err(e.into()),
                Some(Ok(started)) => tracing::debug!("Dialed {}", started.number),
            }
        }
        Commands::Format { number, json } => {
            let canonical = number::clean(&number);
            let display = number::format(&canonical);
            if json {
                let out = serde_json::json!({
                    "input": number,
                    "canonical": canonical,
                    "display": display,
                });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                println!("canonical: {}", canonical);
                println!("display:   {}", display);
            }
        }
        Commands::Open {
            param,
            embedded,
            no_dialer,
        } => {
            let initial = launch_parameter(&param);
            tracing::info!("Launched with number {:?}", initial);
            let host = FlagHost::new(embedded);
            let auto_trigger = settings.do_not_prompt;

            if no_dialer {
                run_headless(&settings, host, &initial, auto_trigger).await?;
            } else {
                let ui = SharedUi::new();
                let workflow = build_workflow(&settings, Arc::new(ui.clone()), host.clone())?;
                tui::run(workflow, ui, host, Some(initial), auto_trigger).await?;
            }
        }
        Commands::Dial { number } => {
            let ui = SharedUi::new();
            let host = FlagHost::new(false);
            let workflow = build_workflow(&settings, Arc::new(ui.clone()), host.clone())?;
            tui::run(workflow, ui, host, number, false).await?;
        }
        Commands::Config { action } => run_config(action, settings, &config_path)?,
    }

    Ok(())
}

fn init_logging(verbose: bool, log_file: Option<&Path>) -> Result<()> {
    let filter = if verbose { "debug" } else { "info" };
    let registry = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()));

    match log_file {
        Some(path) => {
            if let Some(dir) = path.parent() {
                std::fs::create_dir_all(dir).context("Failed to create log directory")?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_target(false)
                        .with_ansi(false)
                        .with_writer(Mutex::new(file)),
                )
                .init();
        }
        None => {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_target(false)
                        .with_writer(std::io::stderr),
                )
                .init();
        }
    }

    Ok(())
}

/// Validate settings and wire a workflow to the HTTP phone system.
///
/// Fails on missing or bad settings before any request is made.
fn build_workflow<H>(settings: &Settings, ui: Arc<dyn UiSink>, host: H) -> Result<CallWorkflow>
where
    H: HostContext + 'static,
{
    let endpoint = settings.endpoint()?;
    let timeout = settings.timeout_secs.map(Duration::from_secs);
    let phone = HttpPhoneSystem::new(endpoint.clone(), timeout)?;
    tracing::debug!("Using phone system at {}", endpoint.status_url());

    Ok(CallWorkflow::new(
        endpoint,
        Arc::new(phone),
        ui,
        Arc::new(host),
    ))
}

/// Number carried by a launch parameter: a tel:/callto: link, or a query
/// string whose `tel` value holds one.
fn launch_parameter(param: &str) -> String {
    let tel = if param.starts_with('?') || param.contains("tel=") {
        number::query_parameter(param, "tel").unwrap_or_default()
    } else {
        param.to_string()
    };
    number::launch_number(&tel)
}

async fn run_headless(
    settings: &Settings,
    host: FlagHost,
    initial: &str,
    auto_trigger: bool,
) -> Result<()> {
    let ui = Arc::new(ConsoleUi::new(&number::display(initial)));
    let workflow = build_workflow(settings, ui, host)?;

    let report = workflow.start(Some(initial), auto_trigger).await;
    if let CallOutcome::StatusError(e) = &report.status {
        tracing::warn!("Status check failed before calling: {}", e);
    }
    if let Some(close) = report.close {
        tracing::debug!(
            "Close scheduled in {:?}",
            close
                .deadline()
                .saturating_duration_since(tokio::time::Instant::now())
        );
        close.wait().await;
    }

    match report.auto_call {
        Some(CallOutcome::CallFailed(e)) => Err(e.into()),
        Some(_) => Ok(()),
        None if number::clean(initial).is_empty() => {
            Err(DialError::InvalidNumber).context("no number in launch parameter")
        }
        None => {
            println!(
                "Not calling {} automatically (do_not_prompt is off). Use 'dialbridge call'.",
                number::display(initial)
            );
            Ok(())
        }
    }
}

fn run_config(action: ConfigAction, mut settings: Settings, path: &Path) -> Result<()> {
    match action {
        ConfigAction::Show => {
            println!("# {}", path.display());
            print!("{}", toml::to_string_pretty(&settings.redacted())?);
        }
        ConfigAction::Path => println!("{}", path.display()),
        ConfigAction::Set {
            url,
            user,
            password,
            do_not_prompt,
            calling_device,
            timeout_secs,
        } => {
            if url.is_some() {
                settings.url = url;
            }
            if user.is_some() {
                settings.user = user;
            }
            if password.is_some() {
                settings.password = password;
            }
            if let Some(flag) = do_not_prompt {
                settings.do_not_prompt = flag;
            }
            if calling_device.is_some() {
                settings.calling_device = calling_device;
            }
            if timeout_secs.is_some() {
                settings.timeout_secs = timeout_secs;
            }

            if settings.url.is_some() {
                settings.endpoint()?;
            }
            settings.save_to(path)?;
            println!("Settings saved to {}", path.display());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio_test::{assert_err, assert_ok};

    #[test]
    fn test_launch_parameter_forms() {
        assert_eq!(launch_parameter("tel:0041791234567"), "0041791234567");
        assert_eq!(launch_parameter("callto:%2B41791234567"), "+41791234567");
        assert_eq!(
            launch_parameter("?tel=tel%3A%2B41%2079%20123%2045%2067"),
            "+41 79 123 45 67"
        );
        assert_eq!(launch_parameter("lang=de&tel=0791234567"), "0791234567");
        assert_eq!(launch_parameter("?lang=de"), "");
        assert_eq!(launch_parameter("079 123 45 67"), "079 123 45 67");
    }

    #[test]
    fn test_cli_parses() {
        let cli = Cli::try_parse_from(["dialbridge", "open", "tel:0791234567", "--embedded"])
            .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Open {
                embedded: true,
                no_dialer: false,
                ..
            }
        ));

        let cli = Cli::try_parse_from([
            "dialbridge",
            "config",
            "set",
            "--url",
            "http://pbx/{number}",
            "--do-not-prompt",
            "true",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Config {
                action: ConfigAction::Set {
                    do_not_prompt: Some(true),
                    ..
                }
            }
        ));
    }

    #[test]
    fn test_missing_url_fails_before_request() {
        let err = build_workflow(
            &Settings::default(),
            Arc::new(ConsoleUi::default()),
            FlagHost::new(false),
        )
        .err()
        .unwrap();
        assert!(err.downcast_ref::<DialError>().is_some());
    }

    #[test]
    fn test_config_set_validates_url() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let action = ConfigAction::Set {
            url: Some("ftp://pbx/{number}".to_string()),
            user: None,
            password: None,
            do_not_prompt: None,
            calling_device: None,
            timeout_secs: None,
        };
        assert!(run_config(action, Settings::default(), &path).is_err());
        assert!(!path.exists());
    }

    /// Answer `count` requests with 200, returning their request lines.
    async fn serve(count: usize) -> (u16, tokio::task::JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let handle = tokio::spawn(async move {
            let mut lines = Vec::new();
            for _ in 0..count {
                let (mut sock, _) = listener.accept().await.unwrap();
                let mut raw = Vec::new();
                let mut buf = [0u8; 1024];
                while !raw.windows(4).any(|w| w == b"\r\n\r\n") {
                    let n = sock.read(&mut buf).await.unwrap();
                    if n == 0 {
                        break;
                    }
                    raw.extend_from_slice(&buf[..n]);
                }
                let resp = "HTTP/1.1 200 OK\r\nContent-Length: 0\r\nConnection: close\r\n\r\n";
                sock.write_all(resp.as_bytes()).await.unwrap();
                sock.shutdown().await.ok();
                let text = String::from_utf8_lossy(&raw).into_owned();
                lines.push(text.lines().next().unwrap_or_default().to_string());
            }
            lines
        });

        (port, handle)
    }

    /// A loopback port nothing listens on.
    async fn closed_port() -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    }

    fn settings_for(port: u16) -> Settings {
        Settings {
            url: Some(format!("http://127.0.0.1:{}/dial?nr={{number}}", port)),
            do_not_prompt: true,
            ..Settings::default()
        }
    }

    #[tokio::test]
    async fn test_headless_open_calls_and_closes() {
        let (port, server) = serve(2).await;
        let host = FlagHost::new(true);
        let initial = launch_parameter("tel:%2B41791234567");

        assert_ok!(run_headless(&settings_for(port), host.clone(), &initial, true).await);
        assert!(host.close_requested());

        let lines = server.await.unwrap();
        assert_eq!(
            lines,
            vec![
                "GET / HTTP/1.1".to_string(),
                "GET /dial?nr=0041791234567 HTTP/1.1".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_headless_open_without_number_fails() {
        let settings = settings_for(closed_port().await);
        for param in ["?lang=de", "tel:abc"] {
            let initial = launch_parameter(param);
            let err = assert_err!(
                run_headless(&settings, FlagHost::new(false), &initial, true).await
            );
            assert_eq!(
                err.downcast_ref::<DialError>(),
                Some(&DialError::InvalidNumber),
                "param {:?}",
                param
            );
        }
    }

    #[tokio::test]
    async fn test_headless_open_without_auto_call() {
        let settings = settings_for(closed_port().await);
        let host = FlagHost::new(true);
        assert_ok!(run_headless(&settings, host.clone(), "0791234567", false).await);
        assert!(!host.close_requested());
    }
}
