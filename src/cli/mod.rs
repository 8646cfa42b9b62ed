use std::{env, io, path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::level_filters::LevelFilter;

use crate::{
    monitor::{start_monitor, MonitorSettings, DEFAULT_IDLE_TIMEOUT, DEFAULT_POLL_INTERVAL},
    session::client::{LogoutOutcome, SessionClient, SessionGateway},
    utils::logging::enable_logging,
};

#[derive(Parser, Debug)]
#[command(name = "Sessionwatch", version, long_about = None)]
#[command(about = "Monitors session inactivity and logs idle sessions out", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(long, help = "Mirror logs to the console")]
    log: bool,
}

#[derive(clap::Args, Debug)]
struct ConnectionArgs {
    #[arg(long, help = "Base url of the server, for example https://clinic.example.org")]
    server: String,
    #[arg(
        long,
        help = "Cookie string of the session, in the form 'sessionid=...; csrftoken=...'"
    )]
    cookie: String,
    #[arg(
        long,
        help = "Application directory. By default tries to save into $XDG_STATE_HOME or $HOME/.local/state"
    )]
    dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(about = "Watch for inactivity, reading activity signals from stdin")]
    Watch {
        #[command(flatten)]
        connection: ConnectionArgs,
        #[arg(long, help = "Seconds of inactivity before the session is logged out")]
        idle_timeout: Option<u64>,
        #[arg(long, help = "Seconds between server-side session checks")]
        poll_interval: Option<u64>,
    },
    #[command(about = "End the session now")]
    Logout {
        #[command(flatten)]
        connection: ConnectionArgs,
    },
    #[command(about = "Ask the server whether the session is still authenticated")]
    CheckAuth {
        #[command(flatten)]
        connection: ConnectionArgs,
    },
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let logging_level = if args.log {
        Some(LevelFilter::TRACE)
    } else {
        None
    };

    match args.commands {
        Commands::Watch {
            connection,
            idle_timeout,
            poll_interval,
        } => {
            init_logging(&connection, logging_level, args.log)?;
            start_monitor(MonitorSettings {
                base_url: connection.server,
                cookie_string: connection.cookie,
                idle_timeout: idle_timeout
                    .map(Duration::from_secs)
                    .unwrap_or(DEFAULT_IDLE_TIMEOUT),
                poll_interval: poll_interval
                    .map(Duration::from_secs)
                    .unwrap_or(DEFAULT_POLL_INTERVAL),
            })
            .await
        }
        Commands::Logout { connection } => {
            init_logging(&connection, logging_level, args.log)?;
            let client = SessionClient::new(connection.server, connection.cookie)?;
            match client.log_out().await? {
                LogoutOutcome::LoggedOut => println!("Logged out"),
                LogoutOutcome::Rejected { status } => {
                    println!("Server refused the logout: {status}")
                }
            }
            Ok(())
        }
        Commands::CheckAuth { connection } => {
            init_logging(&connection, logging_level, args.log)?;
            let client = SessionClient::new(connection.server, connection.cookie)?;
            if client.check_auth().await? {
                println!("Session is authenticated");
            } else {
                println!("Session is not authenticated");
            }
            Ok(())
        }
    }
}

fn init_logging(
    connection: &ConnectionArgs,
    log_level: Option<LevelFilter>,
    show_std: bool,
) -> Result<()> {
    let dir = match &connection.dir {
        Some(dir) => dir.clone(),
        None => create_application_default_path()?,
    };
    enable_logging(&dir, log_level, show_std)
}

pub fn create_application_default_path() -> Result<PathBuf> {
    let path = {
        #[cfg(windows)]
        {
            let mut path = PathBuf::from(
                env::var("APPDATA").context("APPDATA should be present on Windows")?,
            );
            path.push("sessionwatch");
            path
        }
        #[cfg(not(windows))]
        {
            let mut path = env::var("XDG_STATE_HOME")
                .map(PathBuf::from)
                .or_else(|_| {
                    env::var("HOME").map(|home| {
                        let mut path = PathBuf::from(home);
                        path.push(".local/state");
                        path
                    })
                })
                .context("Couldn't find neither XDG_STATE_HOME nor HOME")?;
            path.push("sessionwatch");
            path
        }
    };

    match std::fs::create_dir_all(&path) {
        Ok(_) => Ok(path),
        Err(v) if v.kind() == io::ErrorKind::AlreadyExists => Ok(path),
        Err(v) => Err(v.into()),
    }
}
