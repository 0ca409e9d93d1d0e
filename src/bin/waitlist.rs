use std::io::{self, Write};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde_json::json;

use waitlist_client::config::WaitlistConfig;
use waitlist_client::notify::ConsoleNotifier;
use waitlist_client::widget::SignupState;
use waitlist_client::{build_widget, init_logger};

#[derive(Parser, Debug)]
#[command(name = "waitlist", version, about = "Join the waitlist and check how many people are on it")]
struct Cli {
    /// Print machine-readable JSON instead of messages.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show how many people are on the waitlist.
    Count,
    /// Join the waitlist with an email address.
    Join { email: String },
    /// Show whether this machine has already joined.
    Status,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logger();

    let cli = Cli::parse();
    let config = WaitlistConfig::from_env();
    config.validate()?;

    let notifier = Arc::new(ConsoleNotifier { quiet: cli.json });
    let mut widget = build_widget(&config, notifier)?;

    match cli.command {
        Command::Count => {
            let count = widget.load().await;
            if cli.json {
                println!("{}", json!({ "count": count }));
            } else {
                println!("{count} people on the waitlist");
            }
        }
        Command::Join { email } => {
            widget.load().await;
            let result = widget.submit(&email).await;

            if cli.json {
                let body = match &result {
                    Ok(()) => json!({ "joined": true, "count": widget.count() }),
                    Err(err) => json!({ "joined": false, "error": err.user_message() }),
                };
                println!("{body}");
            } else if result.is_ok() {
                println!("{} people on the waitlist", widget.count());
            }

            if result.is_err() {
                io::stdout().flush()?;
                std::process::exit(1);
            }
        }
        Command::Status => {
            if cli.json {
                println!("{}", json!({ "state": widget.state() }));
            } else if widget.state() == SignupState::Submitted {
                println!("already on the waitlist");
            } else {
                println!("not on the waitlist yet");
            }
        }
    }

    Ok(())
}
