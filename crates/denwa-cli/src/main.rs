//! Denwa CLI - Outbound call control
//!
//! Simple CLI for placing calls and reading their outcome from the Denwa API.

mod api;
mod config;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::{ColoredString, Colorize};
use dialoguer::Password;

use api::{DenwaClient, ImportPhoneNumberRequest, InitiateCallRequest, InitiateWebCallRequest};
use config::Config;

#[derive(Parser)]
#[command(name = "denwa")]
#[command(about = "Denwa CLI - Outbound AI voice calls", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Login and store API key
    Login {
        /// API key (will prompt if not provided)
        #[arg(short, long)]
        key: Option<String>,
        /// Server URL to store alongside the key
        #[arg(long)]
        url: Option<String>,
    },

    /// Place an outbound phone call
    Call {
        /// Destination in E.164 format (server default if omitted)
        to_number: Option<String>,
        /// Caller number
        #[arg(long)]
        from: Option<String>,
        /// Name passed to the agent as `customer_name`
        #[arg(long)]
        lead_name: Option<String>,
        #[arg(long)]
        lead_id: Option<String>,
        /// Agent override
        #[arg(long)]
        agent_id: Option<String>,
    },

    /// Open a browser test call with an agent
    WebCall {
        #[arg(long)]
        lead_name: Option<String>,
        #[arg(long)]
        agent_id: Option<String>,
    },

    /// Inspect calls
    Calls {
        #[command(subcommand)]
        action: CallsAction,
    },

    /// Manage SIP trunk phone numbers
    Numbers {
        #[command(subcommand)]
        action: NumbersAction,
    },

    /// Show current configuration
    Config,
}

#[derive(Subcommand)]
enum CallsAction {
    /// List calls, newest first
    List {
        /// Max results
        #[arg(short, long)]
        limit: Option<i64>,
    },
    /// Show one call with transcript and summary
    Show {
        /// Call ID or provider call ID
        id: String,
    },
}

#[derive(Subcommand)]
enum NumbersAction {
    /// Import a number from a SIP trunk
    Import {
        /// Number in E.164 format
        phone_number: String,
        /// SIP trunk termination URI
        #[arg(long)]
        termination_uri: String,
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        password: Option<String>,
        #[arg(long)]
        nickname: Option<String>,
        /// TCP, UDP or TLS
        #[arg(long)]
        transport: Option<String>,
    },
    /// List registered numbers
    List,
    /// Remove a number from the provider
    Remove {
        phone_number: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match cli.command {
        Commands::Login { key, url } => cmd_login(key, url).await,
        Commands::Call {
            to_number,
            from,
            lead_name,
            lead_id,
            agent_id,
        } => {
            let request = InitiateCallRequest {
                to_number,
                from_number: from,
                lead_name,
                lead_id,
                agent_id,
            };
            cmd_call(request).await
        }
        Commands::WebCall {
            lead_name,
            agent_id,
        } => cmd_web_call(InitiateWebCallRequest { lead_name, agent_id }).await,
        Commands::Calls { action } => cmd_calls(action).await,
        Commands::Numbers { action } => cmd_numbers(action).await,
        Commands::Config => cmd_config(),
    }
}

fn client() -> Result<DenwaClient> {
    let config = Config::load()?;
    Ok(DenwaClient::new(&config.base_url, config.api_key.as_deref()))
}

// ============================================
// Command Implementations
// ============================================

async fn cmd_login(key: Option<String>, url: Option<String>) -> Result<()> {
    let mut config = Config::load_file()?;
    if let Some(url) = url {
        config.set_base_url(url);
    }

    let api_key = match key {
        Some(k) => k,
        None => Password::new()
            .with_prompt("API Key")
            .interact()
            .context("Failed to read API key")?,
    };

    let client = DenwaClient::new(&config.base_url, Some(&api_key));
    print!("Testing connection... ");

    match client.health().await {
        Ok(true) => {}
        _ => {
            println!("{}", "Failed".red());
            bail!("Could not reach Denwa API at {}", config.base_url);
        }
    }
    if let Err(e) = client.check_auth().await {
        println!("{}", "Failed".red());
        bail!("API key rejected: {}", e);
    }
    println!("{}", "OK".green());

    config.set_api_key(api_key);
    config.save()?;

    println!("{} API key saved to {:?}", "✓".green(), Config::config_path()?);

    Ok(())
}

async fn cmd_call(request: InitiateCallRequest) -> Result<()> {
    let call = client()?.place_call(&request).await?;

    println!(
        "{} Call {} [{}]",
        "✓".green(),
        call.id.to_string().cyan(),
        status_badge(&call.status)
    );
    if let Some(remote) = call.remote_call_id {
        println!("  Provider call: {}", remote.dimmed());
    }
    println!("\n{}", "Follow it with:".dimmed());
    println!("  denwa calls show {}", call.id);

    Ok(())
}

async fn cmd_web_call(request: InitiateWebCallRequest) -> Result<()> {
    let session = client()?.place_web_call(&request).await?;

    println!("{} Web call {}", "✓".green(), session.id.to_string().cyan());
    if let Some(remote) = session.remote_call_id {
        println!("  Provider call: {}", remote.dimmed());
    }
    println!("  Access token: {}", session.access_token);
    println!("  Test URL: {}", session.test_url.underline());

    Ok(())
}

async fn cmd_calls(action: CallsAction) -> Result<()> {
    let client = client()?;

    match action {
        CallsAction::List { limit } => {
            let list = client.list_calls(limit).await?;

            if list.calls.is_empty() {
                println!("No calls found.");
                return Ok(());
            }

            println!("{} ({}):", "Calls".bold(), list.total);
            for call in list.calls {
                let who = call
                    .lead_name
                    .as_deref()
                    .or(call.lead_phone.as_deref())
                    .unwrap_or("-");
                let mut flags = Vec::new();
                if call.has_transcript {
                    flags.push("transcript");
                }
                if call.has_summary {
                    flags.push("summary");
                }

                println!(
                    "  {} {} {} [{}] {} {}",
                    call.created_at.format("%Y-%m-%d %H:%M").to_string().dimmed(),
                    call.id.to_string().dimmed(),
                    who.cyan(),
                    status_badge(&call.status),
                    format!("{} {}", call.kind, format_duration(call.duration_ms)).dimmed(),
                    flags.join(",").dimmed()
                );
                if let Some(remote) = call.remote_call_id {
                    println!("      provider: {}", remote.dimmed());
                }
            }
        }

        CallsAction::Show { id } => {
            let call = client.get_call(&id).await?;

            println!("{} {}", "Call".bold(), call.id.to_string().cyan());
            println!("  Status: {}", status_badge(&call.status));
            println!("  Kind: {}", call.kind);
            print_field("Provider call", call.remote_call_id.as_deref());
            print_field("Lead", call.lead_name.as_deref());
            print_field("Lead ID", call.lead_id.as_deref());
            print_field("Phone", call.lead_phone.as_deref());
            println!("  Duration: {}", format_duration(call.duration_ms));
            print_field("Disconnection", call.disconnection_reason.as_deref());
            print_field("Recording", call.recording_url.as_deref());
            print_field("Error", call.error_detail.as_deref());
            println!("  Created: {}", call.created_at.to_rfc3339());
            println!("  Updated: {}", call.updated_at.to_rfc3339());

            if let Some(summary) = call.call_summary {
                println!("\n{}", "Summary:".bold());
                println!("{}", summary);
            }
            if let Some(transcript) = call.transcript {
                println!("\n{}", "Transcript:".bold());
                println!("{}", transcript);
            }
        }
    }

    Ok(())
}

async fn cmd_numbers(action: NumbersAction) -> Result<()> {
    let client = client()?;

    match action {
        NumbersAction::Import {
            phone_number,
            termination_uri,
            username,
            password,
            nickname,
            transport,
        } => {
            let number = client
                .import_number(&ImportPhoneNumberRequest {
                    phone_number,
                    termination_uri,
                    sip_trunk_auth_username: username,
                    sip_trunk_auth_password: password,
                    nickname,
                    transport,
                })
                .await?;

            println!(
                "{} Imported {} (agent: {})",
                "✓".green(),
                number.phone_number.cyan(),
                number.outbound_agent_id.as_deref().unwrap_or("-")
            );
        }

        NumbersAction::List => {
            let list = client.list_numbers().await?;

            if list.phone_numbers.is_empty() {
                println!("No phone numbers registered.");
                return Ok(());
            }

            println!("{} ({}):", "Phone numbers".bold(), list.count);
            for number in list.phone_numbers {
                println!(
                    "  {} {} {}",
                    number.phone_number.cyan(),
                    number.nickname.as_deref().unwrap_or("-").dimmed(),
                    number.outbound_agent_id.as_deref().unwrap_or("-").dimmed()
                );
            }
        }

        NumbersAction::Remove { phone_number } => {
            client.remove_number(&phone_number).await?;
            println!("{} Removed {}", "✓".green(), phone_number);
        }
    }

    Ok(())
}

fn cmd_config() -> Result<()> {
    let config = Config::load()?;

    println!("{}", "Configuration:".bold());
    println!("  Path: {:?}", Config::config_path()?);
    println!("  Base URL: {}", config.base_url);
    println!(
        "  API Key: {}",
        if config.api_key.is_some() {
            "Set".green()
        } else {
            "Not set".red()
        }
    );

    Ok(())
}

fn status_badge(status: &str) -> ColoredString {
    match status {
        "ended" => status.green(),
        "failed" => status.red(),
        "ongoing" => status.yellow(),
        _ => status.normal(),
    }
}

fn print_field(label: &str, value: Option<&str>) {
    if let Some(value) = value {
        println!("  {}: {}", label, value);
    }
}

/// Render milliseconds as `m:ss`
fn format_duration(duration_ms: Option<i64>) -> String {
    match duration_ms {
        Some(ms) => {
            let secs = ms / 1000;
            format!("{}:{:02}", secs / 60, secs % 60)
        }
        None => "-".to_string(),
    }
}
