mod api;
mod config;
mod errors;
mod gateway;
mod models;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::api::profiles::{Section, UploadFile};
use crate::api::BackendClient;
use crate::config::Config;
use crate::errors::ClientError;
use crate::gateway::Gateway;
use crate::models::draft::{DraftType, NewDraft};
use crate::models::generation::{GenerationRequest, TemplateStyle};
use crate::models::user::{EmailToken, NewAccount, SessionStatus};

#[derive(Debug, Parser)]
#[command(version, about = "Command-line client for the resume and cover letter backend")]
struct Cli {
    /// Backend base URL (overrides API_BASE_URL)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Per-request timeout in seconds (overrides REQUEST_TIMEOUT_SECS)
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Start a session
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "API_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// End the session
    Logout,
    /// Create an account; the backend emails an activation link
    Signup {
        #[arg(long)]
        email: String,
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long, env = "API_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Activate an account with the uid and token from its email link
    Activate { uid: String, token: String },
    /// Email a password reset link
    ResetPassword {
        #[arg(long)]
        email: String,
    },
    /// Set a new password with the uid and token from a reset link
    ConfirmReset {
        uid: String,
        token: String,
        #[arg(long, env = "API_NEW_PASSWORD", hide_env_values = true)]
        new_password: String,
    },
    /// Show the signed-in user
    Whoami,
    /// Show whether the user is logged out, onboarding, or ready
    Status,
    /// Show the full profile
    Profile,
    /// Show onboarding completeness
    Onboarding,
    /// Extract profile data from a resume file
    ParseResume { file: PathBuf },
    /// Upload a resume file to the profile
    UploadResume { file: PathBuf },
    /// Generate a resume or cover letter for a job description
    Generate {
        kind: DocumentKind,
        #[arg(long)]
        job_description_file: PathBuf,
        #[arg(long, default_value_t = TemplateStyle::Modern)]
        template: TemplateStyle,
        #[arg(long, default_value = "")]
        job_title: String,
        #[arg(long, default_value = "")]
        company: String,
        /// Save the generated document as a draft
        #[arg(long)]
        save: bool,
    },
    /// Manage saved drafts
    Drafts {
        #[command(subcommand)]
        action: DraftAction,
    },
    /// Create, update or delete a profile entry
    Entry {
        #[command(subcommand)]
        action: EntryAction,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DocumentKind {
    Resume,
    CoverLetter,
}

#[derive(Debug, Subcommand)]
enum DraftAction {
    List,
    Show { id: i64 },
    Delete { id: i64 },
}

#[derive(Debug, Subcommand)]
enum EntryAction {
    /// Create an entry, or update it when --id is given
    Save {
        section: Section,
        #[arg(long)]
        id: Option<i64>,
        /// Entry fields as a JSON object
        #[arg(long)]
        json: String,
    },
    Delete {
        section: Section,
        id: i64,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = Config::from_env()?;

    // Logs go to stderr; stdout carries command output.
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let base_url = cli.base_url.clone().unwrap_or(config.api_base_url.clone());
    let timeout = cli
        .timeout_secs
        .map(Duration::from_secs)
        .unwrap_or(config.request_timeout);
    let gateway = Gateway::new(base_url, timeout)?;
    info!(
        "Using backend {} (timeout {}s)",
        gateway.base_url(),
        timeout.as_secs()
    );
    let client = BackendClient::new(gateway);

    match run(&client, cli.command).await {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(CommandError::Client(e)) => {
            error!("{e}");
            eprintln!("{}", e.user_message());
            Ok(ExitCode::FAILURE)
        }
        Err(CommandError::Other(e)) => Err(e),
    }
}

/// Backend failures are reported with their user-facing message; anything
/// else aborts with the full error chain.
enum CommandError {
    Client(ClientError),
    Other(anyhow::Error),
}

impl From<ClientError> for CommandError {
    fn from(e: ClientError) -> Self {
        CommandError::Client(e)
    }
}

impl From<anyhow::Error> for CommandError {
    fn from(e: anyhow::Error) -> Self {
        CommandError::Other(e)
    }
}

async fn run(client: &BackendClient, command: Command) -> Result<(), CommandError> {
    match command {
        Command::Login { email, password } => {
            client.login(&email, &password).await?;
            println!("Logged in as {email}.");
        }
        Command::Logout => {
            client.logout().await?;
            println!("Logged out.");
        }
        Command::Signup {
            email,
            first_name,
            last_name,
            password,
        } => {
            client
                .signup(&NewAccount::new(first_name, last_name, email.clone(), password))
                .await?;
            println!("Account created. Check {email} for the activation link.");
        }
        Command::Activate { uid, token } => {
            client.activate(&EmailToken { uid, token }).await?;
            println!("Account activated. You can log in now.");
        }
        Command::ResetPassword { email } => {
            client.request_password_reset(&email).await?;
            println!("If {email} has an account, a reset link is on its way.");
        }
        Command::ConfirmReset {
            uid,
            token,
            new_password,
        } => {
            client
                .confirm_password_reset(EmailToken { uid, token }, &new_password)
                .await?;
            println!("Password updated. You can log in now.");
        }
        Command::Whoami => {
            let user = client.current_user().await?;
            print_json(&serde_json::json!({
                "email": user.email,
                "first_name": user.first_name,
                "last_name": user.last_name,
                "initials": user.initials(),
            }))?;
        }
        Command::Status => match client.session_status().await {
            SessionStatus::LoggedOut => return Err(ClientError::NotAuthenticated.into()),
            SessionStatus::NeedsOnboarding(user) => {
                println!("{} needs to finish onboarding.", user.email)
            }
            SessionStatus::Ready(user) => println!("{} is ready.", user.email),
        },
        Command::Profile => print_json(&client.profile().await?)?,
        Command::Onboarding => print_json(&client.onboarding().await?)?,
        Command::ParseResume { file } => {
            let upload = UploadFile::from_path(&file).await?;
            print_json(&client.parse_resume(&upload).await?)?;
        }
        Command::UploadResume { file } => {
            let upload = UploadFile::from_path(&file).await?;
            print_json(&client.upload_resume(&upload).await?)?;
        }
        Command::Generate {
            kind,
            job_description_file,
            template,
            job_title,
            company,
            save,
        } => {
            let job_description = tokio::fs::read_to_string(&job_description_file)
                .await
                .with_context(|| {
                    format!("failed to read {}", job_description_file.display())
                })?;
            let request = GenerationRequest::new(job_description.clone(), template);

            let (draft_type, content) = match kind {
                DocumentKind::Resume => (
                    DraftType::Resume,
                    to_value(&client.generate_resume(&request).await?)?,
                ),
                DocumentKind::CoverLetter => (
                    DraftType::CoverLetter,
                    to_value(&client.generate_cover_letter(&request).await?)?,
                ),
            };
            print_json(&content)?;

            if save {
                let saved = client
                    .save_draft(&NewDraft {
                        draft_type,
                        job_title,
                        company,
                        job_description,
                        template_style: template,
                        content,
                    })
                    .await?;
                eprintln!("Saved draft {} ({}).", saved.id, saved.label());
            }
        }
        Command::Drafts { action } => match action {
            DraftAction::List => print_json(&client.list_drafts().await?)?,
            DraftAction::Show { id } => print_json(&client.get_draft(id).await?)?,
            DraftAction::Delete { id } => {
                client.delete_draft(id).await?;
                println!("Deleted draft {id}.");
            }
        },
        Command::Entry { action } => match action {
            EntryAction::Save { section, id, json } => {
                let payload = parse_entry_payload(&json)?;
                print_json(&client.save_entry(section, id, &payload).await?)?;
            }
            EntryAction::Delete { section, id } => {
                client.delete_entry(section, id).await?;
                println!("Deleted {section} entry {id}.");
            }
        },
    }
    Ok(())
}

fn parse_entry_payload(raw: &str) -> Result<serde_json::Value> {
    let payload: serde_json::Value =
        serde_json::from_str(raw).context("--json is not valid JSON")?;
    if !payload.is_object() {
        bail!("--json must be a JSON object, got {payload}");
    }
    Ok(payload)
}

fn to_value<T: Serialize>(value: &T) -> Result<serde_json::Value> {
    serde_json::to_value(value).context("failed to encode generated draft")
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
