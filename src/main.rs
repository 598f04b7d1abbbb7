use anyhow::{Context, Result};
use chrono::Utc;
use dialoguer::{Input, Password};
use std::sync::Arc;

use healthtrack_client::auth::{RegisterRequest, SessionStore};
use healthtrack_client::config::{self, Command};
use healthtrack_client::http_client::{HealthtrackHttpClient, Navigator};
use healthtrack_client::models::NewMeasurement;
use healthtrack_client::utils::{display_or_dash, format_date};

/// Forced-logout boundary for the CLI
///
/// There is no page to redirect to, so the user is told how to get back in.
struct CliNavigator;

impl Navigator for CliNavigator {
    fn redirect_to_login(&self) {
        eprintln!("Session expired. Run `healthtrack login` to sign in again.");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (for log level)
    let (config, command) = config::Config::load()?;
    config.validate()?;

    // Initialize logging with the configured level
    let log_level = config.log_level.to_lowercase();
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("API base URL: {}", config.api_base_url);
    tracing::debug!("Session file: {}", config.session_file.display());

    let session = Arc::new(SessionStore::open(&config.session_file)?);

    let client = HealthtrackHttpClient::new(
        config.api_base_url.clone(),
        session.clone(),
        Arc::new(CliNavigator),
        config.http_max_connections,
        config.http_connect_timeout,
        config.http_request_timeout,
    )?;

    match command {
        Command::Login { username } => {
            let username = match username {
                Some(u) => u,
                None => Input::new()
                    .with_prompt("Username")
                    .interact_text()
                    .context("Failed to read username")?,
            };
            let password = Password::new()
                .with_prompt("Password")
                .interact()
                .context("Failed to read password")?;

            let user = client.login(&username, &password).await?;
            println!(
                "Signed in as {} ({})",
                user.username,
                user.role.as_deref().unwrap_or("user")
            );
        }

        Command::Register => {
            let username: String = Input::new()
                .with_prompt("Username")
                .interact_text()
                .context("Failed to read username")?;
            let email: String = Input::new()
                .with_prompt("Email")
                .interact_text()
                .context("Failed to read email")?;
            let password = Password::new()
                .with_prompt("Password")
                .with_confirmation("Confirm password", "Passwords do not match")
                .interact()
                .context("Failed to read password")?;

            let user = client
                .register(RegisterRequest {
                    username,
                    email,
                    first_name: None,
                    last_name: None,
                    password: password.clone(),
                    password2: password,
                    department: None,
                })
                .await?;
            println!("Account created: {}. Run `healthtrack login`.", user.username);
        }

        Command::Logout => {
            client.logout().await?;
            println!("Signed out.");
        }

        Command::Whoami => {
            if !session.is_authenticated().await {
                anyhow::bail!("Not signed in. Run `healthtrack login` first.");
            }
            let user = client.current_user().await?;
            println!("{} (id {})", user.username, user.id);
            if let Some(email) = &user.email {
                println!("  email: {}", email);
            }
            if let Some(role) = &user.role {
                println!("  role: {}", role);
            }
        }

        Command::Measurements => {
            let measurements = client.my_measurements().await?;
            if measurements.is_empty() {
                println!("No measurements recorded.");
                return Ok(());
            }

            println!(
                "{:<17} {:>8} {:>8} {:>9} {:>6} notes",
                "measured at", "weight", "bp", "glucose", "hr"
            );
            for m in &measurements {
                let bp = match (m.systolic, m.diastolic) {
                    (Some(s), Some(d)) => format!("{}/{}", s, d),
                    _ => "--".to_string(),
                };
                println!(
                    "{:<17} {:>8} {:>8} {:>9} {:>6} {}",
                    format_date(Some(m.measured_at)),
                    display_or_dash(&m.weight_kg),
                    bp,
                    display_or_dash(&m.blood_glucose),
                    display_or_dash(&m.heart_rate),
                    m.notes.as_deref().unwrap_or("")
                );
            }
        }

        Command::Record {
            weight,
            systolic,
            diastolic,
            glucose,
            heart_rate,
            notes,
        } => {
            if weight.is_none()
                && systolic.is_none()
                && diastolic.is_none()
                && glucose.is_none()
                && heart_rate.is_none()
            {
                anyhow::bail!("Nothing to record: provide at least one vital sign");
            }

            let created = client
                .create_measurement(&NewMeasurement {
                    measured_at: Utc::now(),
                    weight_kg: weight,
                    systolic,
                    diastolic,
                    blood_glucose: glucose,
                    heart_rate,
                    notes,
                })
                .await?;
            println!(
                "Recorded measurement {} at {}",
                created.id,
                format_date(Some(created.measured_at))
            );
        }
    }

    Ok(())
}
