//! Books an appointment from the terminal using the same form logic as the
//! web page: load the catalog, prefill from the saved session, submit.

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use dotenv::dotenv;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use booking_form_cell::session::load_session;
use booking_form_cell::view::render;
use booking_form_cell::{BookingForm, FormState, HttpBookingApi};
use shared_config::ClientConfig;

#[derive(Debug, Parser)]
#[command(name = "book-appointment", about = "Book a clinic appointment")]
struct Cli {
    /// Base URL of the clinic API; falls back to `BOOKING_API_URL`.
    #[arg(long)]
    api_url: Option<String>,

    /// Base URL of the service catalog; falls back to `BOOKING_CATALOG_URL`,
    /// then to the API URL.
    #[arg(long)]
    catalog_url: Option<String>,

    /// JSON file holding `{name, email, token}` saved at login; falls back
    /// to `BOOKING_SESSION_FILE`.
    #[arg(long)]
    session: Option<PathBuf>,

    /// Service id; defaults to the first service in the catalog.
    #[arg(long)]
    service: Option<i64>,

    /// Appointment date, `YYYY-MM-DD`.
    #[arg(long)]
    date: String,

    /// Appointment time, `HH:MM`.
    #[arg(long)]
    time: String,

    #[arg(long)]
    mobile: String,

    /// Overrides the name saved in the session.
    #[arg(long)]
    name: Option<String>,

    /// Overrides the email saved in the session.
    #[arg(long)]
    email: Option<String>,

    #[arg(long, default_value = "")]
    description: String,
}

impl Cli {
    /// Command-line flags win over the environment.
    fn client_config(&self) -> ClientConfig {
        let mut config = ClientConfig::from_env();
        if let Some(api_url) = &self.api_url {
            config.api_base_url = api_url.clone();
            if self.catalog_url.is_none() && env::var("BOOKING_CATALOG_URL").is_err() {
                config.catalog_base_url = api_url.clone();
            }
        }
        if let Some(catalog_url) = &self.catalog_url {
            config.catalog_base_url = catalog_url.clone();
        }
        if let Some(session) = &self.session {
            config.session_file = Some(session.clone());
        }
        config
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<bool> {
    let config = cli.client_config();

    let session = match &config.session_file {
        Some(path) => load_session(path)
            .with_context(|| format!("could not load session from {}", path.display()))?,
        None => None,
    };

    let api = HttpBookingApi::new(&config);
    let mut form = BookingForm::new(session);
    form.mount(&api).await;

    if let Some(service_id) = cli.service {
        if !form.select_service(service_id) {
            anyhow::bail!("service {} is not in the catalog", service_id);
        }
    }

    form.fields.date = cli.date;
    form.fields.time = cli.time;
    form.fields.mobile_number = cli.mobile;
    form.fields.description = cli.description;
    if let Some(name) = cli.name {
        form.fields.patient_name = name;
    }
    if let Some(email) = cli.email {
        form.fields.email = email;
    }

    // Guard failures are already reflected in the form's message.
    let _ = form.submit(&api).await;

    print!("{}", render(&form));
    if let Some(path) = form.redirect() {
        println!("Redirecting to {}", path);
    }

    info!("Booking finished in state {:?}", form.state());
    Ok(form.state() == FormState::Booked)
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok();
    init_tracing();

    match run(Cli::parse()).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(error) => {
            eprintln!("Error: {error:#}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_booking_arguments() {
        let cli = Cli::try_parse_from([
            "book-appointment",
            "--api-url", "http://clinic.test/api",
            "--date", "2024-05-01",
            "--time", "10:00",
            "--mobile", "9998887776",
            "--service", "1",
        ])
        .unwrap();

        assert_eq!(cli.service, Some(1));
        assert_eq!(cli.description, "");
        assert_eq!(cli.client_config().api_base_url, "http://clinic.test/api");
    }

    #[test]
    fn test_catalog_url_flag_overrides_api_host() {
        let cli = Cli::try_parse_from([
            "book-appointment",
            "--api-url", "http://clinic.test/api",
            "--catalog-url", "http://catalog.test",
            "--date", "2024-05-01",
            "--time", "10:00",
            "--mobile", "9998887776",
        ])
        .unwrap();

        let config = cli.client_config();
        assert_eq!(config.api_base_url, "http://clinic.test/api");
        assert_eq!(config.catalog_base_url, "http://catalog.test");
    }
}
