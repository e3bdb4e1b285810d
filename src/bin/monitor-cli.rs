use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, COOKIE, SET_COOKIE};
use reqwest::redirect::Policy;
use serde_json::Value;

#[derive(Parser)]
#[command(name = "monitor-cli")]
#[command(about = "Operator CLI for the uplink monitor", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    /// Dashboard username (status and logs).
    #[arg(long, env = "MONITOR_USERNAME", default_value = "admin")]
    username: String,

    /// Dashboard password (status and logs).
    #[arg(long, env = "MONITOR_PASSWORD", default_value = "")]
    password: String,

    /// Shared reset token (reset).
    #[arg(long, env = "MONITOR_RESET_TOKEN", default_value = "")]
    reset_token: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the current connection status
    Status,
    /// Page through probe history, newest first
    Logs {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 25)]
        per_page: u32,
    },
    /// Re-arm the failure alert
    Reset,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    // Redirects carry the session cookie; follow nothing.
    let client = reqwest::Client::builder().redirect(Policy::none()).build()?;

    match &cli.command {
        Commands::Status => {
            let headers = login(&client, &cli).await?;
            let res = client
                .get(format!("{}/status", cli.url))
                .headers(headers)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Logs { page, per_page } => {
            let headers = login(&client, &cli).await?;
            let res = client
                .get(format!("{}/logs", cli.url))
                .query(&[("page", page), ("per_page", per_page)])
                .headers(headers)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Reset => {
            let res = client
                .post(format!("{}/reset-alert", cli.url))
                .header(AUTHORIZATION, HeaderValue::from_str(&cli.reset_token)?)
                .send()
                .await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

/// Log in and return headers carrying the session cookie.
async fn login(client: &reqwest::Client, cli: &Cli) -> Result<HeaderMap, Box<dyn std::error::Error>> {
    let res = client
        .post(format!("{}/login", cli.url))
        .form(&[("username", cli.username.as_str()), ("password", cli.password.as_str())])
        .send()
        .await?;

    let session = res
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|value| value.split(';').next())
        .find(|pair| pair.starts_with("token="))
        .map(str::to_string);

    let Some(session) = session else {
        return Err(format!("login failed with status {}", res.status()).into());
    };

    let mut headers = HeaderMap::new();
    headers.insert(COOKIE, HeaderValue::from_str(&session)?);
    Ok(headers)
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: monitor returned status {}", status);
        if let Ok(text) = res.text().await {
            if !text.is_empty() {
                eprintln!("Response: {}", text);
            }
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
