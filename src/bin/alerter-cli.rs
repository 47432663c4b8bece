use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Url;
use serde_json::Value;

#[derive(Parser)]
#[command(name = "alerter-cli")]
#[command(about = "Query a running health-alerter", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://127.0.0.1:8081")]
    url: String,

    /// API key, if the status endpoint requires one.
    #[arg(short, long, env = "ALERTER_API_KEY")]
    key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Liveness and staleness
    Health,
    /// Every alert with its state
    Status,
    /// A single alert
    Alert { name: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let url = endpoint(&cli.url, &cli.command)?;

    let mut headers = HeaderMap::new();
    if let Some(key) = &cli.key {
        headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {}", key))?);
    }

    let res = client.get(url).headers(headers).send().await?;
    let ok = print_response(res).await?;
    if !ok {
        std::process::exit(1);
    }
    Ok(())
}

/// Full URL for `command` under `base`. Alert names are percent-encoded.
fn endpoint(base: &str, command: &Commands) -> Result<Url, Box<dyn std::error::Error>> {
    let mut url = Url::parse(base)?;
    {
        let mut segments = url
            .path_segments_mut()
            .map_err(|_| format!("{} cannot be used as a base URL", base))?;
        segments.pop_if_empty();
        match command {
            Commands::Health => segments.push("healthz"),
            Commands::Status => segments.push("status"),
            Commands::Alert { name } => segments.extend(["status", "alerts", name.as_str()]),
        };
    }
    Ok(url)
}

async fn print_response(res: reqwest::Response) -> Result<bool, Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: status API returned {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(false);
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alert_name_is_encoded() {
        let alert = Commands::Alert { name: "model a/b?x".to_string() };
        let url = endpoint("http://127.0.0.1:8081", &alert).unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:8081/status/alerts/model%20a%2Fb%3Fx");
    }

    #[test]
    fn test_base_path_is_kept() {
        let url = endpoint("http://alerter.internal/ops/", &Commands::Health).unwrap();
        assert_eq!(url.as_str(), "http://alerter.internal/ops/healthz");

        let url = endpoint("http://alerter.internal/ops", &Commands::Status).unwrap();
        assert_eq!(url.as_str(), "http://alerter.internal/ops/status");
    }

    #[test]
    fn test_unusable_base_rejected() {
        assert!(endpoint("mailto:oncall@example.com", &Commands::Status).is_err());
        assert!(endpoint("not a url", &Commands::Status).is_err());
    }
}
