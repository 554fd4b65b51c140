//! Operator CLI for the WAF gateway: liveness check, detection probe,
//! authorized shutdown.

use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "waf-cli")]
#[command(about = "Management CLI for the WAF gateway", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    /// Admin bearer key (shutdown only).
    #[arg(short, long, default_value = "")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check gateway liveness
    Status,
    /// Send a canned attack/clean corpus and report blocked vs. passed
    Probe {
        /// Probe through the reverse proxy with this token instead of `/`
        #[arg(long)]
        token: Option<String>,
    },
    /// Request graceful shutdown (requires --key)
    Shutdown,
}

/// (label, query payload, expect_block)
const PROBES: &[(&str, &str, bool)] = &[
    ("clean query", "rust web framework", false),
    ("xss script tag", "<script>alert(1)</script>", true),
    ("xss event handler", "<img src=x onerror=alert(1)>", true),
    ("sqli tautology", "' OR 1=1 --", true),
    ("sqli union", "UNION SELECT username, password FROM users", true),
    ("command injection", "; ls -la", true),
    ("command substitution", "$(whoami)", true),
    ("ssti", "{{7*7}}", true),
    ("nosql operator", "$where", true),
    ("ldap filter", "(uid=admin)", true),
    ("deserialization", "O:8:\"Exploit\":0:{}", true),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::builder().no_proxy().build()?;

    match cli.command {
        Commands::Status => {
            let res = client.get(format!("{}/health", cli.url)).send().await?;
            print_response(res).await?;
        }
        Commands::Probe { token } => {
            let base = match &token {
                Some(token) => format!("{}/waf/{}", cli.url, token),
                None => format!("{}/", cli.url),
            };
            let mut passed = 0usize;
            let mut failed = 0usize;
            for (label, payload, expect_block) in PROBES {
                let res = client.get(&base).query(&[("q", payload)]).send().await?;
                let blocked = res.status() == reqwest::StatusCode::FORBIDDEN;
                let ok = blocked == *expect_block;
                if ok {
                    passed += 1;
                } else {
                    failed += 1;
                }
                println!(
                    "[{}] {} (status {}, expected {})",
                    if ok { "ok" } else { "FAIL" },
                    label,
                    res.status(),
                    if *expect_block { "blocked" } else { "passed" },
                );
            }
            println!("\n{passed} ok, {failed} failed");
            if failed > 0 {
                std::process::exit(1);
            }
        }
        Commands::Shutdown => {
            let mut headers = HeaderMap::new();
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", cli.key))?,
            );
            let res = client
                .post(format!("{}/shutdown", cli.url))
                .headers(headers)
                .send()
                .await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: gateway returned status {status}");
        if let Ok(text) = res.text().await {
            eprintln!("Response: {text}");
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
