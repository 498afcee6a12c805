use clap::{Parser, Subcommand};

use attendance_portal::auth::password::hash_password;

#[derive(Parser)]
#[command(name = "portal-cli")]
#[command(about = "Operator CLI for the attendance portal", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print an argon2 hash for a `[[users]]` entry in the config file
    HashPassword {
        /// Password to hash; read from stdin when omitted
        password: Option<String>,
    },
    /// Check that the portal answers its health endpoint
    Health,
    /// Show who the portal thinks an anonymous caller is
    Whoami,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::HashPassword { password } => {
            let password = match password {
                Some(p) => p,
                None => {
                    let mut line = String::new();
                    std::io::stdin().read_line(&mut line)?;
                    line.trim_end_matches(['\r', '\n']).to_string()
                }
            };
            if password.is_empty() {
                return Err("password must not be empty".into());
            }
            println!("{}", hash_password(&password)?);
        }
        Commands::Health => {
            let client = reqwest::Client::new();
            let res = client.get(format!("{}/health", cli.url)).send().await?;
            let status = res.status();
            let body = res.text().await?;
            if !status.is_success() {
                eprintln!("Error: health check returned status {}", status);
                std::process::exit(1);
            }
            println!("{}", body);
        }
        Commands::Whoami => {
            let client = reqwest::Client::new();
            let res = client.get(format!("{}/whoami", cli.url)).send().await?;
            println!("{}", res.status());
            let json: serde_json::Value = res.json().await?;
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
    }

    Ok(())
}
