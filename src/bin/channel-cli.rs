use clap::{Parser, Subcommand};
use reqwest::header::LOCATION;
use reqwest::redirect::Policy;
use serde_json::{json, Value};

use channel_redirect::config::AccessConfig;
use channel_redirect::redirect::resolver::split_channel_path;
use channel_redirect::redirect::AccessProof;

#[derive(Parser)]
#[command(name = "channel-cli")]
#[command(about = "Management CLI for the channel redirector", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:3000")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

/// Fields shared by create and update.
#[derive(clap::Args)]
struct ChannelArgs {
    /// Channel id
    channel_id: String,
    /// Target host or IP
    #[arg(long)]
    host: String,
    /// Target port
    #[arg(long)]
    port: String,
    /// Administrative password
    #[arg(short, long)]
    password: String,
    /// Redirect with https
    #[arg(long)]
    https: bool,
    /// Access password gating the redirect
    #[arg(long, default_value = "")]
    access_key: String,
}

impl ChannelArgs {
    fn to_json(&self) -> Value {
        json!({
            "channel_id": self.channel_id,
            "password": self.password,
            "host": self.host,
            "port": self.port,
            "https": self.https,
            "accessKey": self.access_key,
        })
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Register a new channel
    Create(ChannelArgs),
    /// Replace an existing channel's target
    Update(ChannelArgs),
    /// Check an access password and print the proof cookie
    Verify {
        channel_id: String,
        #[arg(long)]
        access_key: String,
    },
    /// Show where a channel path redirects
    Resolve {
        /// Path including the channel id, e.g. "abc/docs?page=2"
        path: String,
        /// Proof cookie value for a gated channel
        #[arg(long)]
        access_key: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::builder().redirect(Policy::none()).build()?;
    let base = cli.url.trim_end_matches('/');

    let ok = match cli.command {
        Commands::Create(args) => {
            let res = client
                .post(format!("{}/api/create", base))
                .json(&args.to_json())
                .send()
                .await?;
            print_response(res).await?
        }
        Commands::Update(args) => {
            let res = client
                .post(format!("{}/api/update", base))
                .json(&args.to_json())
                .send()
                .await?;
            print_response(res).await?
        }
        Commands::Verify {
            channel_id,
            access_key,
        } => {
            let res = client
                .post(format!("{}/api/verify", base))
                .json(&json!({ "channel_id": channel_id, "accessKey": access_key }))
                .send()
                .await?;
            if let Some(cookie) = res.headers().get(reqwest::header::SET_COOKIE) {
                println!("Set-Cookie: {}", cookie.to_str()?);
            }
            print_response(res).await?
        }
        Commands::Resolve { path, access_key } => {
            let path = path.trim_start_matches('/');
            let mut req = client.get(format!("{}/{}", base, path));
            if let Some(key) = access_key {
                let route = path.split('?').next().unwrap_or_default();
                let (channel_id, _) =
                    split_channel_path(&format!("/{}", route)).ok_or("missing channel id")?;
                let proof = AccessProof {
                    name: format!("{}{}", AccessConfig::default().cookie_prefix, channel_id),
                    value: key,
                    max_age_secs: 0,
                };
                req = req.header(reqwest::header::COOKIE, proof.to_cookie_pair());
            }
            let res = req.send().await?;
            match res.headers().get(LOCATION) {
                Some(location) => {
                    println!("{} -> {}", res.status(), location.to_str()?);
                    true
                }
                None if res.status().is_success() => {
                    println!("{}: access password required", res.status());
                    false
                }
                None => print_response(res).await?,
            }
        }
    };

    if !ok {
        std::process::exit(1);
    }
    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<bool, Box<dyn std::error::Error>> {
    let status = res.status();
    let body = res.text().await?;
    if status.is_success() {
        println!("{}", body);
    } else {
        eprintln!("Error: server returned status {}", status);
        eprintln!("Response: {}", body);
    }
    Ok(status.is_success())
}
