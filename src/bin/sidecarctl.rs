use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "sidecarctl")]
#[command(about = "Management CLI for a running agent sidecar", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    /// Notification path the sidecar listens on.
    #[arg(long, default_value = "/xapp_notification/")]
    notification_path: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a supervision probe
    Probe,
    /// Post a change notification, triggering a reconfiguration
    Notify {
        /// Notification payload (opaque to the sidecar)
        #[arg(long, default_value = "{}")]
        body: String,
    },
    /// Print the agent configuration the sidecar last wrote
    Config,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let res = match cli.command {
        Commands::Probe => client.get(format!("{}/supervision/", base)).send().await?,
        Commands::Notify { body } => {
            client
                .post(format!("{}{}", base, cli.notification_path))
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(body)
                .send()
                .await?
        }
        Commands::Config => client.get(format!("{}/ric/v1/symptomdata", base)).send().await?,
    };
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;
    if !status.is_success() {
        eprintln!("Error: sidecar returned status {}", status);
        if !text.is_empty() {
            eprintln!("Response: {}", text);
        }
        std::process::exit(1);
    }

    if text.is_empty() {
        println!("{}", status);
    } else {
        println!("{}", text.trim_end());
    }
    Ok(())
}
