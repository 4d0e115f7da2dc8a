use clap::{Parser, Subcommand};
use serde::Serialize;
use stencil_sdk::StencilClient;

#[derive(Parser)]
#[command(name = "stencil-cli")]
#[command(about = "Query a running stencil status API", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:6275")]
    url: String,

    /// API version used in request paths
    #[arg(long, default_value_t = 1)]
    api_version: u32,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the API is up
    Ping,
    /// Show the full resolved configuration
    Config,
    /// Show the global values only
    Globals,
    /// List template names across every template source
    Templates,
    /// Show one template body
    Template {
        name: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = StencilClient::new(&cli.url).with_api_version(cli.api_version);

    match cli.command {
        Commands::Ping => print_json(&client.ping().await?)?,
        Commands::Config => print_json(&client.config().await?)?,
        Commands::Globals => print_json(&client.globals().await?)?,
        Commands::Templates => print_json(&client.templates().await?)?,
        Commands::Template { name } => match client.template(&name).await? {
            Some(template) => print_json(&template)?,
            None => {
                eprintln!("Error: template '{}' not found", name);
                std::process::exit(1);
            }
        },
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
