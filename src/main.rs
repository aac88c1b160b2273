#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use idlink::{
    init_provider, BackendSignIn, IdlinkSettings, Provider, ProviderChoice, ProviderPage,
};

#[derive(Parser, Debug)]
#[command(name = "idlink", version = idlink::VERSION, about = "Identity federation demo client")]
struct Cli {
    /// Identity provider to use
    #[arg(long, short, default_value = "cognito", value_parser = parse_provider)]
    provider: Provider,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the identity providers to choose from
    Providers,
    /// Print the hosted-login URL to open in a browser
    SignInUrl,
    /// Print the logout URL to open in a browser
    SignOutUrl,
    /// Show the page for an identity token, including its claims
    Claims {
        #[arg(long, env = "IDLINK_ID_TOKEN", hide_env_values = true)]
        id_token: String,
    },
    /// Establish a backend session with an identity token
    BackendSignIn {
        #[arg(long, env = "IDLINK_ID_TOKEN", hide_env_values = true)]
        id_token: String,
    },
}

fn parse_provider(value: &str) -> Result<Provider, String> {
    value.parse::<Provider>().map_err(|e| e.to_string())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration from Settings.toml and environment variables
    // This also loads .env file and initializes the logger
    let settings = IdlinkSettings::load()
        .map_err(|e| anyhow::anyhow!("Failed to load settings: {e}"))?;

    if let Command::Providers = cli.command {
        for (provider, display_name) in ProviderChoice::options() {
            println!("{provider:<8} {display_name}");
        }
        return Ok(());
    }

    let identity_provider = init_provider(cli.provider, &settings)
        .with_context(|| format!("Failed to initialize {}", cli.provider.display_name()))?;
    let backend = BackendSignIn::from_settings(&settings.backend)
        .context("Failed to initialize backend client")?;
    let mut page = ProviderPage::new(identity_provider, backend);

    match cli.command {
        Command::Providers => {}
        Command::SignInUrl => println!("{}", page.sign_in()?.url),
        Command::SignOutUrl => println!("{}", page.sign_out()?.url),
        Command::Claims { id_token } => {
            page.complete_sign_in(&id_token)?;
            print!("{}", page.summary());
        }
        Command::BackendSignIn { id_token } => {
            page.complete_sign_in(&id_token)?;
            let signed_in = page.sign_in_backend().await?;
            print!("{}", page.summary());
            if !signed_in {
                bail!("Backend sign-in failed");
            }
        }
    }
    Ok(())
}
