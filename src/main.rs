use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use serde_json::json;
use tes_auth::{
    AuthClient, AuthClientConfig, AuthError, DEFAULT_TIMEOUT, ENV_CLIENT_ID, ENV_CLIENT_SECRET,
    ENV_OIDC_URL, ENV_TIMEOUT_SECS, GrantType,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "tes-auth",
    about = "Introspect, exchange and provision OAuth tokens for a TES executor. Prints JSON."
)]
struct Cli {
    #[command(flatten)]
    provider: ProviderArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Args)]
struct ProviderArgs {
    #[arg(long, env = ENV_CLIENT_ID)]
    client_id: String,

    #[arg(long, env = ENV_CLIENT_SECRET, hide_env_values = true)]
    client_secret: String,

    #[arg(long, env = ENV_OIDC_URL)]
    oidc_url: String,

    /// Request timeout in seconds; 0 disables it.
    #[arg(long, env = ENV_TIMEOUT_SECS, default_value_t = DEFAULT_TIMEOUT.as_secs())]
    timeout_secs: u64,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Check whether a token is still active.
    Introspect {
        #[arg(long)]
        token: String,
    },
    /// Exchange a token for one with other scopes or audience.
    Exchange {
        #[arg(long)]
        token: String,
        #[arg(long, default_value_t = GrantType::TokenExchange)]
        grant_type: GrantType,
        #[arg(long = "scope", required = true)]
        scopes: Vec<String>,
        #[arg(long)]
        audience: Option<String>,
    },
    /// Register a new client authorized by a bearer token.
    Register {
        #[arg(long)]
        token: String,
        #[arg(long)]
        name: String,
        #[arg(long = "resource-id")]
        resource_ids: Vec<String>,
        #[arg(long = "scope")]
        scopes: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), AuthError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let client = AuthClient::new(cli.provider.into_config())?;

    let output = match cli.command {
        Command::Introspect { token } => json!({ "active": client.is_token_valid(&token).await? }),
        Command::Exchange {
            token,
            grant_type,
            scopes,
            audience,
        } => {
            let access_token = client
                .exchange_access_token(&token, grant_type, &scopes, audience.as_deref())
                .await?;
            json!({ "access_token": access_token })
        }
        Command::Register {
            token,
            name,
            resource_ids,
            scopes,
        } => {
            let registered = client
                .register_client(&token, &name, &resource_ids, &scopes)
                .await?;
            json!({
                "client_id": registered.client_id,
                "client_secret": registered.client_secret,
            })
        }
    };

    let output =
        serde_json::to_string_pretty(&output).map_err(|err| AuthError::MalformedResponse {
            message: err.to_string(),
            body: String::new(),
        })?;

    println!("{output}");
    Ok(())
}

impl ProviderArgs {
    fn into_config(self) -> AuthClientConfig {
        let config = AuthClientConfig::new(self.client_id, self.client_secret, self.oidc_url);
        match self.timeout_secs {
            0 => config.without_timeout(),
            secs => config.with_timeout(Duration::from_secs(secs)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REQUIRED: [&str; 7] = [
        "tes-auth",
        "--client-id",
        "tes-client",
        "--client-secret",
        "tes-secret",
        "--oidc-url",
        "https://idp.example.com",
    ];

    fn parse(extra: &[&str]) -> Cli {
        Cli::try_parse_from(REQUIRED.iter().chain(extra)).unwrap()
    }

    #[test]
    fn timeout_defaults_to_library_default() {
        let cli = parse(&["introspect", "--token", "abc"]);
        assert_eq!(cli.provider.timeout_secs, DEFAULT_TIMEOUT.as_secs());
        assert_eq!(cli.provider.into_config().timeout, Some(DEFAULT_TIMEOUT));
    }

    #[test]
    fn zero_timeout_disables_it() {
        let cli = parse(&["--timeout-secs", "0", "introspect", "--token", "abc"]);
        assert_eq!(cli.provider.into_config().timeout, None);
    }

    #[test]
    fn exchange_defaults_to_token_exchange_grant() {
        let cli = parse(&["exchange", "--token", "abc", "--scope", "read", "--scope", "write"]);
        match cli.command {
            Command::Exchange {
                grant_type, scopes, ..
            } => {
                assert_eq!(grant_type, GrantType::TokenExchange);
                assert_eq!(scopes, ["read", "write"]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
