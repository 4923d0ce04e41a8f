use clap::Subcommand;
use listsync_core::credentials::{CredentialSource, ACCESS_TOKEN_ENV, API_KEY_ENV};
use listsync_core::Credentials;

#[derive(Subcommand)]
pub enum AuthAction {
    /// Store the API key and access token in the OS keyring
    Set {
        /// Application API key
        #[arg(long)]
        api_key: String,
        /// OAuth access token
        #[arg(long)]
        access_token: String,
    },
    /// Remove stored credentials
    Clear,
    /// Show where each credential is read from
    Status,
}

pub fn run(action: AuthAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        AuthAction::Set {
            api_key,
            access_token,
        } => {
            Credentials {
                api_key,
                access_token,
            }
            .store()?;
            println!("credentials stored");
        }
        AuthAction::Clear => {
            Credentials::clear()?;
            println!("credentials cleared");
        }
        AuthAction::Status => {
            let (api_key, access_token) = Credentials::sources();
            println!("api key: {}", describe(api_key, API_KEY_ENV));
            println!("access token: {}", describe(access_token, ACCESS_TOKEN_ENV));
        }
    }
    Ok(())
}

fn describe(source: CredentialSource, var: &str) -> String {
    match source {
        CredentialSource::Environment => format!("from ${var}"),
        CredentialSource::Keyring => "from keyring".to_string(),
        CredentialSource::Missing => "not set".to_string(),
    }
}
