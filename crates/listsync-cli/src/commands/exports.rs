use std::time::Duration;

use clap::Subcommand;
use listsync_core::api::USER_AGENT;
use listsync_core::source::{download, latest_export};

use super::context::Context;

#[derive(Subcommand)]
pub enum ExportsAction {
    /// Print the most recent downloaded export
    Latest,
    /// Download an export link into the downloads directory
    Download {
        /// Export URL
        url: String,
    },
}

pub async fn run(ctx: &Context, action: ExportsAction) -> Result<(), Box<dyn std::error::Error>> {
    let downloads = &ctx.settings.paths.downloads;
    match action {
        ExportsAction::Latest => {
            println!("{}", latest_export(downloads)?.display());
        }
        ExportsAction::Download { url } => {
            let http = reqwest::Client::builder()
                .user_agent(USER_AGENT)
                .timeout(Duration::from_secs(ctx.settings.api.timeout_secs))
                .build()?;
            let path = download(&http, &url, downloads, &ctx.cancel).await?;
            println!("{}", path.display());
        }
    }
    Ok(())
}
