use listsync_core::sync::{non_reserved, prune_lists};
use listsync_core::ContactList;

use super::context::Context;

pub async fn run(ctx: &Context, prune: bool, dry_run: bool) -> Result<(), Box<dyn std::error::Error>> {
    let client = ctx.client()?;

    if !prune {
        let (lists, _) = client.lists().get_all(&ctx.cancel).await?;
        for list in non_reserved(&lists, &ctx.settings.lists) {
            println!("{}", describe(list));
        }
        return Ok(());
    }

    let outcome = prune_lists(&client, &ctx.settings.lists, dry_run, &ctx.cancel).await?;
    let verb = if outcome.dry_run { "would delete" } else { "deleted" };
    for list in &outcome.removed {
        println!("{verb} {}", describe(list));
    }
    println!("{} {verb}, {} kept", outcome.removed.len(), outcome.kept.len());
    Ok(())
}

fn describe(list: &ContactList) -> String {
    format!(
        "{} [{}]: {}",
        list.name.as_deref().unwrap_or("<unnamed>"),
        list.id.as_deref().unwrap_or("-"),
        list.status.as_deref().unwrap_or("-"),
    )
}
