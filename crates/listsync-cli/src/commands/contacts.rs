//! Contact cache commands: refresh, dump and bulk enrolment.

use listsync_core::sync::enroll_cached;
use listsync_core::drain_contacts;

use super::context::Context;

/// Drain the remote collection and overwrite the cache.
pub async fn sync(ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let client = ctx.client()?;
    let cache = drain_contacts(&client, &ctx.cancel).await?;
    let store = ctx.store();
    store.save(&cache)?;
    println!("{} contacts cached in {}", cache.len(), store.path().display());
    Ok(())
}

pub fn output(ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let cache = ctx.store().load()?;
    println!("EMAIL\tFNAME\tLNAME");
    for (email, contact) in cache.iter() {
        println!(
            "{email}\t{}\t{}",
            contact.first_name.as_deref().unwrap_or_default(),
            contact.last_name.as_deref().unwrap_or_default(),
        );
    }
    Ok(())
}

/// Queue one bulk import of every cached contact into the unregistered list.
pub async fn load(ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let cache = ctx.store().load()?;
    let client = ctx.client()?;
    let ack = enroll_cached(&client, &cache, &ctx.settings.lists, &ctx.cancel).await?;
    println!("import job {} queued for {} contacts", ack.id, cache.len());
    Ok(())
}
