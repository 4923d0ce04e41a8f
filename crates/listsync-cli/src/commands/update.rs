//! Reconcile a registration export against the contact cache.

use std::path::PathBuf;

use chrono::{Duration, Utc};
use listsync_core::source::latest_export;
use listsync_core::sync::{plan, ReconcileReport};
use listsync_core::{Reconciler, RegistrationSet};

use super::context::Context;

pub async fn run(
    ctx: &Context,
    file: Option<PathBuf>,
    dry_run: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let path = match file {
        Some(path) => path,
        None => latest_export(&ctx.settings.paths.downloads)?,
    };
    tracing::info!(path = %path.display(), "reading registrations");

    let sheet = Some(ctx.settings.source.sheet.as_str()).filter(|s| !s.is_empty());
    let registrations = RegistrationSet::load_xlsx(&path, sheet)?;

    let cache = ctx.store().load()?;
    match cache.age(Utc::now()) {
        Some(age) => tracing::warn!(
            "using contact cache from {} ago, run `listsync contacts` to refresh it",
            describe_age(age)
        ),
        None => tracing::warn!("contact cache has no sync time, run `listsync contacts` to refresh it"),
    }

    if dry_run {
        for change in plan(&registrations, &cache, &ctx.settings.lists) {
            println!("{}\t{}", change.action, change.email);
        }
        return Ok(());
    }

    let client = ctx.client()?;
    let reconciler = Reconciler::new(&client, ctx.settings.lists.clone());
    match reconciler.reconcile(&registrations, &cache, &ctx.cancel).await {
        Ok(report) => {
            print_summary(&report);
            Ok(())
        }
        Err(e) => {
            print_summary(&e.report);
            for failure in e.failures() {
                eprintln!("failed: {failure}");
            }
            Err(e.into())
        }
    }
}

fn print_summary(report: &ReconcileReport) {
    println!(
        "{} created, {} updated, {} failed",
        report.created.len(),
        report.updated.len(),
        report.failures.len()
    );
}

fn describe_age(age: Duration) -> String {
    if age.num_days() > 0 {
        format!("{} days", age.num_days())
    } else if age.num_hours() > 0 {
        format!("{} hours", age.num_hours())
    } else {
        format!("{} minutes", age.num_minutes().max(0))
    }
}
