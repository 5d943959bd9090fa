//! Sync commands.

use super::{CommandResult, Profile};
use shelfsync_sync_engine::{PullOutcome, PushOutcome, SkipReason};

/// Runs one pull-then-push round against the remote file.
pub async fn run(profile: &Profile) -> CommandResult {
    let controller = profile.controller();
    if !controller.load_settings().await? {
        println!("Sync is disabled (run `shelfsync enable`)");
        return Ok(());
    }

    let (pulled, pushed) = controller.sync_now().await?;
    match pulled {
        PullOutcome::Applied {
            records,
            added,
            replaced,
        } => println!("Pulled: {records} records ({added} new, {replaced} updated)"),
        PullOutcome::Unchanged => println!("Pulled: already up to date"),
        PullOutcome::NoRemoteData => println!("Pulled: remote is empty"),
        PullOutcome::Skipped(reason) => println!("Pulled: skipped ({})", describe(reason)),
    }
    match pushed {
        PushOutcome::Pushed {
            chunk_count,
            fingerprint,
            removed_stale,
        } => {
            println!("Pushed: {chunk_count} chunks, fingerprint {fingerprint}");
            if removed_stale > 0 {
                println!("        removed {removed_stale} stale chunks");
            }
        }
        PushOutcome::Skipped(reason) => println!("Pushed: skipped ({})", describe(reason)),
    }
    Ok(())
}

/// Enables or disables sync for the profile.
pub async fn set_enabled(profile: &Profile, enabled: bool) -> CommandResult {
    profile.controller().set_enabled(enabled).await?;
    println!("Sync {}", if enabled { "enabled" } else { "disabled" });
    Ok(())
}

/// Prints shelf size, sync flag and the remote index.
pub async fn status(profile: &Profile) -> CommandResult {
    let controller = profile.controller();
    let enabled = shelfsync_sync_engine::read_enabled(
        profile.local.as_ref(),
        &controller.config().enabled_key,
    )
    .await;
    let records = profile.shelf().records().await?;

    println!("Profile:  {}", profile.local_path().display());
    println!("Remote:   {}", profile.remote.path().display());
    println!("Sync:     {}", if enabled { "enabled" } else { "disabled" });
    println!("Records:  {}", records.len());

    match controller.read_index().await? {
        Some(index) if index.has_data() => {
            println!(
                "Remote:   {} chunks, fingerprint {}, written at {} ms",
                index.chunk_count, index.fingerprint, index.written_at
            );
        }
        _ => println!("Remote:   no data"),
    }
    Ok(())
}

fn describe(reason: SkipReason) -> &'static str {
    match reason {
        SkipReason::Disabled => "sync disabled",
        SkipReason::Echo => "nothing new",
        SkipReason::RemoteHasData => "remote has data",
        SkipReason::NothingToPush => "nothing to push",
    }
}
