//! Whole-collection commands.

use super::{CommandResult, Profile};
use std::fs;
use std::path::Path;

/// Writes the export document to `output`, or stdout.
pub async fn export(profile: &Profile, output: Option<&Path>) -> CommandResult {
    let document = profile.shelf().export().await?;
    match output {
        Some(path) => {
            fs::write(path, document)?;
            println!("Exported to {}", path.display());
        }
        None => println!("{document}"),
    }
    Ok(())
}

/// Replaces the collection with the contents of `input`.
pub async fn import(profile: &Profile, input: &Path) -> CommandResult {
    let text = fs::read_to_string(input)?;
    let count = profile.shelf().import(&text).await?;
    println!("Imported {count} records");
    Ok(())
}

/// Seeds sample records into an empty shelf.
pub async fn seed(profile: &Profile) -> CommandResult {
    if profile.shelf().seed_if_empty().await? {
        println!("Added sample records");
    } else {
        println!("Shelf is not empty, nothing seeded");
    }
    Ok(())
}
