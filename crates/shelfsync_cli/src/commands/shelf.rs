//! Record commands.

use super::{CommandResult, Profile};
use shelfsync_codec::{Category, Record};
use shelfsync_shelf::{parse_tags, NewRecord, UNTITLED};

/// Adds a record.
pub async fn add(
    profile: &Profile,
    title: String,
    text: String,
    tags: &str,
    category: Category,
) -> CommandResult {
    let record = profile
        .shelf()
        .add(NewRecord {
            title,
            text,
            tags: parse_tags(tags),
            category,
        })
        .await?;
    println!("Added {}", record.id);
    Ok(())
}

/// Adds selected text as a record.
pub async fn capture(profile: &Profile, text: &str) -> CommandResult {
    let record = profile.shelf().capture(text).await?;
    println!("Captured {} \"{}\"", record.id, record.title);
    Ok(())
}

/// Lists records grouped by category, or as JSON.
pub async fn list(profile: &Profile, query: &str, format: &str) -> CommandResult {
    let shelf = profile.shelf();
    match format {
        "json" => {
            let records = shelf.search(query).await?;
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
        "text" => {
            for (category, records) in shelf.grouped(query).await? {
                println!("{} ({})", category, records.len());
                for record in &records {
                    print_record(record);
                }
            }
        }
        other => return Err(format!("Unknown format {other:?} (expected text or json)").into()),
    }
    Ok(())
}

/// Toggles favorite.
pub async fn favorite(profile: &Profile, id: &str) -> CommandResult {
    let record = profile.shelf().toggle_favorite(id).await?;
    println!("{} is now {}", record.id, record.category);
    Ok(())
}

/// Moves a record to a category.
pub async fn move_to(profile: &Profile, id: &str, category: Category) -> CommandResult {
    let record = profile.shelf().set_category(id, category).await?;
    println!("{} is now {}", record.id, record.category);
    Ok(())
}

/// Marks a record as used and prints its text.
pub async fn mark_used(profile: &Profile, id: &str) -> CommandResult {
    let record = profile.shelf().mark_used(id).await?;
    println!("{}", record.text);
    Ok(())
}

/// Deletes a record.
pub async fn delete(profile: &Profile, id: &str) -> CommandResult {
    let record = profile.shelf().delete(id).await?;
    println!("Deleted {}", record.id);
    Ok(())
}

fn print_record(record: &Record) {
    let title = if record.title.is_empty() {
        UNTITLED
    } else {
        record.title.as_str()
    };
    println!("  {}  {}", record.id, title);
    println!("      {}", record.text.replace('\n', "\n      "));
    if !record.tags.is_empty() {
        let tags: Vec<String> = record.tags.iter().map(|t| format!("#{t}")).collect();
        println!("      {}", tags.join(" "));
    }
}
