//! Parser for catalog data files.
//!
//! All files are UTF-8, one record per line, fields separated by `::`:
//! - users.dat: userId::username
//! - items.dat: itemId::creatorId::category::durationSecs::viewCount::likeCount::createdAtUnix::status::visibility::tags
//! - interactions.dat: userId::itemId::kind::timestampUnix
//!
//! Tags are pipe-separated and may be empty: "rust|async|tokio".

use crate::error::{DataLoadError, Result};
use crate::types::*;
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::str::{FromStr, Split};

/// Read a data file into trimmed, non-empty lines tagged with their 1-based line number.
fn read_lines(path: &Path) -> Result<Vec<(usize, String)>> {
    if !path.exists() {
        return Err(DataLoadError::FileNotFound {
            path: path.display().to_string(),
        });
    }
    let content = fs::read_to_string(path)?;

    Ok(content
        .lines()
        .enumerate()
        .map(|(idx, line)| (idx + 1, line.trim().to_string()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
        .collect())
}

/// Pull the next `::` field off a line or report which one was missing.
fn next_field<'a>(
    parts: &mut Split<'a, &'static str>,
    file: &str,
    line: usize,
    name: &str,
) -> Result<&'a str> {
    parts.next().ok_or_else(|| DataLoadError::ParseError {
        file: file.to_string(),
        line,
        reason: format!("Missing {}", name),
    })
}

/// Parse a numeric field, reporting the file/line on failure.
fn parse_number<T>(value: &str, file: &str, line: usize, name: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse::<T>().map_err(|e| DataLoadError::ParseError {
        file: file.to_string(),
        line,
        reason: format!("Invalid {}: {}", name, e),
    })
}

fn parse_timestamp(value: &str, file: &str, line: usize) -> Result<DateTime<Utc>> {
    let secs: i64 = parse_number(value, file, line, "timestamp")?;
    DateTime::<Utc>::from_timestamp(secs, 0).ok_or_else(|| DataLoadError::ParseError {
        file: file.to_string(),
        line,
        reason: format!("Timestamp out of range: {}", secs),
    })
}

pub(crate) fn parse_status(s: &str) -> Result<ItemStatus> {
    match s {
        "published" => Ok(ItemStatus::Published),
        "draft" => Ok(ItemStatus::Draft),
        "processing" => Ok(ItemStatus::Processing),
        "archived" => Ok(ItemStatus::Archived),
        _ => Err(DataLoadError::InvalidValue {
            field: "status".to_string(),
            value: s.to_string(),
        }),
    }
}

pub(crate) fn parse_visibility(s: &str) -> Result<Visibility> {
    match s {
        "public" => Ok(Visibility::Public),
        "unlisted" => Ok(Visibility::Unlisted),
        "private" => Ok(Visibility::Private),
        _ => Err(DataLoadError::InvalidValue {
            field: "visibility".to_string(),
            value: s.to_string(),
        }),
    }
}

pub(crate) fn parse_interaction_kind(s: &str) -> Result<InteractionKind> {
    match s {
        "view" => Ok(InteractionKind::View),
        "like" => Ok(InteractionKind::Like),
        "dislike" => Ok(InteractionKind::Dislike),
        "share" => Ok(InteractionKind::Share),
        "comment" => Ok(InteractionKind::Comment),
        _ => Err(DataLoadError::InvalidValue {
            field: "interaction kind".to_string(),
            value: s.to_string(),
        }),
    }
}

/// Parse pipe-separated tags, dropping blanks and normalizing case
///
/// Example: "Rust| async|" -> {"async", "rust"}
pub(crate) fn parse_tags(s: &str) -> BTreeSet<String> {
    s.split('|')
        .map(|tag| tag.trim().to_lowercase())
        .filter(|tag| !tag.is_empty())
        .collect()
}

/// Parse the users.dat file
pub fn parse_users(path: &Path) -> Result<Vec<User>> {
    const FILE: &str = "users.dat";
    let mut users = Vec::new();

    for (line_no, line) in read_lines(path)? {
        let mut parts = line.split("::");
        let user_id = next_field(&mut parts, FILE, line_no, "userId")?;
        let username = next_field(&mut parts, FILE, line_no, "username")?;

        users.push(User {
            id: parse_number(user_id, FILE, line_no, "userId")?,
            username: username.to_string(),
        });
    }

    Ok(users)
}

/// Parse the items.dat file
pub fn parse_items(path: &Path) -> Result<Vec<Item>> {
    const FILE: &str = "items.dat";
    let mut items = Vec::new();

    for (line_no, line) in read_lines(path)? {
        let mut parts = line.split("::");
        let item_id = next_field(&mut parts, FILE, line_no, "itemId")?;
        let creator_id = next_field(&mut parts, FILE, line_no, "creatorId")?;
        let category = next_field(&mut parts, FILE, line_no, "category")?;
        let duration = next_field(&mut parts, FILE, line_no, "durationSecs")?;
        let views = next_field(&mut parts, FILE, line_no, "viewCount")?;
        let likes = next_field(&mut parts, FILE, line_no, "likeCount")?;
        let created_at = next_field(&mut parts, FILE, line_no, "createdAt")?;
        let status = next_field(&mut parts, FILE, line_no, "status")?;
        let visibility = next_field(&mut parts, FILE, line_no, "visibility")?;
        // The tag column may be omitted entirely for untagged items
        let tags = parts.next().unwrap_or("");

        items.push(Item {
            id: parse_number(item_id, FILE, line_no, "itemId")?,
            creator_id: parse_number(creator_id, FILE, line_no, "creatorId")?,
            category: category.trim().to_lowercase(),
            duration_secs: parse_number(duration, FILE, line_no, "durationSecs")?,
            view_count: parse_number(views, FILE, line_no, "viewCount")?,
            like_count: parse_number(likes, FILE, line_no, "likeCount")?,
            created_at: parse_timestamp(created_at, FILE, line_no)?,
            status: parse_status(status.trim())?,
            visibility: parse_visibility(visibility.trim())?,
            tags: parse_tags(tags),
        });
    }

    Ok(items)
}

/// Parse the interactions.dat file
pub fn parse_interactions(path: &Path) -> Result<Vec<Interaction>> {
    const FILE: &str = "interactions.dat";
    let mut interactions = Vec::new();

    for (line_no, line) in read_lines(path)? {
        let mut parts = line.split("::");
        let user_id = next_field(&mut parts, FILE, line_no, "userId")?;
        let item_id = next_field(&mut parts, FILE, line_no, "itemId")?;
        let kind = next_field(&mut parts, FILE, line_no, "kind")?;
        let timestamp = next_field(&mut parts, FILE, line_no, "timestamp")?;

        interactions.push(Interaction {
            user_id: parse_number(user_id, FILE, line_no, "userId")?,
            item_id: parse_number(item_id, FILE, line_no, "itemId")?,
            kind: parse_interaction_kind(kind.trim())?,
            occurred_at: parse_timestamp(timestamp, FILE, line_no)?,
        });
    }

    Ok(interactions)
}
