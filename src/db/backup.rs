use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};
use tokio::task::JoinHandle;

const BACKUP_PREFIX: &str = "bookings-";

pub fn backup_file_name(date: NaiveDate) -> String {
    format!("{BACKUP_PREFIX}{}.json", date.format("%Y-%m-%d"))
}

/// Copies the bookings document into `backup_dir` under a dated name and
/// prunes old copies. Returns `None` when there is nothing to back up yet.
pub async fn create_backup(
    data_file: &Path,
    backup_dir: &Path,
    date: NaiveDate,
    keep: usize,
) -> anyhow::Result<Option<PathBuf>> {
    if !tokio::fs::try_exists(data_file).await.unwrap_or(false) {
        return Ok(None);
    }

    tokio::fs::create_dir_all(backup_dir)
        .await
        .context("failed to create backup directory")?;

    let target = backup_dir.join(backup_file_name(date));
    tokio::fs::copy(data_file, &target)
        .await
        .with_context(|| format!("failed to copy bookings to {}", target.display()))?;

    let pruned = prune_backups(backup_dir, keep).await?;
    tracing::info!(path = %target.display(), pruned, "backup created");

    Ok(Some(target))
}

/// Deletes the oldest dated copies until at most `keep` remain.
pub async fn prune_backups(backup_dir: &Path, keep: usize) -> anyhow::Result<usize> {
    let mut names = Vec::new();
    let mut entries = tokio::fs::read_dir(backup_dir)
        .await
        .context("failed to read backup directory")?;
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name().to_string_lossy().to_string();
        if name.starts_with(BACKUP_PREFIX) {
            names.push(name);
        }
    }

    // dated names sort chronologically
    names.sort();
    let excess = names.len().saturating_sub(keep);
    let mut removed = 0;
    for name in names.into_iter().take(excess) {
        match tokio::fs::remove_file(backup_dir.join(&name)).await {
            Ok(()) => removed += 1,
            Err(e) => tracing::warn!(file = %name, error = %e, "failed to delete old backup"),
        }
    }
    Ok(removed)
}

/// Time until the next `hour:00` local time strictly after `now`.
pub fn until_next_run(now: NaiveDateTime, hour: u32) -> Duration {
    let at = NaiveTime::from_hms_opt(hour.min(23), 0, 0).unwrap_or_default();
    let today = now.date().and_time(at);
    let next = if today > now {
        today
    } else {
        today + chrono::Duration::days(1)
    };
    (next - now).to_std().unwrap_or(Duration::from_secs(60))
}

pub fn spawn_daily_backups(
    data_file: PathBuf,
    backup_dir: PathBuf,
    keep: usize,
    hour: u32,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let wait = until_next_run(Local::now().naive_local(), hour);
            tokio::time::sleep(wait).await;

            let today = Local::now().date_naive();
            if let Err(e) = create_backup(&data_file, &backup_dir, today, keep).await {
                tracing::error!(error = %e, "daily backup failed");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn test_until_next_run() {
        let now = NaiveDateTime::parse_from_str("2025-06-16 01:30:00", "%Y-%m-%d %H:%M:%S").unwrap();
        assert_eq!(until_next_run(now, 2), Duration::from_secs(30 * 60));

        let now = NaiveDateTime::parse_from_str("2025-06-16 02:00:00", "%Y-%m-%d %H:%M:%S").unwrap();
        assert_eq!(until_next_run(now, 2), Duration::from_secs(24 * 3600));
    }

    #[tokio::test]
    async fn test_no_document_no_backup() {
        let dir = tempfile::tempdir().unwrap();
        let made = create_backup(
            &dir.path().join("bookings.json"),
            &dir.path().join("backups"),
            date("2025-06-16"),
            30,
        )
        .await
        .unwrap();
        assert!(made.is_none());
    }

    #[tokio::test]
    async fn test_backup_keeps_newest() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("bookings.json");
        let backups = dir.path().join("backups");
        tokio::fs::write(&data, br#"{"bookings":[],"blocks":[]}"#).await.unwrap();

        for day in ["2025-06-14", "2025-06-15", "2025-06-16"] {
            create_backup(&data, &backups, date(day), 2).await.unwrap();
        }

        let mut left = Vec::new();
        let mut entries = tokio::fs::read_dir(&backups).await.unwrap();
        while let Some(e) = entries.next_entry().await.unwrap() {
            left.push(e.file_name().to_string_lossy().to_string());
        }
        left.sort();
        assert_eq!(left, vec!["bookings-2025-06-15.json", "bookings-2025-06-16.json"]);
    }
}
