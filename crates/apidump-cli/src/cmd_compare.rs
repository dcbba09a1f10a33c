use crate::cmd_show::load_snapshot;
use anyhow::Result;
use similar::TextDiff;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;

pub fn run(old: PathBuf, new: PathBuf, unified: bool) -> Result<ExitCode> {
    let old_snapshot = load_snapshot(&old)?;
    let new_snapshot = load_snapshot(&new)?;
    let diff = old_snapshot.diff(&new_snapshot);

    let mut stdout = std::io::stdout().lock();
    if unified {
        if let Some(text) = compute_diff(
            &old_snapshot.to_text(),
            &new_snapshot.to_text(),
            &old.display().to_string(),
            &new.display().to_string(),
        ) {
            stdout.write_all(text.as_bytes())?;
        }
    } else {
        diff.render(&mut stdout)?;
    }

    info!(
        removed = diff.removed.len(),
        added = diff.added.len(),
        versions = diff.versions.len(),
        "compared snapshots"
    );

    if diff.api_unchanged() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(1))
    }
}

fn compute_diff(old: &str, new: &str, old_name: &str, new_name: &str) -> Option<String> {
    let diff = TextDiff::from_lines(old, new);
    let unified = diff
        .unified_diff()
        .context_radius(3)
        .header(old_name, new_name)
        .to_string();
    if unified.is_empty() {
        None
    } else {
        Some(unified)
    }
}
