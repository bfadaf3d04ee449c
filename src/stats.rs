//! Walk statistics collection and display
//!
//! Every live walk counts what it read and what it had to leave out.
//! The counts are logged at the end of a run and can be printed as a short
//! summary or as JSON.

use std::io::{self, Write};

use serde::Serialize;
use tracing::info;

use crate::wire::LineCounts;

/// Counters for one live walk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WalkStats {
    /// Directories whose listing was read, root included
    pub directories: u64,
    /// Files seen in those listings
    pub files: u64,
    /// Sum of file sizes
    pub bytes: u64,
    /// Listings cut short or skipped by a limit
    pub truncated: u64,
    /// Directories emptied by recursion detection
    pub pruned: u64,
    /// Children the walker refused to enter
    pub skipped: u64,
    /// Records written by a diff run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch: Option<LineCounts>,
}

impl WalkStats {
    /// Emit the run summary through `tracing`.
    pub fn log_summary(&self) {
        info!(
            directories = self.directories,
            files = self.files,
            bytes = self.bytes,
            truncated = self.truncated,
            pruned = self.pruned,
            skipped = self.skipped,
            "walk finished"
        );
        if let Some(patch) = &self.patch {
            info!(
                added = patch.added,
                removed = patch.removed,
                changed = patch.changed,
                "diff written"
            );
        }
    }
}

/// Print a human readable summary.
pub fn print_stats<W: Write>(out: &mut W, stats: &WalkStats) -> io::Result<()> {
    writeln!(out, "Directories:  {}", format_number(stats.directories))?;
    writeln!(out, "Files:        {}", format_number(stats.files))?;
    writeln!(
        out,
        "Size:         {} ({} bytes)",
        format_size(stats.bytes),
        format_number(stats.bytes)
    )?;
    if stats.truncated + stats.pruned + stats.skipped > 0 {
        writeln!(out, "Truncated:    {}", stats.truncated)?;
        writeln!(out, "Pruned:       {}", stats.pruned)?;
        writeln!(out, "Skipped:      {}", stats.skipped)?;
    }
    if let Some(patch) = &stats.patch {
        writeln!(
            out,
            "Diff:         +{} -{} *{}",
            patch.added, patch.removed, patch.changed
        )?;
    }
    Ok(())
}

/// Print statistics as JSON.
pub fn print_stats_json<W: Write>(out: &mut W, stats: &WalkStats) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, stats)?;
    writeln!(out)
}

/// Format a number with thousand separators.
fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3);

    for (i, c) in s.chars().enumerate() {
        if i > 0 && (s.len() - i) % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }

    result
}

/// Format a size in bytes to human-readable format.
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;
    const TB: u64 = GB * 1024;

    if bytes >= TB {
        format!("{:.1}T", bytes as f64 / TB as f64)
    } else if bytes >= GB {
        format!("{:.1}G", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1}M", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1}K", bytes as f64 / KB as f64)
    } else {
        format!("{}B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(1234567), "1,234,567");
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512B");
        assert_eq!(format_size(1536), "1.5K");
        assert_eq!(format_size(5 * 1024 * 1024), "5.0M");
    }

    #[test]
    fn test_summary_mentions_patch() {
        let stats = WalkStats {
            directories: 3,
            files: 1200,
            bytes: 2048,
            patch: Some(LineCounts {
                added: 2,
                ..Default::default()
            }),
            ..Default::default()
        };
        let mut out = Vec::new();
        print_stats(&mut out, &stats).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("1,200"));
        assert!(text.contains("2.0K"));
        assert!(text.contains("+2 -0 *0"));
        assert!(!text.contains("Pruned"));
    }

    #[test]
    fn test_json_skips_absent_patch() {
        let mut out = Vec::new();
        print_stats_json(&mut out, &WalkStats::default()).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["directories"], 0);
        assert!(value.get("patch").is_none());
    }
}
