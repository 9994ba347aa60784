//! Text rendering for records and statistics.

use deepmem_core::{Record, Stats};
use serde::Serialize;
use std::io::{self, Write};

const PREVIEW_CHARS: usize = 60;

/// Multi-line view of one record.
pub fn record_detail(r: &Record) -> String {
    let tags = if r.tags.is_empty() {
        "(none)".to_string()
    } else {
        r.tags.join(", ")
    };
    let mut lines = vec![
        format!("[{}] (★{})", r.id, r.importance),
        format!("  Content: {}", r.content),
        format!("  Category: {}", r.category),
        format!("  Tags: {}", tags),
        format!("  Created: {}", r.created_at.to_rfc3339()),
        format!("  Updated: {}", r.updated_at.to_rfc3339()),
    ];
    if !r.metadata.is_empty() {
        let meta: Vec<String> = r
            .metadata
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect();
        lines.push(format!("  Metadata: {}", meta.join(", ")));
    }
    lines.join("\n")
}

/// One-line summary used by search and list.
pub fn record_line(r: &Record) -> String {
    format!(
        "[{}] ★{} | {} | {}",
        r.id,
        r.importance,
        r.category,
        preview(&r.content)
    )
}

fn preview(content: &str) -> String {
    if content.chars().count() > PREVIEW_CHARS {
        let cut: String = content.chars().take(PREVIEW_CHARS).collect();
        format!("{cut}...")
    } else {
        content.to_string()
    }
}

pub fn stats_report(s: &Stats) -> String {
    let mut lines = vec![
        "DeepMem Statistics".to_string(),
        "==================".to_string(),
        format!("Total memories: {}", s.total),
        format!("Categories: {}", s.categories),
        format!("Tags: {}", s.tags),
        format!("Average importance: {}", s.avg_importance),
    ];
    if let (Some(oldest), Some(newest)) = (s.oldest, s.newest) {
        lines.push(format!("Oldest: {}", oldest.to_rfc3339()));
        lines.push(format!("Newest: {}", newest.to_rfc3339()));
    }
    lines.push(format!("Size: {:.1} KB", s.size_bytes as f64 / 1024.0));

    if !s.by_category.is_empty() {
        lines.push(String::new());
        lines.push("By category:".to_string());
        for (category, count) in &s.by_category {
            lines.push(format!("  {category}: {count}"));
        }
    }

    lines.push(String::new());
    lines.push("Importance distribution:".to_string());
    for (importance, count) in s.importance_distribution.iter().rev() {
        lines.push(format!(
            "  {:>2}: {} ({})",
            importance,
            "█".repeat(*count),
            count
        ));
    }
    lines.join("\n")
}

/// Print a value as pretty JSON on stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)?;
    Ok(())
}
