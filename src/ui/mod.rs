pub mod bar;

use crate::format::{format_kb, truncate_unicode};
use crate::system::snapshot::Snapshot;
use crate::ui::bar::BarStyle;

pub const UNKNOWN: &str = "unknown";
pub const UNAVAILABLE: &str = "unavailable";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderOptions {
    pub bar: BarStyle,
    /// Listing lines wider than this are cut with an ellipsis. 0 disables.
    pub max_line_width: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        RenderOptions {
            bar: BarStyle::default(),
            max_line_width: 120,
        }
    }
}

/// Formats one report. Pure: the same snapshot always yields the same text.
pub fn render(snapshot: &Snapshot, options: &RenderOptions) -> String {
    let mut lines: Vec<String> = vec![
        "CPU Usage Report".to_string(),
        "================".to_string(),
        String::new(),
    ];

    let util = &snapshot.utilization;
    for (label, value) in [
        ("Total ", util.total),
        ("Kernel", util.kernel_pct),
        ("User  ", util.user_pct),
    ] {
        lines.push(format!("{label} [{}] {value:>5.1}%", options.bar.render(value)));
    }

    let facts = &snapshot.facts;
    let cache = |kb: Option<u32>| kb.map(format_kb).unwrap_or_else(|| UNKNOWN.to_string());
    let count = |n: Option<u32>| n.map(|n| n.to_string()).unwrap_or_else(|| UNKNOWN.to_string());
    let registers = if facts.register_description.is_empty() {
        UNKNOWN
    } else {
        facts.register_description.as_str()
    };

    lines.push(String::new());
    lines.push("Cache & Topology".to_string());
    lines.push(format!("  L1 Cache:        {}", cache(facts.l1_kb)));
    lines.push(format!("  L2 Cache:        {}", cache(facts.l2_kb)));
    lines.push(format!("  L3 Cache:        {}", cache(facts.l3_kb)));
    lines.push(format!("  Physical Cores:  {}", count(facts.cores_physical)));
    lines.push(format!("  Logical Cores:   {}", count(facts.cores_logical)));
    lines.push(format!("  Registers:       {registers}"));

    lines.push(String::new());
    let rate = snapshot
        .dynamic
        .context_switch_rate
        .map(|r| format!("{r:.1}"))
        .unwrap_or_else(|| UNAVAILABLE.to_string());
    lines.push(format!("Context Switches/sec: {rate}"));

    lines.push(String::new());
    lines.push("Top Processes".to_string());
    match snapshot.dynamic.process_listing.as_deref() {
        None => lines.push(UNAVAILABLE.to_string()),
        Some("") => lines.push("(none)".to_string()),
        Some(listing) => lines.extend(listing.lines().map(|line| {
            if options.max_line_width == 0 {
                line.to_string()
            } else {
                truncate_unicode(line, options.max_line_width)
            }
        })),
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests;
