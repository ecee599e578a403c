use insta::assert_snapshot;

use crate::system::delta::UtilizationResult;
use crate::system::dynamic::DynamicMetrics;
use crate::system::facts::StaticFacts;
use crate::system::snapshot::Snapshot;
use crate::ui::bar::BarStyle;
use crate::ui::{RenderOptions, render};

fn make_options() -> RenderOptions {
    RenderOptions {
        bar: BarStyle {
            width: 10,
            filled: '#',
            empty: '.',
        },
        max_line_width: 40,
    }
}

fn make_snapshot() -> Snapshot {
    Snapshot {
        utilization: UtilizationResult {
            total: 1200.0 * 100.0 / 1400.0,
            kernel_pct: 600.0 * 100.0 / 1400.0,
            user_pct: 600.0 * 100.0 / 1400.0,
        },
        facts: StaticFacts {
            l1_kb: Some(384),
            l2_kb: Some(2048),
            l3_kb: None,
            cores_physical: Some(8),
            cores_logical: Some(16),
            register_description: "test registers".to_string(),
        },
        dynamic: DynamicMetrics {
            context_switch_rate: Some(24567.891),
            process_listing: Some("Name    Id   CPU\nnotepad 7788 3.5".to_string()),
        },
    }
}

#[test]
fn snapshot_full_report() {
    let output = render(&make_snapshot(), &make_options());

    assert_snapshot!(output, @r"
CPU Usage Report
================

Total  [#########.]  85.7%
Kernel [####......]  42.9%
User   [####......]  42.9%

Cache & Topology
  L1 Cache:        384 KB
  L2 Cache:        2 MB
  L3 Cache:        unknown
  Physical Cores:  8
  Logical Cores:   16
  Registers:       test registers

Context Switches/sec: 24567.9

Top Processes
Name    Id   CPU
notepad 7788 3.5
");
}

#[test]
fn missing_fields_render_placeholders() {
    let snapshot = Snapshot {
        utilization: UtilizationResult::ZERO,
        facts: StaticFacts::default(),
        dynamic: DynamicMetrics::default(),
    };
    let output = render(&snapshot, &make_options());

    assert!(output.contains("Total  [..........]   0.0%"));
    assert!(output.contains("  L1 Cache:        unknown"));
    assert!(output.contains("  Physical Cores:  unknown"));
    assert!(output.contains("  Registers:       unknown"));
    assert!(output.contains("Context Switches/sec: unavailable"));
    assert!(output.ends_with("Top Processes\nunavailable"));
}

#[test]
fn empty_listing_after_filtering() {
    let mut snapshot = make_snapshot();
    snapshot.dynamic.process_listing = Some(String::new());
    let output = render(&snapshot, &make_options());
    assert!(output.ends_with("Top Processes\n(none)"));
}

#[test]
fn rendering_is_idempotent() {
    let snapshot = make_snapshot();
    let options = make_options();
    assert_eq!(render(&snapshot, &options), render(&snapshot, &options));
}

#[test]
fn long_listing_lines_truncated() {
    let mut snapshot = make_snapshot();
    snapshot.dynamic.process_listing = Some(format!("{} 1 0.5", "x".repeat(80)));
    let output = render(&snapshot, &make_options());
    let last = output.lines().last().unwrap();
    assert_eq!(last.chars().count(), 40);
    assert!(last.ends_with('\u{2026}'));
}

#[test]
fn default_bars_are_fifty_slots() {
    let output = render(&make_snapshot(), &RenderOptions::default());
    let total_line = output.lines().find(|l| l.starts_with("Total")).unwrap();
    let open = total_line.find('[').unwrap();
    let close = total_line.find(']').unwrap();
    assert_eq!(total_line[open + 1..close].chars().count(), 50);
}
