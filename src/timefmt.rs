//! Human-readable durations for reminder notifications and listings.

use chrono::Duration;

const UNITS: [(&str, i64); 4] = [
    ("days", 86_400),
    ("hours", 3_600),
    ("minutes", 60),
    ("seconds", 1),
];

/// Render a duration like "2 days and 3 hours", keeping at most
/// `max_units` leading units. Sub-second durations render as
/// "less than a second".
pub fn humanize(duration: Duration, max_units: usize) -> String {
    let max_units = max_units.max(1);
    let mut remaining = duration.num_seconds().max(0);
    if remaining == 0 {
        return "less than a second".to_string();
    }

    let mut parts = Vec::new();
    for (name, size) in UNITS.iter() {
        let count = remaining / size;
        if count > 0 {
            remaining %= size;
            let name = if count == 1 {
                name.trim_end_matches('s')
            } else {
                name
            };
            parts.push(format!("{count} {name}"));
        }
        if parts.len() == max_units {
            break;
        }
    }

    match parts.len() {
        1 => parts.remove(0),
        _ => {
            let last = parts.pop().unwrap_or_default();
            format!("{} and {}", parts.join(", "), last)
        }
    }
}
