//! Port list parsing: `80,443,8000-8010`

use crate::error::{AppError, ErrorContext, Result};
use std::collections::HashSet;

/// Parse a comma separated list of ports and inclusive ranges
///
/// Duplicates are dropped, first-seen order is kept. Every value must be in
/// 1..=65535.
pub fn parse_port_list(s: &str) -> Result<Vec<u32>> {
    let mut out = Vec::new();
    let mut seen = HashSet::new();

    for item in s.split(',').map(str::trim).filter(|item| !item.is_empty()) {
        if let Some((a, b)) = item.split_once('-') {
            let start = parse_port(a.trim())
                .with_context(|| format!("invalid start in range '{}'", item))?;
            let end = parse_port(b.trim())
                .with_context(|| format!("invalid end in range '{}'", item))?;
            if start > end {
                return Err(AppError::validation(format!(
                    "invalid range {}-{} (start > end)",
                    start, end
                )));
            }
            for port in start..=end {
                if seen.insert(port) {
                    out.push(port);
                }
            }
            continue;
        }

        let port = parse_port(item).with_context(|| format!("invalid port value '{}'", item))?;
        if seen.insert(port) {
            out.push(port);
        }
    }

    if out.is_empty() {
        return Err(AppError::validation("no ports given"));
    }

    Ok(out)
}

fn parse_port(s: &str) -> Result<u32> {
    let value: u32 = s
        .parse()
        .map_err(|_| AppError::validation(format!("'{}' is not a number", s)))?;
    if value == 0 || value > 65535 {
        return Err(AppError::validation(format!("port out of range: {}", value)));
    }
    Ok(value)
}
