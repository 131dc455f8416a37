// Display formatting rules shared by the catalog and the CLI

/// Seconds -> "m:ss" with zero-padded seconds. Unknown/zero -> "0:00".
pub fn format_duration(seconds: u64) -> String {
    if seconds == 0 {
        return "0:00".to_string();
    }
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// Large counts -> "1.5M" / "2.3K" / "512". Unknown/zero -> "0".
pub fn format_count(count: u64) -> String {
    if count == 0 {
        return "0".to_string();
    }
    if count >= 1_000_000 {
        format!("{:.1}M", count as f64 / 1_000_000.0)
    } else if count >= 1_000 {
        format!("{:.1}K", count as f64 / 1_000.0)
    } else {
        count.to_string()
    }
}

/// Bytes -> "2 MB" style: unit chosen by floor(log1024), value rounded to
/// two decimals with trailing zeros dropped. Unknown/zero -> "Unknown",
/// never an ambiguous "0 B".
pub fn format_file_size(bytes: Option<u64>) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

    let bytes = match bytes {
        Some(b) if b > 0 => b,
        _ => return "Unknown".to_string(),
    };

    let exponent = ((bytes as f64).ln() / 1024_f64.ln()).floor() as usize;
    let exponent = exponent.min(UNITS.len() - 1);
    let value = bytes as f64 / 1024_f64.powi(exponent as i32);
    let rounded = (value * 100.0).round() / 100.0;
    format!("{} {}", rounded, UNITS[exponent])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_pads_seconds() {
        assert_eq!(format_duration(125), "2:05");
        assert_eq!(format_duration(59), "0:59");
        assert_eq!(format_duration(600), "10:00");
    }

    #[test]
    fn duration_zero_is_explicit() {
        assert_eq!(format_duration(0), "0:00");
    }

    #[test]
    fn counts_scale_with_one_decimal() {
        assert_eq!(format_count(1_500_000), "1.5M");
        assert_eq!(format_count(1_000_000), "1.0M");
        assert_eq!(format_count(2_300), "2.3K");
        assert_eq!(format_count(512), "512");
        assert_eq!(format_count(0), "0");
    }

    #[test]
    fn sizes_pick_the_right_unit() {
        assert_eq!(format_file_size(Some(2_097_152)), "2 MB");
        assert_eq!(format_file_size(Some(1_023)), "1023 Bytes");
        assert_eq!(format_file_size(Some(1_536)), "1.5 KB");
        assert_eq!(format_file_size(Some(5_368_709_120)), "5 GB");
    }

    #[test]
    fn unknown_sizes_never_render_as_zero_bytes() {
        assert_eq!(format_file_size(None), "Unknown");
        assert_eq!(format_file_size(Some(0)), "Unknown");
    }
}
