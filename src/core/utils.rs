//! Small formatting helpers shared by the bot and the REST API

/// Formats a byte count with base-1024 units and two decimals.
///
/// # Example
///
/// ```
/// use docudrop::core::utils::format_file_size;
///
/// assert_eq!(format_file_size(2048), "2.00 KB");
/// assert_eq!(format_file_size(512), "512.00 B");
/// ```
pub fn format_file_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    const GB: f64 = MB * 1024.0;

    let value = bytes as f64;
    if value >= GB {
        format!("{:.2} GB", value / GB)
    } else if value >= MB {
        format!("{:.2} MB", value / MB)
    } else if value >= KB {
        format!("{:.2} KB", value / KB)
    } else {
        format!("{:.2} B", value)
    }
}

/// Safely truncates a string to `max_len` characters (not bytes).
/// Appends "..." when something was cut.
pub fn truncate_chars(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(max_len).collect();
    truncated.push_str("...");
    truncated
}
