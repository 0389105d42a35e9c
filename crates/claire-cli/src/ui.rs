//! Plain-text projection of widget state

use chrono::Local;
use claire_widget::{Message, ResponseMetadata, WidgetSnapshot, WindowState};

/// Emoji shown next to a detected emotion
pub fn emotion_emoji(emotion: &str) -> &'static str {
    match emotion {
        "confused" => "😕",
        "frustrated" => "😤",
        "grateful" => "😊",
        "urgent" => "⚠️",
        "worried" => "😟",
        _ => "😐",
    }
}

/// Human-readable byte count: `0 Bytes`, `512 Bytes`, `1.5 KB`, ...
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let rounded = (value * 100.0).round() / 100.0;
    format!("{} {}", rounded, UNITS[unit])
}

/// Emotion, language, timing, and source count on one line
pub fn format_reply_metadata(meta: &ResponseMetadata) -> Option<String> {
    let mut parts = Vec::new();
    if let Some(ref emotion) = meta.emotion {
        parts.push(format!("{} {}", emotion_emoji(emotion), emotion));
    }
    if let Some(ref language) = meta.language {
        parts.push(language.clone());
    }
    if let Some(secs) = meta.processing_time_seconds {
        parts.push(format!("{:.1}s", secs));
    }
    if let Some(count) = meta.source_count.filter(|c| *c > 0) {
        parts.push(format!("{} source(s)", count));
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" · "))
    }
}

/// Render one message as one or more lines
pub fn format_message(message: &Message) -> String {
    let time = message.created_at.with_timezone(&Local).format("%H:%M");
    let who = if message.is_user() { "You" } else { "CLAIRE" };

    if message.is_thinking {
        return format!("[{}] {} is thinking...", time, who);
    }

    let marker = if message.is_error { "⚠ " } else { "" };
    let mut out = format!("[{}] {}: {}{}", time, who, marker, message.content);

    for attachment in &message.attachments {
        out.push_str(&format!(
            "\n    📎 {} ({})",
            attachment.display_name,
            format_file_size(attachment.size_bytes)
        ));
    }
    if let Some(line) = message.metadata.as_ref().and_then(format_reply_metadata) {
        out.push_str(&format!("\n    {}", line));
    }
    out
}

/// One-line summary of window, connectivity, and staged files
pub fn format_status(snapshot: &WidgetSnapshot) -> String {
    let window = match snapshot.window {
        WindowState::Mini => "minimized",
        WindowState::Expanded => "open",
        WindowState::Maximized => "maximized",
    };
    let online = if snapshot.reachable { "online" } else { "offline" };
    let mut status = format!(
        "window: {} | service: {} | messages: {}",
        window,
        online,
        snapshot.messages.len()
    );
    if snapshot.outstanding_request {
        status.push_str(" | waiting for reply");
    }
    for (i, attachment) in snapshot.staged.iter().enumerate() {
        status.push_str(&format!(
            "\n  [{}] {} ({})",
            i + 1,
            attachment.display_name,
            format_file_size(attachment.size_bytes)
        ));
    }
    status
}
