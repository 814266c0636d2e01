pub mod error;
pub mod twiml;

pub use twiml::MessagingResponse;

/// First `max_chars` characters of `text`, for log lines.
pub fn preview(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_respects_char_boundaries() {
        assert_eq!(preview("héllo wörld", 5), "héllo");
        assert_eq!(preview("short", 50), "short");
    }
}
