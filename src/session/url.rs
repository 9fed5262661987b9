//! Link extraction from free text.

use regex::Regex;

/// Finds the first media link in a message.
///
/// Patterns are tried in order: known video hosts first, then any http(s)
/// link. The first pattern with a match wins and its first match is
/// returned, so a YouTube link later in the text beats an earlier plain link.
#[derive(Debug, Clone)]
pub struct UrlExtractor {
    patterns: Vec<Regex>,
}

impl Default for UrlExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl UrlExtractor {
    pub fn new() -> Self {
        let known_hosts = Regex::new(
            r"(?x)
            https?://
            (?:www\.)?
            (?:youtube\.com/watch\?v=|youtu\.be/|vimeo\.com/|twitter\.com/|x\.com/|instagram\.com/|tiktok\.com/)
            \S+
        ",
        )
        .expect("Invalid regex");
        let any_link = Regex::new(r"https?://\S+").expect("Invalid regex");

        Self {
            patterns: vec![known_hosts, any_link],
        }
    }

    pub fn extract(&self, text: &str) -> Option<String> {
        self.patterns
            .iter()
            .find_map(|p| p.find(text))
            .map(|m| m.as_str().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_host_wins_over_earlier_plain_link() {
        let extractor = UrlExtractor::new();
        let text = "see https://example.com/page and https://youtu.be/dQw4w9WgXcQ please";
        assert_eq!(
            extractor.extract(text).as_deref(),
            Some("https://youtu.be/dQw4w9WgXcQ")
        );
    }

    #[test]
    fn test_first_match_of_winning_pattern() {
        let extractor = UrlExtractor::new();
        let text = "https://www.tiktok.com/@a/video/1 then https://x.com/b/status/2";
        assert_eq!(
            extractor.extract(text).as_deref(),
            Some("https://www.tiktok.com/@a/video/1")
        );
    }

    #[test]
    fn test_plain_link_and_no_link() {
        let extractor = UrlExtractor::new();
        assert_eq!(
            extractor.extract("grab http://cdn.site/v.mp4").as_deref(),
            Some("http://cdn.site/v.mp4")
        );
        assert_eq!(extractor.extract("download it in 720p please"), None);
        assert_eq!(extractor.extract("ftp://files.example.com/a"), None);
    }
}
