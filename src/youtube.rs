use std::sync::OnceLock;

use regex::Regex;

const EMBED_BASE: &str = "https://www.youtube.com/embed";
const THUMBNAIL_BASE: &str = "https://img.youtube.com/vi";

// Tried in order; the first match wins.
const PATTERNS: [&str; 4] = [
    r"youtube\.com/watch\?v=([a-zA-Z0-9_-]+)",
    r"youtu\.be/([a-zA-Z0-9_-]+)",
    r"youtube\.com/embed/([a-zA-Z0-9_-]+)",
    r"youtube\.com/shorts/([a-zA-Z0-9_-]+)",
];

fn patterns() -> &'static [Regex] {
    static COMPILED: OnceLock<Vec<Regex>> = OnceLock::new();
    COMPILED.get_or_init(|| {
        PATTERNS
            .iter()
            .filter_map(|p| Regex::new(p).ok())
            .collect()
    })
}

/// Extract the video identifier from a YouTube watch, short-link, embed or
/// shorts URL. Query strings after the identifier are not captured.
pub fn extract_video_id(url: &str) -> Option<String> {
    let url = url.trim();
    if url.is_empty() {
        return None;
    }

    patterns()
        .iter()
        .find_map(|re| re.captures(url))
        .and_then(|cap: regex::Captures| cap.get(1))
        .map(|m: regex::Match| m.as_str().to_string())
}

pub fn embed_url(video_id: &str) -> String {
    format!(
        "{EMBED_BASE}/{id}?autoplay=1&mute=1&loop=1&playlist={id}&controls=0&showinfo=0&rel=0&modestbranding=1&playsinline=1",
        id = video_id
    )
}

pub fn thumbnail_url(video_id: &str) -> String {
    format!("{THUMBNAIL_BASE}/{}/maxresdefault.jpg", video_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_from_each_shape() {
        let cases = [
            ("https://www.youtube.com/watch?v=dQw4w9WgXcQ", "dQw4w9WgXcQ"),
            ("https://youtu.be/dQw4w9WgXcQ", "dQw4w9WgXcQ"),
            ("https://www.youtube.com/embed/dQw4w9WgXcQ?rel=0", "dQw4w9WgXcQ"),
            ("https://www.youtube.com/shorts/PRM4Ra_ds7o", "PRM4Ra_ds7o"),
            ("https://youtube.com/shorts/HYo8tXAzSeI?si=etqpdK0oQzEQp_WH", "HYo8tXAzSeI"),
            ("https://www.youtube.com/shorts/hOvsudKAp_4", "hOvsudKAp_4"),
        ];
        for (url, id) in cases {
            assert_eq!(extract_video_id(url).as_deref(), Some(id), "{url}");
        }
    }

    #[test]
    fn rejects_non_youtube_input() {
        assert_eq!(extract_video_id("not a url"), None);
        assert_eq!(extract_video_id(""), None);
        assert_eq!(extract_video_id("https://vimeo.com/12345"), None);
    }

    #[test]
    fn watch_takes_priority_over_later_shapes() {
        let url = "https://www.youtube.com/watch?v=first_id&list=https://youtu.be/second";
        assert_eq!(extract_video_id(url).as_deref(), Some("first_id"));
    }

    #[test]
    fn extraction_is_stable() {
        let url = "https://youtube.com/shorts/HYo8tXAzSeI?si=x";
        assert_eq!(extract_video_id(url), extract_video_id(url));
    }

    #[test]
    fn display_urls() {
        assert_eq!(
            thumbnail_url("PRM4Ra_ds7o"),
            "https://img.youtube.com/vi/PRM4Ra_ds7o/maxresdefault.jpg"
        );
        let embed = embed_url("PRM4Ra_ds7o");
        assert!(embed.starts_with("https://www.youtube.com/embed/PRM4Ra_ds7o?"));
        assert!(embed.contains("playlist=PRM4Ra_ds7o"));
    }
}
