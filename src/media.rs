use once_cell::sync::Lazy;
use regex::Regex;

static YOUTUBE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^https?://(?:www\.|m\.)?(?:youtube\.com/(?:watch\?(?:.*&)?v=|embed/|shorts/)|youtu\.be/)([A-Za-z0-9_-]{11})",
    )
    .expect("valid youtube regex")
});

static VIMEO_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^https?://(?:www\.|player\.)?vimeo\.com/(?:video/)?(\d+)")
        .expect("valid vimeo regex")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoEmbed {
    pub source_url: String,
    /// Player URL for an iframe; `None` means link out to `source_url`.
    pub embed_url: Option<String>,
}

pub fn embed_for(reference: &str) -> VideoEmbed {
    let source_url = reference.trim().to_string();

    let embed_url = if let Some(caps) = YOUTUBE_RE.captures(&source_url) {
        Some(format!("https://www.youtube.com/embed/{}", &caps[1]))
    } else {
        VIMEO_RE
            .captures(&source_url)
            .map(|caps| format!("https://player.vimeo.com/video/{}", &caps[1]))
    };

    VideoEmbed {
        source_url,
        embed_url,
    }
}

pub fn embeds_for(references: &[String]) -> Vec<VideoEmbed> {
    references
        .iter()
        .filter(|reference| !reference.trim().is_empty())
        .map(|reference| embed_for(reference))
        .collect()
}
