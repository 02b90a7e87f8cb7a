use crate::types::{Embed, MediaRef};
use regex::Regex;
use std::sync::OnceLock;

/// Most images a single post can carry.
pub const MAX_IMAGES: usize = 4;

/// Text with its media markers removed, plus the media that was pulled out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedMedia {
    pub text: String,
    pub embed: Option<Embed>,
}

fn video_marker() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[video:([^\]\s]+)\]").expect("valid video marker pattern"))
}

fn image_marker() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[img:([^\]\s]+)\]").expect("valid image marker pattern"))
}

fn img_src() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"(?i)<img\s+[^>]*src="([^"]+)""#).expect("valid img pattern"))
}

/// Pull media out of renderer output.
///
/// The first video wins. Without a video, up to [`MAX_IMAGES`] images are
/// taken in document order. Every marker of either kind is stripped and
/// trailing blank lines are collapsed afterwards.
pub fn extract_media(rendered: &str) -> ExtractedMedia {
    if let Some(captures) = video_marker().captures(rendered) {
        let video = MediaRef {
            data: captures[1].to_string(),
        };
        let text = video_marker().replace_all(rendered, "");
        let text = image_marker().replace_all(&text, "");
        return ExtractedMedia {
            text: collapse_trailing_blank_lines(&text),
            embed: Some(Embed::Video(video)),
        };
    }

    let images: Vec<MediaRef> = image_marker()
        .captures_iter(rendered)
        .take(MAX_IMAGES)
        .map(|captures| MediaRef {
            data: captures[1].to_string(),
        })
        .collect();

    let text = image_marker().replace_all(rendered, "");
    ExtractedMedia {
        text: collapse_trailing_blank_lines(&text),
        embed: (!images.is_empty()).then_some(Embed::Images(images)),
    }
}

/// `src` of the first `<img>` tag in an HTML fragment.
pub fn first_image_src(html: &str) -> Option<String> {
    img_src().captures(html).map(|captures| captures[1].to_string())
}

fn collapse_trailing_blank_lines(text: &str) -> String {
    let mut lines: Vec<&str> = text.lines().collect();
    while lines.last().is_some_and(|line| line.trim().is_empty()) {
        lines.pop();
    }
    lines.join("\n")
}
