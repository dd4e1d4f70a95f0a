//! Text passes over a generated itinerary: image placeholders and layout cleanup.

use std::collections::HashSet;
use std::ops::Range;
use std::sync::LazyLock;

use log::info;
use regex::Regex;

use crate::models::image::ImageResult;
use crate::services::image_search_service::ImageResolver;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[IMAGE: (.*?)\]").expect("valid placeholder pattern"));
static BULLET_ONLY_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[^\S\n]*[*-]?[^\S\n]*$").expect("valid bullet pattern"));
static EXTRA_NEWLINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid newline pattern"));

/// An `[IMAGE: name]` marker found in generated text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderToken {
    pub token: String,
    pub place_name: String,
    pub span: Range<usize>,
}

/// All placeholders in document order, duplicates included.
pub fn find_placeholders(text: &str) -> Vec<PlaceholderToken> {
    PLACEHOLDER
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let name = caps.get(1)?;
            Some(PlaceholderToken {
                token: whole.as_str().to_string(),
                place_name: name.as_str().trim().to_string(),
                span: whole.range(),
            })
        })
        .collect()
}

/// Markdown image for a resolved place.
///
/// The result never contains an `[IMAGE: ...]` marker: brackets are dropped
/// from the alt text and percent-encoded in the URL, and a leading `IMAGE:`
/// is removed from the alt text.
pub fn image_markdown(image: &ImageResult, place_name: &str) -> String {
    let url = image.url.replace('[', "%5B").replace(']', "%5D");
    format!("![{}]({})", alt_text(image, place_name), url)
}

fn alt_text(image: &ImageResult, place_name: &str) -> String {
    let source = if image.description.trim().is_empty() {
        place_name
    } else {
        image.description.as_str()
    };
    let mut alt: String = source.chars().filter(|c| !matches!(c, '[' | ']')).collect();
    while let Some(rest) = alt.trim_start().strip_prefix("IMAGE:") {
        alt = rest.to_string();
    }
    alt.trim().to_string()
}

/// Resolves every placeholder in order and splices the results in place.
///
/// A placeholder becomes a Markdown image when the resolver finds one whose
/// URL has not been used earlier in the document; otherwise it is removed.
pub async fn substitute_images(text: &str, resolver: &dyn ImageResolver) -> String {
    let placeholders = find_placeholders(text);
    info!("Found {} image placeholders.", placeholders.len());

    let mut used_urls: HashSet<String> = HashSet::new();
    let mut output = String::with_capacity(text.len());
    let mut cursor = 0;

    for placeholder in &placeholders {
        output.push_str(&text[cursor..placeholder.span.start]);
        cursor = placeholder.span.end;

        match resolver.find_image(&placeholder.place_name).await {
            Some(image) if used_urls.insert(image.url.clone()) => {
                output.push_str(&image_markdown(&image, &placeholder.place_name));
            }
            _ => {}
        }
    }
    output.push_str(&text[cursor..]);

    // Removing a token can join its neighbours into a new one.
    while PLACEHOLDER.is_match(&output) {
        output = PLACEHOLDER.replace_all(&output, "").into_owned();
    }
    output
}

/// Drops bullets left empty, squeezes blank runs to one empty line, trims.
///
/// Any Unicode whitespace counts as blank, matching what `str::trim` strips.
pub fn clean_up(text: &str) -> String {
    let text = BULLET_ONLY_LINE.replace_all(text, "");
    let text = EXTRA_NEWLINES.replace_all(&text, "\n\n");
    text.trim().to_string()
}
