use serde::{Deserialize, Serialize};

/// A usable image picked for a place name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageResult {
    pub url: String,
    pub description: String,
}

/// The slice of the Custom Search JSON response this service reads.
#[derive(Debug, Default, Deserialize)]
pub struct ImageSearchResponse {
    #[serde(default)]
    pub items: Option<Vec<ImageSearchItem>>,
}

#[derive(Debug, Deserialize)]
pub struct ImageSearchItem {
    pub link: Option<String>,
    pub title: Option<String>,
    #[serde(rename = "fileFormat")]
    pub file_format: Option<String>,
}
