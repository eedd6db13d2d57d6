use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

/// An article body as handed over by the ingestion side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawArticle {
    pub body: String,
    pub photo_credit: Option<String>,
    pub image: Option<String>,
}

impl RawArticle {
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            photo_credit: None,
            image: None,
        }
    }

    pub fn with_photo_credit(mut self, credit: impl Into<String>) -> Self {
        self.photo_credit = Some(credit.into());
        self
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    /// Fails with `InvalidInput` when the body is empty or whitespace only.
    pub fn ensure_valid(&self) -> Result<()> {
        if self.body.trim().is_empty() {
            return Err(Error::InvalidInput("article body is empty".to_string()));
        }
        Ok(())
    }

    pub fn fingerprint(&self) -> RecordId {
        RecordId::fingerprint(&self.body)
    }
}

/// The closed category vocabulary. Labels match exactly, case included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Category {
    Politics,
    Sports,
    Technology,
    Entertainment,
    Health,
    Science,
    Business,
    World,
    Economy,
    Lifestyle,
}

impl Category {
    pub const ALL: [Category; 10] = [
        Category::Politics,
        Category::Sports,
        Category::Technology,
        Category::Entertainment,
        Category::Health,
        Category::Science,
        Category::Business,
        Category::World,
        Category::Economy,
        Category::Lifestyle,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Politics => "POLITICS",
            Category::Sports => "SPORTS",
            Category::Technology => "TECHNOLOGY",
            Category::Entertainment => "ENTERTAINMENT",
            Category::Health => "HEALTH",
            Category::Science => "SCIENCE",
            Category::Business => "BUSINESS",
            Category::World => "WORLD",
            Category::Economy => "ECONOMY",
            Category::Lifestyle => "LIFESTYLE",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| Error::InvalidInput(format!("unknown category: {}", s)))
    }
}

/// Which record field a generation call produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Title,
    Headline,
    Summary,
    Category,
}

impl FieldKind {
    pub const ALL: [FieldKind; 4] = [
        FieldKind::Title,
        FieldKind::Headline,
        FieldKind::Summary,
        FieldKind::Category,
    ];

    /// Character ceiling for the free-text fields. Category is bounded by
    /// its vocabulary instead.
    pub fn max_chars(&self) -> Option<usize> {
        match self {
            FieldKind::Title => Some(120),
            FieldKind::Headline => Some(150),
            FieldKind::Summary => Some(450),
            FieldKind::Category => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Title => "title",
            FieldKind::Headline => "headline",
            FieldKind::Summary => "summary",
            FieldKind::Category => "category",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A model output that has passed validation for its kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedField {
    pub kind: FieldKind,
    pub raw: String,
    pub value: String,
    pub attempts: u32,
}

/// Stable identifier derived from the article body.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Lowercase hex SHA-256 of the trimmed body, so whitespace-only
    /// differences in a re-submission map to the same record.
    pub fn fingerprint(body: &str) -> Self {
        let digest = Sha256::digest(body.trim().as_bytes());
        RecordId(format!("{:x}", digest))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for RecordId {
    fn from(value: String) -> Self {
        RecordId(value)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentRecord {
    pub id: RecordId,
    pub title: String,
    pub headline: String,
    pub summary: String,
    pub category: Category,
    pub article: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub photo_credit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub image: Option<String>,
}

impl ContentRecord {
    /// URL-safe form of the title. Recomputed on every call, never stored.
    pub fn slug(&self) -> String {
        slugify(&self.title)
    }

    pub fn paragraphs(&self) -> Vec<&str> {
        self.article
            .split('\n')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect()
    }
}

pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;
    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_exact_match() {
        assert_eq!("POLITICS".parse::<Category>().unwrap(), Category::Politics);
        assert!("politics".parse::<Category>().is_err());
        assert!("Politics and Policy".parse::<Category>().is_err());
        assert!(" POLITICS".parse::<Category>().is_err());
    }

    #[test]
    fn test_category_serde_uses_labels() {
        let json = serde_json::to_string(&Category::Lifestyle).unwrap();
        assert_eq!(json, "\"LIFESTYLE\"");
        for category in Category::ALL {
            let json = serde_json::to_string(&category).unwrap();
            assert_eq!(json.trim_matches('"'), category.as_str());
        }
    }

    #[test]
    fn test_fingerprint_is_stable() {
        let a = RawArticle::new("Researchers announce a breakthrough battery chemistry...");
        let b = RawArticle::new("Researchers announce a breakthrough battery chemistry...\n")
            .with_photo_credit("Reuters");
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint().as_str().len(), 64);
        assert_ne!(a.fingerprint(), RawArticle::new("Something else").fingerprint());
    }

    #[test]
    fn test_empty_body_is_invalid() {
        assert!(matches!(RawArticle::new("  \n\t").ensure_valid(), Err(Error::InvalidInput(_))));
        assert!(RawArticle::new("text").ensure_valid().is_ok());
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("New Battery Breakthrough Announced"), "new-battery-breakthrough-announced");
        assert_eq!(slugify("  U.S. & EU: talks resume!  "), "u-s-eu-talks-resume");
        assert_eq!(slugify("Café—2024"), "caf-2024");
        assert_eq!(slugify("***"), "");
    }

    #[test]
    fn test_record_serializes_camel_case() {
        let record = ContentRecord {
            id: RecordId::fingerprint("body"),
            title: "Title".to_string(),
            headline: "Headline".to_string(),
            summary: "Summary".to_string(),
            category: Category::World,
            article: "First.\n  Second. \n\n".to_string(),
            created_at: Utc::now(),
            photo_credit: Some("AP".to_string()),
            image: None,
        };
        let value = serde_json::to_value(&record).unwrap();
        assert!(value.get("createdAt").is_some());
        assert_eq!(value["photoCredit"], "AP");
        assert!(value.get("image").is_none());
        assert_eq!(record.paragraphs(), vec!["First.", "Second."]);
        assert_eq!(record.slug(), "title");
    }
}
