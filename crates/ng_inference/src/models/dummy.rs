use std::fmt;

use ng_core::{Category, FieldKind, GenerationClient, GenerationError, GenerationOptions};

/// Offline generator that answers from the article text itself. Handy for
/// trying the pipeline without a model server.
pub struct DummyClient;

impl fmt::Debug for DummyClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DummyClient").finish()
    }
}

impl DummyClient {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DummyClient {
    fn default() -> Self {
        Self::new()
    }
}

const KEYWORDS: &[(Category, &[&str])] = &[
    (Category::Politics, &["election", "senate", "parliament", "minister", "president", "vote"]),
    (Category::Sports, &["match", "league", "tournament", "championship", "coach", "goal"]),
    (Category::Technology, &["software", "battery", "chip", "ai", "startup", "device"]),
    (Category::Entertainment, &["film", "movie", "album", "actor", "festival", "series"]),
    (Category::Health, &["hospital", "vaccine", "disease", "patients", "doctors", "virus"]),
    (Category::Science, &["researchers", "scientists", "study", "species", "space", "physics"]),
    (Category::Business, &["company", "shares", "merger", "ceo", "profit", "revenue"]),
    (Category::Economy, &["inflation", "gdp", "interest", "unemployment", "tariff", "recession"]),
    (Category::Lifestyle, &["travel", "fashion", "recipe", "wellness", "home", "food"]),
];

/// The text between the first pair of ``` fences.
fn article_from_prompt(prompt: &str) -> Option<&str> {
    let start = prompt.find("```")? + 3;
    let len = prompt[start..].find("```")?;
    Some(prompt[start..start + len].trim())
}

/// Leading sentences of `text` that fit in `max` characters, cut at a word
/// boundary if even the first sentence is too long.
fn lead(text: &str, max: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut out = String::new();
    for sentence in flat.split_inclusive(['.', '!', '?']) {
        let sentence = sentence.trim();
        let needed = out.chars().count() + sentence.chars().count() + usize::from(!out.is_empty());
        if needed > max {
            break;
        }
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(sentence);
    }
    if !out.is_empty() {
        return out;
    }

    for word in flat.split(' ') {
        let needed = out.chars().count() + word.chars().count() + usize::from(!out.is_empty());
        if needed > max {
            break;
        }
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}

fn guess_category(text: &str) -> Category {
    let words: Vec<String> = text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect();

    KEYWORDS
        .iter()
        .map(|(category, keywords)| {
            let hits = words.iter().filter(|w| keywords.contains(&w.as_str())).count();
            (*category, hits)
        })
        .filter(|(_, hits)| *hits > 0)
        // max_by_key keeps the last maximum; reverse so ties go to the earlier entry
        .rev()
        .max_by_key(|(_, hits)| *hits)
        .map(|(category, _)| category)
        .unwrap_or(Category::World)
}

#[async_trait::async_trait]
impl GenerationClient for DummyClient {
    fn name(&self) -> &str {
        "Dummy"
    }

    async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String, GenerationError> {
        let kind = options
            .field
            .ok_or_else(|| GenerationError::Fatal("dummy client needs a field".to_string()))?;
        let article = article_from_prompt(prompt)
            .ok_or_else(|| GenerationError::Fatal("prompt has no article block".to_string()))?;

        let output = match kind {
            FieldKind::Title => lead(article, 80),
            FieldKind::Headline | FieldKind::Summary => {
                lead(article, kind.max_chars().unwrap_or_default())
            }
            FieldKind::Category => guess_category(article).to_string(),
        };
        tracing::debug!("Dummy {} output: {}", kind, output);
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompts::build_prompt;
    use crate::validator::validate;

    const ARTICLE: &str = "Researchers announce a breakthrough battery chemistry. \
        The new cells charge in minutes and last for years. \
        Industry analysts expect the first devices next spring.";

    #[tokio::test]
    async fn test_dummy_outputs_pass_validation() {
        let client = DummyClient::new();
        for kind in FieldKind::ALL {
            let prompt = build_prompt(kind, ARTICLE).unwrap();
            let options = GenerationOptions::default().for_field(kind);
            let output = client.generate(&prompt, &options).await.unwrap();
            assert!(validate(kind, &output).is_ok(), "{kind}: {output}");
        }
    }

    #[test]
    fn test_lead_respects_limit() {
        assert_eq!(lead("One. Two. Three.", 9), "One. Two.");
        assert_eq!(lead("A very long opening sentence", 12), "A very long");
        assert!(lead(&"word ".repeat(100), 120).chars().count() <= 120);
    }

    #[test]
    fn test_guess_category() {
        assert_eq!(guess_category(ARTICLE), Category::Technology);
        assert_eq!(guess_category("The senate will vote on Tuesday"), Category::Politics);
        assert_eq!(guess_category("Nothing matches here"), Category::World);
    }

    #[test]
    fn test_article_from_prompt() {
        let prompt = build_prompt(FieldKind::Category, "Body text").unwrap();
        assert_eq!(article_from_prompt(&prompt), Some("Body text"));
        assert_eq!(article_from_prompt("no fences"), None);
    }
}
