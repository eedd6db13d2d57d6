//! Prompt templates for the four generated fields.
//!
//! Character ceilings and the category list are read from [`FieldKind`] and
//! [`Category`] so the instructions cannot drift from what the validator
//! enforces.

use ng_core::{Category, Error, FieldKind, LastFailure, Result};

const FENCE: &str = "```";

pub fn build_prompt(kind: FieldKind, article_text: &str) -> Result<String> {
    if article_text.trim().is_empty() {
        return Err(Error::InvalidInput("article body is empty".to_string()));
    }

    let prompt = match kind {
        FieldKind::Title | FieldKind::Headline | FieldKind::Summary => {
            free_text_prompt(kind, article_text)
        }
        FieldKind::Category => category_prompt(article_text),
    };
    Ok(prompt)
}

fn free_text_prompt(kind: FieldKind, article_text: &str) -> String {
    let max = kind.max_chars().unwrap_or_default();
    format!(
        "\nAI, I want you to create an unbiased news {kind} based on this article provided here:\n\
         \n{FENCE}\n{article_text}\n{FENCE}\n\
         \nReturn only a single {kind} without quotation marks with no more than {max} characters in your response.\n"
    )
}

fn category_prompt(article_text: &str) -> String {
    let list: String = Category::ALL
        .iter()
        .enumerate()
        .map(|(i, c)| format!("{}. {}\n", i + 1, c))
        .collect();

    format!(
        "\nRead this article and await instructions:\n\
         \n{FENCE}\n{article_text}\n{FENCE}\n\
         \nInstructions: Based on the article you just read, choose one and only one category from the list below. \
         Do not use any other category names.\n\
         \nCategories:\n{list}\
         \nIn your response, provide the name of your chosen category exactly as it appears in the list above. \
         Do not include any additional text or explanations.\n\
         \nExample response: {example}\n\
         \nRemember, you can only choose from the categories listed above.\n",
        example = Category::Politics,
    )
}

/// Extra paragraph appended to a prompt after a rejected attempt.
pub fn strict_reminder(kind: FieldKind, last_failure: &LastFailure) -> String {
    let problem = match last_failure {
        LastFailure::Validation(v) => format!("Your previous answer was rejected: {}.", v.reason),
        LastFailure::Generation(_) => "Your previous answer could not be used.".to_string(),
    };

    let contract = match kind.max_chars() {
        Some(max) => format!(
            "Reply with exactly one {kind} on a single line, at most {max} characters, \
             with no quotation marks, labels or formatting."
        ),
        None => {
            let labels: Vec<&str> = Category::ALL.iter().map(Category::as_str).collect();
            format!(
                "Reply with exactly one of these words and nothing else: {}.",
                labels.join(", ")
            )
        }
    };

    format!("\nIMPORTANT: {problem} {contract}\n")
}
