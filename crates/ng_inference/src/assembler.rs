use std::collections::HashMap;

use chrono::{DateTime, Utc};
use ng_core::{Category, ContentRecord, Error, FieldKind, GeneratedField, RawArticle, Result};

use crate::validator;

/// Build the record from one accepted field per kind, stamped with the
/// current time.
pub fn assemble(article: &RawArticle, fields: Vec<GeneratedField>) -> Result<ContentRecord> {
    assemble_at(article, fields, Utc::now())
}

pub fn assemble_at(
    article: &RawArticle,
    fields: Vec<GeneratedField>,
    created_at: DateTime<Utc>,
) -> Result<ContentRecord> {
    article.ensure_valid()?;

    let mut by_kind: HashMap<FieldKind, String> = HashMap::with_capacity(FieldKind::ALL.len());
    for field in fields {
        // Fields are accepted before they get here; re-checking keeps the
        // record invariants independent of the caller.
        let value = validator::validate(field.kind, &field.value)?;
        if by_kind.insert(field.kind, value).is_some() {
            return Err(Error::External(anyhow::anyhow!(
                "more than one {} field supplied",
                field.kind
            )));
        }
    }

    let mut take = |kind: FieldKind| by_kind.remove(&kind).ok_or(Error::IncompleteGeneration(kind));
    let title = take(FieldKind::Title)?;
    let headline = take(FieldKind::Headline)?;
    let summary = take(FieldKind::Summary)?;
    let category: Category = take(FieldKind::Category)?.parse()?;

    Ok(ContentRecord {
        id: article.fingerprint(),
        title,
        headline,
        summary,
        category,
        article: article.body.clone(),
        created_at,
        photo_credit: article.photo_credit.clone(),
        image: article.image.clone(),
    })
}
