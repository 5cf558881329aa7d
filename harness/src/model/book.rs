use serde::{Deserialize, Serialize};

use super::{Payload, Resource};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: Option<i64>,
    pub title: String,
    pub description: String,
    pub page_count: i64,
    pub excerpt: String,
    pub publish_date: String,
}

/// Create/update body for a book. Absent fields serialize as `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookPayload {
    pub id: Option<i64>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub page_count: Option<i64>,
    pub excerpt: Option<String>,
    pub publish_date: Option<String>,
}

impl Resource for Book {
    type Payload = BookPayload;

    const ENDPOINT: &'static str = "books";
    const LABEL: &'static str = "Book";

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn with_id(&self, id: i64) -> Self {
        Self {
            id: Some(id),
            ..self.clone()
        }
    }

    fn edited(&self) -> Self {
        Self {
            title: format!("{} (updated)", self.title),
            ..self.clone()
        }
    }

    fn to_payload(&self) -> BookPayload {
        BookPayload {
            id: self.id,
            title: Some(self.title.clone()),
            description: Some(self.description.clone()),
            page_count: Some(self.page_count),
            excerpt: Some(self.excerpt.clone()),
            publish_date: Some(self.publish_date.clone()),
        }
    }
}

impl Payload for BookPayload {
    fn id(&self) -> Option<i64> {
        self.id
    }

    fn absent_fields(&self) -> Vec<&'static str> {
        let fields = [
            ("id", self.id.is_none()),
            ("title", self.title.is_none()),
            ("description", self.description.is_none()),
            ("pageCount", self.page_count.is_none()),
            ("excerpt", self.excerpt.is_none()),
            ("publishDate", self.publish_date.is_none()),
        ];
        fields
            .into_iter()
            .filter_map(|(name, absent)| absent.then_some(name))
            .collect()
    }
}
