use serde::{Deserialize, Serialize};

use super::{Payload, Resource};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    pub id: Option<i64>,
    pub id_book: Option<i64>,
    pub first_name: String,
    pub last_name: String,
}

/// Create/update body for an author. Absent fields serialize as `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorPayload {
    pub id: Option<i64>,
    pub id_book: Option<i64>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl Resource for Author {
    type Payload = AuthorPayload;

    const ENDPOINT: &'static str = "authors";
    const LABEL: &'static str = "Author";

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
            first_name: "UpdatedName".to_string(),
            ..self.clone()
        }
    }

    fn to_payload(&self) -> AuthorPayload {
        AuthorPayload {
            id: self.id,
            id_book: self.id_book,
            first_name: Some(self.first_name.clone()),
            last_name: Some(self.last_name.clone()),
        }
    }
}

impl Payload for AuthorPayload {
    fn id(&self) -> Option<i64> {
        self.id
    }

    fn absent_fields(&self) -> Vec<&'static str> {
        let fields = [
            ("id", self.id.is_none()),
            ("idBook", self.id_book.is_none()),
            ("firstName", self.first_name.is_none()),
            ("lastName", self.last_name.is_none()),
        ];
        fields
            .into_iter()
            .filter_map(|(name, absent)| absent.then_some(name))
            .collect()
    }
}
