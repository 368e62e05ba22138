//! Wire types for the Confluence v2 and accessible-resources endpoints

use serde::{Deserialize, Serialize};

/// Entry from the accessible-resources listing. Only `id` (the cloud id) is
/// consumed.
#[derive(Debug, Clone, Deserialize)]
pub struct AccessibleResource {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Space summary from `GET /wiki/api/v2/spaces?keys=...`.
///
/// Confluence documents `id` as a string but older tenants return a number,
/// so it is kept as raw JSON and rendered verbatim into the pages URL.
#[derive(Debug, Clone, Deserialize)]
pub struct Space {
    #[serde(default)]
    pub id: serde_json::Value,
    #[serde(default)]
    pub key: Option<String>,
}

impl Space {
    pub fn id_segment(&self) -> Option<String> {
        match &self.id {
            serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

/// Paginated `{ "results": [...] }` envelope.
#[derive(Debug, Deserialize)]
pub struct Results<T> {
    // A path keeps serde from adding a `T: Default` bound.
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
}

/// Page as returned by `GET /wiki/api/v2/pages/{id}?body-format=view`.
#[derive(Debug, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Option<PageBody>,
}

#[derive(Debug, Deserialize)]
pub struct PageBody {
    #[serde(default)]
    pub view: Option<BodyRepresentation>,
}

#[derive(Debug, Deserialize)]
pub struct BodyRepresentation {
    pub value: String,
}

/// Projection served to clients: title and rendered HTML only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl From<Page> for PageContent {
    fn from(page: Page) -> Self {
        Self {
            title: page.title,
            body: page.body.and_then(|b| b.view).map(|v| v.value),
        }
    }
}
