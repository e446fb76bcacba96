use serde::{Deserialize, Deserializer, Serialize};

/// One piece of art as served by the gallery API.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct Record {
    pub app: String,
    pub uuid: String,
    #[serde(default, deserialize_with = "string_or_null")]
    pub thumb: String,
    #[serde(default, deserialize_with = "string_or_null")]
    pub title: String,
    #[serde(rename = "public", default, deserialize_with = "lenient_bool")]
    pub is_public: bool,
    pub key: String,
}

/// Body of a `/gallery-api/view` response.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct ViewPage {
    #[serde(default)]
    pub more: bool,
    #[serde(default)]
    pub cursor: Option<String>,
    #[serde(default)]
    pub data: Vec<Record>,
}

impl ViewPage {
    pub fn parse(body: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(body)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum BoolLike {
    Bool(bool),
    Int(i64),
    Str(String),
}

// The datastore has stored the flag both as a boolean and as 0/1.
fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<BoolLike>::deserialize(deserializer)? {
        Some(BoolLike::Bool(b)) => b,
        Some(BoolLike::Int(n)) => n != 0,
        Some(BoolLike::Str(s)) => matches!(s.trim(), "1" | "true"),
        None => false,
    })
}

fn string_or_null<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
