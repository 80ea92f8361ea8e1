use serde::{Deserialize, Deserializer, Serialize};

/// Storage key of the persisted group selection.
pub const SELECTED_GROUP_KEY: &str = "selectedGroup";

/// A class/cohort as returned by group search; the selected one is persisted as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedGroup {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GroupSearchParams {
    #[serde(default)]
    pub term: String,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(i64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(s) => s,
        Id::Number(n) => n.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_and_text_ids() {
        let numeric: SelectedGroup =
            serde_json::from_str(r#"{"id": 493, "label": "ПИН-221", "description": "ФИТиКС"}"#).unwrap();
        assert_eq!(numeric.id, "493");

        let text: SelectedGroup = serde_json::from_str(r#"{"id": "493", "label": "ПИН-221"}"#).unwrap();
        assert_eq!(text.id, "493");
        assert_eq!(text.description, None);
    }
}
