use serde::{Deserialize, Deserializer, Serialize};

/// Body of create and update requests. Unknown fields are ignored.
///
/// `name` and `price` keep an absent key (`None`) apart from an explicit
/// `null` (`Some(None)`): an update may omit them but never clear them.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductRequest {
    #[serde(default, deserialize_with = "present")]
    pub name: Option<Option<String>>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub price: Option<Option<f64>>,
    pub category: Option<String>,
}

fn present<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}
