use std::collections::HashMap;

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::de::Error;
use serde_json_bytes::ByteString;
use serde_json_bytes::Map as JsonMap;
use serde_json_bytes::Value;

use crate::json_ext::Object;

/// The options of a GraphQL request, as decoded by the transport.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct RequestOptions {
    /// The GraphQL document.
    #[serde(default)]
    pub query: String,

    /// The variables of the operation.
    ///
    /// Some clients send them as a JSON-encoded string, or as `null`.
    #[serde(
        skip_serializing_if = "Object::is_empty",
        default,
        deserialize_with = "deserialize_variables"
    )]
    pub variables: Object,

    /// The operation to run, when the document holds more than one.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub operation_name: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawVariables {
    Object(Object),
    Encoded(String),
}

fn deserialize_variables<'de, D>(deserializer: D) -> Result<Object, D::Error>
where
    D: Deserializer<'de>,
{
    match <Option<RawVariables>>::deserialize(deserializer)? {
        None => Ok(Object::default()),
        Some(RawVariables::Object(variables)) => Ok(variables),
        Some(RawVariables::Encoded(encoded)) => decode_variables(&encoded).map_err(D::Error::custom),
    }
}

/// Decodes variables sent as a JSON string; an empty string means no variables.
fn decode_variables(encoded: &str) -> Result<Object, serde_json::Error> {
    if encoded.trim().is_empty() {
        return Ok(Object::default());
    }
    let variables: Option<Object> = serde_json::from_str(encoded)?;
    Ok(variables.unwrap_or_default())
}

#[buildstructor::buildstructor]
impl RequestOptions {
    #[builder(visibility = "pub")]
    fn new(
        query: String,
        // Skip the `Object` type alias in order to use buildstructor's map special-casing
        variables: JsonMap<ByteString, Value>,
        operation_name: Option<String>,
    ) -> Self {
        Self {
            query,
            variables,
            operation_name,
        }
    }

    /// Reads request options from URL-encoded form fields or query string parameters.
    ///
    /// Returns `None` when there is no `query` parameter.
    pub fn from_urlencoded(encoded: &str) -> Result<Option<Self>, serde_json::Error> {
        let mut fields: HashMap<String, String> =
            serde_urlencoded::from_str(encoded).map_err(serde_json::Error::custom)?;
        let Some(query) = fields.remove("query").filter(|query| !query.is_empty()) else {
            return Ok(None);
        };
        let variables = match fields.get("variables") {
            Some(encoded) => decode_variables(encoded)?,
            None => Object::default(),
        };
        Ok(Some(Self {
            query,
            variables,
            operation_name: fields.remove("operationName").filter(|name| !name.is_empty()),
        }))
    }

    /// The value of variable `name`.
    pub fn variable(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }
}
