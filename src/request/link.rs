//! Link attributes carried by a create-url request.

use serde::Serialize;
use serde_json::Value;

use super::Payload;
use crate::error::ConstructionError;

/// Attributes of a short link to create.
///
/// Unset attributes are omitted from the payload entirely. `params` holds the
/// deep-link data as a JSON object string and is sent as that string.
/// Fields serialize in declaration order, which is the wire order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct LinkData {
    /// Link type; `0` means the default (multi-use) link and is not sent.
    #[serde(rename = "type", skip_serializing_if = "is_default_type")]
    pub link_type: i32,
    /// Match duration in seconds; only positive values are sent.
    #[serde(skip_serializing_if = "is_unbounded")]
    pub duration: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feature: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    #[serde(rename = "data", skip_serializing_if = "Option::is_none")]
    pub params: Option<String>,
}

fn is_default_type(link_type: &i32) -> bool {
    *link_type == 0
}

fn is_unbounded(duration: &i32) -> bool {
    *duration <= 0
}

impl LinkData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alias(mut self, alias: &str) -> Self {
        self.alias = Some(alias.to_string());
        self
    }

    pub fn link_type(mut self, link_type: i32) -> Self {
        self.link_type = link_type;
        self
    }

    pub fn duration(mut self, duration: i32) -> Self {
        self.duration = duration;
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    pub fn channel(mut self, channel: &str) -> Self {
        self.channel = Some(channel.to_string());
        self
    }

    pub fn feature(mut self, feature: &str) -> Self {
        self.feature = Some(feature.to_string());
        self
    }

    pub fn stage(mut self, stage: &str) -> Self {
        self.stage = Some(stage.to_string());
        self
    }

    pub fn params(mut self, params: &str) -> Self {
        self.params = Some(params.to_string());
        self
    }

    /// Append the link attributes to `post`.
    ///
    /// Fails when `params` is present but is not a JSON object.
    pub(crate) fn write_into(&self, post: &mut Payload) -> Result<(), ConstructionError> {
        if let Some(params) = &self.params {
            match serde_json::from_str::<Value>(params) {
                Ok(Value::Object(_)) => {}
                Ok(other) => {
                    return Err(ConstructionError::InvalidParams(format!(
                        "expected an object, got `{other}`"
                    )))
                }
                Err(e) => return Err(ConstructionError::InvalidParams(e.to_string())),
            }
        }

        let fields = serde_json::to_value(self)
            .map_err(|e| ConstructionError::InvalidParams(e.to_string()))?;
        if let Value::Object(fields) = fields {
            post.extend(fields);
        }
        Ok(())
    }
}
