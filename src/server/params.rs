//! Query string parameters
//!
//! Requests carry everything in the query string: repeated channel ids, an
//! optional channel set, the single-message flag and the generated id length.

use super::config::ServerConfig;

/// Parameters of a relay request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestParams {
    /// Channel ids in request order (empty values skipped)
    pub channel_ids: Vec<String>,
    /// Channel set, `None` for the default set
    pub set: Option<String>,
    /// Whether the subscriber wants a long-lived chunked stream
    pub chunked: bool,
    /// Raw requested id length for `/gen`
    pub id_length: Option<String>,
}

impl RequestParams {
    /// Collect parameters from decoded query pairs
    pub fn from_pairs(pairs: Vec<(String, String)>, config: &ServerConfig) -> Self {
        let mut params = RequestParams {
            chunked: true,
            ..Default::default()
        };

        for (key, value) in pairs {
            if key == config.channel_param {
                if !value.is_empty() {
                    params.channel_ids.push(value);
                }
            } else if key == config.set_param {
                if params.set.is_none() && !value.is_empty() {
                    params.set = Some(value);
                }
            } else if key == config.no_chunked_param {
                params.chunked = false;
            } else if key == config.length_param && params.id_length.is_none() {
                params.id_length = Some(value);
            }
        }

        params
    }

    /// Channel set name, if one was given
    pub fn set(&self) -> Option<&str> {
        self.set.as_deref()
    }
}
