//! Signed init-data issued by the chat platform to mini-apps.
//!
//! The payload is a query string. Its `hash` field is
//! `hex(HMAC_SHA256(secret, data_check_string))` where
//! `secret = HMAC_SHA256("WebAppData", bot_token)` and the data-check string
//! is every other field as `key=value`, sorted by key and joined with `\n`.

use serde::{Deserialize, Serialize};
use tracing::debug;
use url::form_urlencoded;

use crate::rng::hmac_sha256;

const SECRET_KEY_LABEL: &[u8] = b"WebAppData";
const HASH_FIELD: &str = "hash";
const USER_FIELD: &str = "user";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InitDataError {
    #[error("init data carries no hash")]
    MissingHash,
    #[error("init data carries no user")]
    MissingUser,
    #[error("user field is not valid: {0}")]
    InvalidUser(String),
}

/// The invoking user, as embedded in the `user` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebAppUser {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_premium: Option<bool>,
}

/// Decoded key/value pairs in their original order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InitData {
    pairs: Vec<(String, String)>,
}

impl InitData {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.strip_prefix('?').unwrap_or(raw);
        let pairs = form_urlencoded::parse(raw.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        Self { pairs }
    }

    /// First value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn hash(&self) -> Option<&str> {
        self.get(HASH_FIELD)
    }

    pub fn data_check_string(&self) -> String {
        let mut fields: Vec<&(String, String)> =
            self.pairs.iter().filter(|(k, _)| k != HASH_FIELD).collect();
        // stable, so repeated keys keep their relative order
        fields.sort_by(|a, b| a.0.cmp(&b.0));
        fields
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn is_signed_by(&self, bot_token: &str) -> bool {
        let Some(hash) = self.hash() else {
            debug!("init data rejected: no hash");
            return false;
        };
        let expected = sign(&self.data_check_string(), bot_token);
        if expected != hash {
            debug!("init data rejected: signature mismatch");
            return false;
        }
        true
    }

    pub fn user(&self) -> Result<WebAppUser, InitDataError> {
        let raw = self.get(USER_FIELD).ok_or(InitDataError::MissingUser)?;
        serde_json::from_str(raw).map_err(|e| InitDataError::InvalidUser(e.to_string()))
    }
}

/// `HMAC_SHA256(key = "WebAppData", msg = bot_token)`.
pub fn secret_key(bot_token: &str) -> [u8; 32] {
    hmac_sha256(SECRET_KEY_LABEL, bot_token.as_bytes())
}

/// Hex signature of a data-check string.
pub fn sign(data_check_string: &str, bot_token: &str) -> String {
    hex::encode(hmac_sha256(&secret_key(bot_token), data_check_string.as_bytes()))
}

/// Single-shot gate: `true` only when `raw` carries a hash and it matches.
pub fn validate(raw: &str, bot_token: &str) -> bool {
    InitData::parse(raw).is_signed_by(bot_token)
}

/// Encode `fields` as a query string with a valid `hash` appended.
pub fn sign_init_data<K, V>(fields: &[(K, V)], bot_token: &str) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let data = InitData {
        pairs: fields
            .iter()
            .filter(|(k, _)| k.as_ref() != HASH_FIELD)
            .map(|(k, v)| (k.as_ref().to_string(), v.as_ref().to_string()))
            .collect(),
    };
    let hash = sign(&data.data_check_string(), bot_token);

    let mut out = form_urlencoded::Serializer::new(String::new());
    for (k, v) in &data.pairs {
        out.append_pair(k, v);
    }
    out.append_pair(HASH_FIELD, &hash);
    out.finish()
}
