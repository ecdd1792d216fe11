//! # Domain Models
//!
//! These structs represent the core entities of Khawater.
//! Field names on the wire follow the remote table (`snake_case`), except
//! `isLiked`, which only ever lives in the local cache document.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use uuid::Uuid;

/// Author shown for anonymous whispers.
pub const ANONYMOUS_AUTHOR: &str = "مجهول";

/// Name of the local, unauthenticated user until one is configured.
pub const DEFAULT_USER_NAME: &str = "مستخدم مجهول";

/// Opaque post identifier.
///
/// Locally generated ids are base-36 text; the remote store and the seed data
/// use integers. Both are held as their string form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct PostId(String);

impl PostId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Millisecond timestamp in base 36 followed by a random base-36 suffix.
    pub fn generate() -> Self {
        let millis = Utc::now().timestamp_millis().max(0) as u128;
        let suffix = to_base36(Uuid::new_v4().as_u128());
        let suffix = &suffix[..suffix.len().min(11)];
        Self(format!("{}{}", to_base36(millis), suffix))
    }

    /// Reads an id out of a JSON value returned by the remote store.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) if !s.is_empty() => Some(Self(s.clone())),
            Value::Number(n) => Some(Self(n.to_string())),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PostId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl<'de> Deserialize<'de> for PostId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Number(serde_json::Number),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(s) => Self(s),
            RawId::Number(n) => Self(n.to_string()),
        })
    }
}

fn to_base36(mut n: u128) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

/// Display theme of a whisper.
///
/// The remote store does not validate moods, so unknown tags are kept as-is
/// in [`Mood::Other`] and written back unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Mood {
    #[default]
    Emerald,
    Ocean,
    Amber,
    Rose,
    Violet,
    Sunset,
    Other(String),
}

impl Mood {
    /// Moods offered by the composer.
    pub fn known() -> [Mood; 6] {
        [
            Mood::Emerald,
            Mood::Ocean,
            Mood::Amber,
            Mood::Rose,
            Mood::Violet,
            Mood::Sunset,
        ]
    }

    pub fn as_str(&self) -> &str {
        match self {
            Mood::Emerald => "emerald",
            Mood::Ocean => "ocean",
            Mood::Amber => "amber",
            Mood::Rose => "rose",
            Mood::Violet => "violet",
            Mood::Sunset => "sunset",
            Mood::Other(tag) => tag,
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Mood {
    fn from(tag: &str) -> Self {
        match tag.trim() {
            "" | "emerald" => Mood::Emerald,
            "ocean" => Mood::Ocean,
            "amber" => Mood::Amber,
            "rose" => Mood::Rose,
            "violet" => Mood::Violet,
            "sunset" => Mood::Sunset,
            other => Mood::Other(other.to_string()),
        }
    }
}

impl FromStr for Mood {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Mood::from(s))
    }
}

impl Serialize for Mood {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Mood {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = Option::<String>::deserialize(deserializer)?;
        Ok(tag.as_deref().map(Mood::from).unwrap_or_default())
    }
}

/// The fundamental unit of the board: one whisper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    /// HTML-escaped text, as submitted
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
    #[serde(default)]
    pub mood: Mood,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_anonymous: bool,
    /// Nullable column remotely; `null` reads as empty
    #[serde(default, deserialize_with = "null_as_default")]
    pub author: String,
    /// Derived from the raw content; `null` from the remote reads as empty
    #[serde(default, deserialize_with = "null_as_default")]
    pub hashtags: Vec<String>,
    #[serde(default, deserialize_with = "non_negative")]
    pub likes_count: u64,
    /// Client-local; never sent to the remote store
    #[serde(rename = "isLiked", default)]
    pub is_liked: bool,
    pub created_at: DateTime<Utc>,
}

impl Post {
    /// The record written to the remote store: every column except the
    /// client-local like flag.
    pub fn to_row(&self) -> Value {
        serde_json::json!({
            "id": self.id,
            "content": self.content,
            "mood": self.mood,
            "is_anonymous": self.is_anonymous,
            "author": self.author,
            "hashtags": self.hashtags,
            "likes_count": self.likes_count,
            "created_at": self.created_at,
        })
    }

    pub fn like_state(&self) -> LikeState {
        LikeState {
            post_id: self.id.clone(),
            is_liked: self.is_liked,
            likes_count: self.likes_count,
        }
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn non_negative<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    let count = Option::<i64>::deserialize(deserializer)?.unwrap_or(0);
    Ok(count.max(0) as u64)
}

/// Like affordance of a single post, as signalled to presenters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeState {
    pub post_id: PostId,
    pub is_liked: bool,
    pub likes_count: u64,
}

/// The local, unauthenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Option<String>,
    pub name: String,
    pub is_anonymous: bool,
}

impl UserProfile {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            is_anonymous: false,
        }
    }

    /// Display name for a post written by this user.
    pub fn author_for(&self, anonymous: bool) -> String {
        if anonymous {
            ANONYMOUS_AUTHOR.to_string()
        } else {
            self.name.clone()
        }
    }
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            id: None,
            name: DEFAULT_USER_NAME.to_string(),
            is_anonymous: true,
        }
    }
}
