//! Typed values stored on a blackboard

use std::fmt;

use serde::{Deserialize, Serialize};

/// A single fact about the world as an agent knows it.
///
/// Serialized untagged so `door_closed = true` or `"gold": 12` map straight
/// onto the matching variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Fact {
    Bool(bool),
    Int(i64),
    Float(f32),
    Text(String),
}

impl Fact {
    /// Short name of the variant, used in type mismatch errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Fact::Bool(_) => "bool",
            Fact::Int(_) => "int",
            Fact::Float(_) => "float",
            Fact::Text(_) => "text",
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Fact::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Fact::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f32> {
        match self {
            Fact::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Fact::Text(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for Fact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fact::Bool(v) => write!(f, "{v}"),
            Fact::Int(v) => write!(f, "{v}"),
            Fact::Float(v) => write!(f, "{v}"),
            Fact::Text(v) => write!(f, "{v:?}"),
        }
    }
}

impl From<bool> for Fact {
    fn from(v: bool) -> Self {
        Fact::Bool(v)
    }
}

impl From<i64> for Fact {
    fn from(v: i64) -> Self {
        Fact::Int(v)
    }
}

impl From<f32> for Fact {
    fn from(v: f32) -> Self {
        Fact::Float(v)
    }
}

impl From<&str> for Fact {
    fn from(v: &str) -> Self {
        Fact::Text(v.to_string())
    }
}

impl From<String> for Fact {
    fn from(v: String) -> Self {
        Fact::Text(v)
    }
}
