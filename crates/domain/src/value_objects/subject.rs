//! Render subjects - the operator or enemy whose skeleton gets animated.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DomainError;

/// What kind of entity a subject is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubjectKind {
    Operator,
    Enemy,
}

impl SubjectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Operator => "operator",
            Self::Enemy => "enemy",
        }
    }
}

impl fmt::Display for SubjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubjectKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "operator" => Ok(Self::Operator),
            "enemy" => Ok(Self::Enemy),
            other => Err(DomainError::parse(format!("Unknown subject kind: {other}"))),
        }
    }
}

/// Which side of an operator's battle skeleton to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Front,
    Back,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Front => "front",
            Self::Back => "back",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "front" => Ok(Self::Front),
            "back" => Ok(Self::Back),
            other => Err(DomainError::parse(format!("Unknown direction: {other}"))),
        }
    }
}

/// A resolved render subject.
///
/// `id` is the storage identifier of the skeleton (an operator's skin or
/// prefab id, an enemy's id). Operators always carry a direction, enemies
/// never do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    kind: SubjectKind,
    id: String,
    direction: Option<Direction>,
    display_name: String,
}

impl Subject {
    pub fn operator(
        id: impl Into<String>,
        direction: Direction,
        display_name: impl Into<String>,
    ) -> Result<Self, DomainError> {
        Self::build(SubjectKind::Operator, id.into(), Some(direction), display_name.into())
    }

    pub fn enemy(id: impl Into<String>, display_name: impl Into<String>) -> Result<Self, DomainError> {
        Self::build(SubjectKind::Enemy, id.into(), None, display_name.into())
    }

    fn build(
        kind: SubjectKind,
        id: String,
        direction: Option<Direction>,
        display_name: String,
    ) -> Result<Self, DomainError> {
        let id = id.trim().to_string();
        if id.is_empty() {
            return Err(DomainError::validation("Subject id cannot be empty"));
        }
        Ok(Self {
            kind,
            id,
            direction,
            display_name,
        })
    }

    pub fn kind(&self) -> SubjectKind {
        self.kind
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn direction(&self) -> Option<Direction> {
        self.direction
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }
}
