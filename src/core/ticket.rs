use super::ids::{TermId, TicketId, UserId};
use crate::error::{Result, TickeficError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Urgency of a ticket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
}

impl Priority {
    pub const ALL: [Self; 3] = [Self::Low, Self::Normal, Self::High];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Normal => "normal",
            Self::High => "high",
        }
    }

    /// Capitalized label used in listings
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Normal => "Normal",
            Self::High => "High",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = TickeficError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| {
                TickeficError::invalid_param(
                    super::meta::PRIORITY_KEY,
                    format!("'{s}' is not one of low, normal, high"),
                )
            })
    }
}

/// Workflow state of a ticket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[default]
    Open,
    InProgress,
    Closed,
}

impl Status {
    pub const ALL: [Self; 3] = [Self::Open, Self::InProgress, Self::Closed];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::InProgress => "in_progress",
            Self::Closed => "closed",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Open => "Open",
            Self::InProgress => "In Progress",
            Self::Closed => "Closed",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = TickeficError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|st| st.as_str() == s)
            .ok_or_else(|| {
                TickeficError::invalid_param(
                    super::meta::STATUS_KEY,
                    format!("'{s}' is not one of open, in_progress, closed"),
                )
            })
    }
}

/// Publication state of the underlying content item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    #[default]
    Publish,
    Draft,
    Pending,
    Private,
}

impl PostStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Publish => "publish",
            Self::Draft => "draft",
            Self::Pending => "pending",
            Self::Private => "private",
        }
    }
}

impl FromStr for PostStatus {
    type Err = TickeficError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "publish" => Ok(Self::Publish),
            "draft" => Ok(Self::Draft),
            "pending" => Ok(Self::Pending),
            "private" => Ok(Self::Private),
            other => Err(TickeficError::invalid_param(
                "status",
                format!("'{other}' is not a valid post status"),
            )),
        }
    }
}

/// Typed ticket meta
///
/// Always holds a value from each enumerated set; absent input falls back to
/// the `Default` impl, which mirrors the registered meta defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TicketMeta {
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub assigned_agent: Option<UserId>,
}

/// A support request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: TicketId,
    pub title: String,
    pub content: String,
    pub author: UserId,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    #[serde(default)]
    pub post_status: PostStatus,
    #[serde(default)]
    pub meta: TicketMeta,
    #[serde(default)]
    pub categories: Vec<TermId>,
}

impl Ticket {
    /// Create an open, normal-priority ticket authored by `author`
    pub fn new(title: impl Into<String>, content: impl Into<String>, author: UserId) -> Self {
        let now = Utc::now();
        Self {
            id: TicketId::default(),
            title: title.into(),
            content: content.into(),
            author,
            created_at: now,
            modified_at: now,
            post_status: PostStatus::default(),
            meta: TicketMeta::default(),
            categories: Vec::new(),
        }
    }

    #[must_use]
    pub fn is_published(&self) -> bool {
        self.post_status == PostStatus::Publish
    }

    #[must_use]
    pub fn is_authored_by(&self, user: UserId) -> bool {
        self.author == user
    }
}
