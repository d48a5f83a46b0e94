use super::ids::PageId;
use serde::{Deserialize, Serialize};

/// A published page whose content may contain shortcodes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub id: PageId,
    pub title: String,
    pub slug: String,
    pub content: String,
}
