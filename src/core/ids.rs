//! Numeric identifiers
//!
//! Every stored record is addressed by a positive integer, matching the
//! identifiers the REST surface exposes. Zero is reserved for "nobody".

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! numeric_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            /// Raw integer value
            #[must_use]
            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

numeric_id!(
    /// Identifier of a ticket
    TicketId
);
numeric_id!(
    /// Identifier of a user account
    UserId
);
numeric_id!(
    /// Identifier of a reply
    ReplyId
);
numeric_id!(
    /// Identifier of a category term
    TermId
);
numeric_id!(
    /// Identifier of a page
    PageId
);
