//! Newtype wrappers for the identifiers that cross module boundaries.
//!
//! These provide type safety so a `ChatId` can never be passed where a
//! `RequestId` is expected, even though both are backed by different
//! primitive types.

use serde::{Deserialize, Serialize};
use sqlx::Type;
use std::fmt;
use uuid::Uuid;

/// External chat id, as assigned by the chat platform. 64-bit signed so group
/// migrations (which mint negative ids for supergroups) round-trip without
/// precision loss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Type)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct ChatId(pub i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Type)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct RequestId(pub Uuid);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Type)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct AlertId(pub Uuid);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Type)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct FeedbackId(pub Uuid);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Type)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct FaqItemId(pub Uuid);

macro_rules! id_boilerplate {
  ($ty:ident, $inner:ty) => {
    impl fmt::Display for $ty {
      fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
      }
    }

    impl From<$inner> for $ty {
      fn from(id: $inner) -> Self {
        $ty(id)
      }
    }

    impl From<$ty> for $inner {
      fn from(id: $ty) -> Self {
        id.0
      }
    }

    impl $ty {
      pub fn new(id: $inner) -> Self {
        $ty(id)
      }

      pub fn inner(&self) -> $inner {
        self.0
      }
    }
  };
}

id_boilerplate!(ChatId, i64);
id_boilerplate!(RequestId, Uuid);
id_boilerplate!(AlertId, Uuid);
id_boilerplate!(FeedbackId, Uuid);
id_boilerplate!(FaqItemId, Uuid);

impl RequestId {
  pub fn generate() -> Self {
    RequestId(Uuid::new_v4())
  }
}

impl AlertId {
  pub fn generate() -> Self {
    AlertId(Uuid::new_v4())
  }
}

impl FeedbackId {
  pub fn generate() -> Self {
    FeedbackId(Uuid::new_v4())
  }
}

impl FaqItemId {
  pub fn generate() -> Self {
    FaqItemId(Uuid::new_v4())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn chat_id_round_trips_through_i64() {
    let id = ChatId::new(-100123456789);
    let raw: i64 = id.into();
    assert_eq!(raw, -100123456789);
    assert_eq!(format!("{}", id), "-100123456789");
  }

  #[test]
  fn request_ids_are_generated_unique() {
    let a = RequestId::generate();
    let b = RequestId::generate();
    assert_ne!(a, b);
  }
}
