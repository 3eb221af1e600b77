use std::fmt::Debug;

use serde::Serialize;
use utility::id::{HasId, Id};

pub mod establishment;
pub mod filter;
pub mod stats;

/// Maximum number of records any list query returns.
pub const MAX_RESULTS: usize = 100;

/// A model value together with the id the store assigned to it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WithId<V>
where
    V: HasId,
    V::IdType: Serialize + Debug + Clone + PartialEq,
{
    pub id: Id<V>,
    #[serde(flatten)]
    pub content: V,
}

impl<V> WithId<V>
where
    V: HasId,
    V::IdType: Serialize + Debug + Clone + PartialEq,
{
    pub fn new(id: Id<V>, content: V) -> Self {
        Self { id, content }
    }
}
