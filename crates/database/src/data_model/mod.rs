use std::fmt::Debug;

use model::WithId;
use serde::Serialize;
use utility::id::{HasId, Id};

pub mod establishment;

pub trait DatabaseRow {
    type Model: HasId;

    fn get_id(&self) -> Id<Self::Model>;
    fn to_model(self) -> Self::Model;
}

pub fn with_ids<R: DatabaseRow>(rows: Vec<R>) -> Vec<WithId<R::Model>>
where
    <R::Model as HasId>::IdType: Debug + Clone + PartialEq + Serialize,
{
    rows.into_iter().map(with_id).collect::<Vec<_>>()
}

pub fn with_id<R: DatabaseRow>(row: R) -> WithId<R::Model>
where
    <R::Model as HasId>::IdType: Debug + Clone + PartialEq + Serialize,
{
    WithId::new(row.get_id(), row.to_model())
}
