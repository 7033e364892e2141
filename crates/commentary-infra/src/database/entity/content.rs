//! Content entity for SeaORM.

use sea_orm::Set;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "contents")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub slug: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub content: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::comment::Entity")]
    Comment,
}

impl Related<super::comment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for commentary_core::domain::Content {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            slug: model.slug,
            body: model.content,
        }
    }
}

impl From<commentary_core::domain::Content> for ActiveModel {
    fn from(content: commentary_core::domain::Content) -> Self {
        Self {
            id: Set(content.id),
            slug: Set(content.slug),
            content: Set(content.body),
        }
    }
}
