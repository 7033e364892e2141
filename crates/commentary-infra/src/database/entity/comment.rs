//! Comment entity for SeaORM.

use sea_orm::Set;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "comments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub content_id: Uuid,
    pub username: String,
    #[sea_orm(column_type = "Text")]
    pub comment: String,
    pub created: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::content::Entity",
        from = "Column::ContentId",
        to = "super::content::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Content,
}

impl Related<super::content::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Content.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for commentary_core::domain::Comment {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            content_id: model.content_id,
            username: model.username,
            text: model.comment,
            created_at: model.created.into(),
        }
    }
}

impl From<commentary_core::domain::Comment> for ActiveModel {
    fn from(comment: commentary_core::domain::Comment) -> Self {
        Self {
            id: Set(comment.id),
            content_id: Set(comment.content_id),
            username: Set(comment.username),
            comment: Set(comment.text),
            created: Set(comment.created_at.into()),
        }
    }
}
