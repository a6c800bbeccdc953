//! Links a chat identity (`platform`, `platform_user_id`) to a ledger user.

use sea_orm::entity::prelude::*;
use uuid::Uuid;

/// Identity resolved from a chat platform.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlatformUser {
    pub user_id: Uuid,
    pub verified: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "platform_users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub platform: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub platform_user_id: String,
    pub user_id: Uuid,
    pub verified: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Users,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for PlatformUser {
    fn from(model: Model) -> Self {
        Self {
            user_id: model.user_id,
            verified: model.verified,
        }
    }
}
