use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(unique)]
    pub username: String,
    pub password_hash: String,

    // Role labels, stored as a JSON array of strings
    pub roles: String,

    pub active: bool,

    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::note::Entity")]
    Notes,
}

impl Related<super::note::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Notes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Decode the stored JSON role array
    ///
    /// A row written by this application always holds a valid JSON array;
    /// anything else decodes to an empty list rather than failing a read.
    pub fn role_labels(&self) -> Vec<String> {
        serde_json::from_str(&self.roles).unwrap_or_default()
    }
}
