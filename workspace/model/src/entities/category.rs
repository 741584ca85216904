use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Whether a category classifies expenses or income.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CategoryKind {
    #[sea_orm(string_value = "EXPENSE")]
    Expense,
    #[sea_orm(string_value = "INCOME")]
    Income,
}

/// A transaction category. Hierarchy is a single level deep: a
/// subcategory points at a root category and inherits its kind; a
/// subcategory can never be a parent itself.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "categories")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub owner_id: i32,
    pub name: String,
    pub kind: CategoryKind,
    pub color: String,
    pub icon: String,
    /// Self-referencing foreign key; `None` for root categories.
    pub parent_id: Option<i32>,
    /// Soft delete.
    #[sea_orm(default_value = "true")]
    pub is_active: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::OwnerId",
        to = "super::user::Column::Id"
    )]
    User,
    #[sea_orm(belongs_to = "Entity", from = "Column::ParentId", to = "Column::Id")]
    Parent,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Gets all direct, active children of this category.
    pub async fn children(&self, db: &DatabaseConnection) -> Result<Vec<Model>, DbErr> {
        Entity::find()
            .filter(Column::ParentId.eq(self.id))
            .filter(Column::IsActive.eq(true))
            .all(db)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::user;
    use sea_orm::sea_query::SqliteQueryBuilder;
    use sea_orm::{Database, DbBackend, Schema, Set, Statement};

    /// Creates the categories table and the users table its owner FK
    /// points at, then seeds the owner every fixture category uses.
    async fn setup_test_db() -> DatabaseConnection {
        let db = Database::connect("sqlite::memory:").await.unwrap();

        let schema = Schema::new(DbBackend::Sqlite);
        for stmt in [
            schema.create_table_from_entity(user::Entity),
            schema.create_table_from_entity(Entity),
        ] {
            let statement =
                Statement::from_string(DbBackend::Sqlite, stmt.to_string(SqliteQueryBuilder));
            db.execute(statement).await.unwrap();
        }

        user::ActiveModel {
            username: Set("tester".to_string()),
            ..Default::default()
        }
        .insert(&db)
        .await
        .unwrap();

        db
    }

    async fn create_test_category(
        db: &DatabaseConnection,
        name: &str,
        kind: CategoryKind,
        parent_id: Option<i32>,
        is_active: bool,
    ) -> Model {
        let category = ActiveModel {
            owner_id: Set(1),
            name: Set(name.to_string()),
            kind: Set(kind),
            color: Set("#6366f1".to_string()),
            icon: Set("tag".to_string()),
            parent_id: Set(parent_id),
            is_active: Set(is_active),
            ..Default::default()
        };

        category.insert(db).await.unwrap()
    }

    #[tokio::test]
    async fn test_children_of_root_category() {
        let db = setup_test_db().await;

        let root = create_test_category(&db, "Food", CategoryKind::Expense, None, true).await;
        let groceries =
            create_test_category(&db, "Groceries", CategoryKind::Expense, Some(root.id), true)
                .await;
        let eating_out =
            create_test_category(&db, "Eating out", CategoryKind::Expense, Some(root.id), true)
                .await;

        let children = root.children(&db).await.unwrap();
        assert_eq!(children.len(), 2);
        assert!(children.iter().any(|c| c.id == groceries.id));
        assert!(children.iter().any(|c| c.id == eating_out.id));
    }

    #[tokio::test]
    async fn test_owner_reachable_from_category() {
        let db = setup_test_db().await;

        let root = create_test_category(&db, "Food", CategoryKind::Expense, None, true).await;
        let owner = root
            .find_related(user::Entity)
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(owner.id, root.owner_id);
        assert_eq!(owner.username, "tester");
    }

    #[tokio::test]
    async fn test_children_skips_inactive() {
        let db = setup_test_db().await;

        let root = create_test_category(&db, "Home", CategoryKind::Expense, None, true).await;
        create_test_category(&db, "Rent", CategoryKind::Expense, Some(root.id), true).await;
        create_test_category(&db, "Old", CategoryKind::Expense, Some(root.id), false).await;

        let children = root.children(&db).await.unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].name, "Rent");
    }
}
