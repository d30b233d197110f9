use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "mfr_order_items")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: Uuid,
    pub mfr_order_id: Uuid,
    pub book_id: Uuid,
    pub quantity: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::mfr_orders::Entity",
        from = "Column::MfrOrderId",
        to = "super::mfr_orders::Column::Id"
    )]
    MfrOrders,
    #[sea_orm(
        belongs_to = "super::books::Entity",
        from = "Column::BookId",
        to = "super::books::Column::Id"
    )]
    Books,
}

impl Related<super::mfr_orders::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MfrOrders.def()
    }
}

impl Related<super::books::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Books.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
