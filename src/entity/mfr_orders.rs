use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "mfr_orders")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: Uuid,
    pub order_number: String,
    pub supplier_name: String,
    pub status: String,
    pub total_cost: i64,
    pub order_date: DateTimeWithTimeZone,
    pub expected_delivery_date: DateTimeWithTimeZone,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::mfr_order_items::Entity")]
    MfrOrderItems,
}

impl Related<super::mfr_order_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MfrOrderItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
