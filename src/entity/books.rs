use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "books")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub genre: String,
    #[sea_orm(unique)]
    pub isbn: String,
    pub summary: String,
    pub publisher: String,
    pub publication_date: Date,
    pub page_count: i32,
    pub language: String,
    pub cover_image_url: String,
    pub quantity: i32,
    pub price: i64,
    pub low_stock_threshold: i32,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::sale_items::Entity")]
    SaleItems,
    #[sea_orm(has_many = "super::mfr_order_items::Entity")]
    MfrOrderItems,
}

impl Related<super::sale_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SaleItems.def()
    }
}

impl Related<super::mfr_order_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MfrOrderItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
