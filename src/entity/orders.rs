use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub city: String,
    pub country: String,
    pub state: String,
    pub zipcode: String,
    /// JSON array of book ids, in submission order.
    pub product_ids: Json,
    pub total_price: f64,
    #[sea_orm(unique)]
    pub idempotency_key: Option<String>,
    /// SHA-256 of the submission stored with `idempotency_key`.
    pub request_hash: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
