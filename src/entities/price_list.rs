use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Default currency for new price lists.
pub const DEFAULT_CURRENCY: &str = "EUR";

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "price_lists")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub name: String,
    pub channel: String,
    pub currency: String,
    pub notes: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::price_list_item::Entity")]
    Items,
}

impl Related<super::price_list_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Sales channel a price list applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Channel {
    Generale,
    B2b,
    B2c,
    HoReCa,
}

impl Channel {
    pub const ALL: [Channel; 4] = [Channel::Generale, Channel::B2b, Channel::B2c, Channel::HoReCa];

    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Generale => "Generale",
            Channel::B2b => "B2B",
            Channel::B2c => "B2C",
            Channel::HoReCa => "Ho.Re.Ca.",
        }
    }

    /// Parses a form/query value, falling back to Generale for anything unknown.
    pub fn parse_or_default(value: &str) -> Channel {
        Channel::ALL
            .into_iter()
            .find(|c| c.as_str() == value)
            .unwrap_or(Channel::Generale)
    }

    pub fn labels() -> Vec<&'static str> {
        Channel::ALL.iter().map(|c| c.as_str()).collect()
    }
}
