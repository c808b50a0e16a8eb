pub mod category;
pub mod lot;
pub mod price_list;
pub mod price_list_item;
pub mod product;
pub mod supplier;
pub mod user;
