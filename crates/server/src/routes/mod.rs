pub mod catalogue;
pub mod health;
pub mod lead;
pub mod related;
pub mod sitemap;
