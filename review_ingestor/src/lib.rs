pub mod collect;
pub mod models;
pub mod providers;
