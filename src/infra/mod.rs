pub mod blob;
pub mod database;
pub mod error_mapper;
pub mod factory;
pub mod repositories;
