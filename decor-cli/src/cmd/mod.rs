pub mod build;
pub mod nav;
