pub mod application;
pub mod nav_item;
pub mod role;
pub mod stage;
pub mod workflow;
