//! Coffee shop sales dashboard: a typed query engine over point-of-sale
//! transactions plus an egui front end.

pub mod app;
pub mod color;
pub mod config;
pub mod data;
pub mod state;
pub mod ui;
