// src/controllers/mod.rs
pub mod registration;
pub mod rotator;
