//! Library crate for matchbook, exposing the conversation core for the binary
//! and integration tests.

pub mod config;
pub mod dao;
pub mod dto;
pub mod error;
pub mod roster;
pub mod services;
pub mod state;
