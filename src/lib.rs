// src/lib.rs

//! tcgwatch: card-listing monitor library

pub mod error;
pub mod models;
pub mod parse;
pub mod pipeline;
pub mod services;
pub mod storage;
