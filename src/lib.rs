// src/lib.rs
//! Procedural debris and structure placement for space maps.

pub mod mapgen;
