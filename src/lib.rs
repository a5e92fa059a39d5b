//! Core of the volume dashboard: configuration, dataset loading and the
//! filter & aggregation engine. The egui front-end lives in the binary.

pub mod config;
pub mod data;
