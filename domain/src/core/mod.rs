//! Core helpers shared across subdomains.

pub mod string;
