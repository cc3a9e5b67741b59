//! Typed endpoint surfaces layered over the request pipeline.
//!
//! Every operation here is a thin wrapper: build a logical request, hand it
//! to the pipeline, decode a typed struct. Business-level validation of
//! request bodies belongs to the server, not to these wrappers.

pub mod batch;
pub mod beta;
pub mod chat;
pub mod embeddings;
pub mod files;
pub mod fine_tuning;
pub mod models;
pub mod moderations;
pub mod ocr;
