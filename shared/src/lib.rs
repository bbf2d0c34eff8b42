//! Building blocks shared by the report analysis services: configuration
//! handling, the report/answer data model, the relational store gateway,
//! the inference gateway and Kafka helpers.

pub mod config;
pub mod db;
pub mod dto;
pub mod error;
pub mod inference;
pub mod kafka;
pub mod sigv4;
