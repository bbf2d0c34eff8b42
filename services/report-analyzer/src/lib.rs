//! Drains report ids from the queue, asks the model for an analysis of each
//! report and stores the validated answer.

pub mod answer;
pub mod batch;
pub mod handler;
pub mod fenced_json;
pub mod message;
pub mod pipeline;
pub mod prompt;
