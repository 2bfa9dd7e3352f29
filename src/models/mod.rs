//! Data models for the QuizPix application.
//!
//! These models match the frontend TypeScript interfaces exactly for seamless interoperability.

mod answer;
mod image;
mod quiz;
mod user;

pub use answer::*;
pub use image::*;
pub use quiz::*;
pub use user::*;
