//! Trailmap Core Types and Definitions
//!
//! This crate provides the foundational types shared by the Trailmap layout
//! engine and its command-line interface. It includes:
//!
//! - **Colors**: Color handling with CSS color support ([`color::Color`])
//! - **Geometry**: Basic geometric types ([`geometry`] module)
//! - **Events**: The incident event input model ([`event`] module)

pub mod color;
pub mod event;
pub mod geometry;
