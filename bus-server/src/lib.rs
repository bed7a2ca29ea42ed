//! Phnom Penh bus trip planner server.
//!
//! A web application that answers: "how do I get from this bus stop to
//! that one, and what will it cost?"

pub mod cache;
pub mod domain;
pub mod network;
pub mod planner;
pub mod resolver;
pub mod source;
pub mod web;
