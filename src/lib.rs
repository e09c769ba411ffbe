//! School records server library.
//!
//! Class, exam and grade records with role-scoped reporting: the aggregated
//! academic result sheet, the teacher subject/class view with statistics,
//! grade analytics and live notifications.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod entity;
pub mod error;
pub mod middleware;
pub mod migration;
pub mod models;
pub mod services;
