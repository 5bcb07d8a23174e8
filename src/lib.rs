//! Newsdesk - a small multi-user news site
//!
//! Readers browse articles grouped into blogs; registered users sign in and
//! edit their own articles; superusers publish new ones with an image.

pub mod cli;
pub mod config;
pub mod db;
pub mod forms;
pub mod models;
pub mod services;
pub mod templates;
pub mod web;
