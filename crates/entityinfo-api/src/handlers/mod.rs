//! HTTP handlers grouped by resource.

pub mod attributes;
pub mod files;
pub mod folders;
pub mod health;
pub mod manifests;
pub mod meta;
pub mod projects;
pub mod users;
pub mod workbench;
