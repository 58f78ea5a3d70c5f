pub mod config;
pub mod logging;

pub mod checksum;
pub mod fetch;
pub mod fixer;
pub mod index;
pub mod lockfile;
pub mod project;
pub mod url_model;
