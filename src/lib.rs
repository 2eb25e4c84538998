pub mod config;
pub mod domain;
pub mod error;
pub mod fs_util;
pub mod reads;
pub mod receipt;
pub mod runs;
pub mod samples;
pub mod table;
pub mod xml;
