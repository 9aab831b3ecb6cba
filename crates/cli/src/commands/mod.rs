//! CLI subcommands

pub mod landing;
pub mod predict;
pub mod status;
