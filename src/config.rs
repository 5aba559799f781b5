// ABOUTME: Version and banner constants for the CLI

pub const VERSION: &str = "0.1.0";
