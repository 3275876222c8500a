//! Integration tests for Ktuvit
//!
//! Tests are organized by component:
//! - ktuvit_test: search, resolution cache, listings, download, login
//! - cinemeta_test: IMDB name lookup
//! - charset_test: streaming charset detection
//! - scrape_test: subtitle listing scraper
//! - cli_test: binary exit codes

// Note: Each test file is a separate integration test crate
// Tests are run individually by cargo, not via mod.rs
