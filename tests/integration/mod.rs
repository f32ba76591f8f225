//! Integration tests for the assetdex catalog

mod fs_catalog;
mod scenarios;
mod support;
mod vcs_status;
