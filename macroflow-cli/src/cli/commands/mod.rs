pub mod import;
pub mod inspect;
pub mod rebuild_org;
pub mod repopulate;
pub mod status;
