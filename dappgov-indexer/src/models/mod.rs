//! Data models for projected governance and registry state

pub mod bundle;
pub mod content;
pub mod dapp;
pub mod proposal;

pub use bundle::*;
pub use content::*;
pub use dapp::*;
pub use proposal::*;
