//! Developer editing layer for a bilingual (Arabic/English) storefront page.
//!
//! The page markup is kept pristine; every edit lives in a [`models::SiteConfig`]
//! that is persisted locally, optionally published, and overlaid onto the
//! markup whenever the page is built.

pub mod commands;
pub mod config;
pub mod dom;
pub mod editor;
pub mod identity;
pub mod locale;
pub mod markup;
pub mod models;
pub mod overlay;
pub mod publish;
pub mod reconcile;
pub mod relay;
pub mod store;
