// The infra module contains implementations of core traits.
// Each feature implementation goes in its own submodule.

#[path = "google_auth/mod.rs"]
pub mod google_auth;

#[path = "ads/mod.rs"]
pub mod ads;

#[path = "media/mod.rs"]
pub mod media;

#[path = "sheets/mod.rs"]
pub mod sheets;

#[path = "settings/yaml_loader.rs"]
pub mod settings;
