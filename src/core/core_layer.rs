// The core module contains all business logic.
// Each feature gets its own submodule.

#[path = "ads/mod.rs"]
pub mod ads;

#[path = "media/mod.rs"]
pub mod media;

#[path = "pipeline/mod.rs"]
pub mod pipeline;

#[path = "settings/settings_models.rs"]
pub mod settings;

#[path = "sheets/mod.rs"]
pub mod sheets;
