// The core module contains all business logic.
// Each feature gets its own submodule.

#[path = "profile/mod.rs"]
pub mod profile;

#[path = "publish/publish_service.rs"]
pub mod publish;
