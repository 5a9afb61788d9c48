// Tabspace services
// Services around the tab model: settings, favicon fetching and automatic
// page suspension.

pub mod favicon_service;
pub mod page_suspension;
pub mod settings_engine;
