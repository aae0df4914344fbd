pub mod auth;
pub mod books;
pub mod uploads;

use bookworm_kernel::ModuleRegistry;

use crate::state::AppState;

/// Register all application modules with the registry.
pub fn register_all(registry: &mut ModuleRegistry, state: &AppState) {
    registry.register(auth::create_module(state.clone()));
    registry.register(books::create_module(state.clone()));
    registry.register(uploads::create_module(state.clone()));
}
