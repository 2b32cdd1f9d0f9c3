use tracing::Level;

/// Install a `tracing-subscriber` fmt subscriber as the global default.
///
/// Returns `false` when a subscriber is already installed, so embedding
/// applications and tests can call this more than once.
pub fn init_tracing(max_level: Level) -> bool {
    tracing_subscriber::fmt()
        .with_max_level(max_level)
        .with_target(false)
        .try_init()
        .is_ok()
}
