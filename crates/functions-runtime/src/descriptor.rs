//! The capability shared by every trigger configuration.

use crate::callback::Callback;
use crate::error::ValidationError;
use crate::manifest::Backend;

/// A deployable function: an HTTP or event trigger plus its callback.
///
/// Implementations are immutable value objects. The registry shares them
/// across request handlers, so they must be `Send + Sync`.
pub trait FunctionDescriptor: Send + Sync + 'static {
    /// Append this function's resources to `backend`.
    ///
    /// `symbol` is the name the function was exported under. Implementations
    /// only append; they never touch entries contributed by other functions.
    fn add_backend_description(&self, symbol: &str, backend: &mut Backend);

    /// Check required configuration before the server accepts traffic.
    fn validate(&self) -> Result<(), ValidationError>;

    /// The embedded callback, or `None` when it was never set.
    fn callback(&self) -> Option<Callback>;
}
