pub mod handle;
pub mod session;

pub use handle::SessionHandle;
pub use session::SessionPhase;
