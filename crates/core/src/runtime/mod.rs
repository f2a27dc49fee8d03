mod dispatcher;
mod shutdown;

pub use dispatcher::Runtime;
pub use shutdown::ShutdownGuard;
