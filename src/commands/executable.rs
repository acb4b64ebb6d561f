use std::future::Future;

use crate::commands::CommandError;
use crate::frame::Frame;
use crate::store::Store;

/// A fully parsed command, ready to run against the store.
///
/// Execution is async because blocking commands (BLPOP) suspend between store
/// polls; the returned future must be `Send` so it can run inside a spawned
/// connection task.
pub trait Executable {
    fn exec(self, store: Store) -> impl Future<Output = Result<Frame, CommandError>> + Send;
}
