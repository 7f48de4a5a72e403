use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use log::{error, info};
use tokio::runtime::Runtime;

use crate::errors::{Error, RuntimeError};

/// A shared flag asking a loop to stop.
///
/// All clones observe the same flag. It is never raised by default, so a loop guarded by a fresh
/// token runs until some clone calls [`StopToken::stop`].
#[derive(Clone, Debug, Default)]
pub struct StopToken(Arc<AtomicBool>);

impl StopToken {
    /// Raises the flag.
    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Checks whether the flag has been raised.
    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Raises the flag when the process receives Ctrl-C (SIGINT).
    ///
    /// The signal is awaited on a dedicated thread running its own single-threaded runtime; that
    /// thread only ever touches the flag.
    ///
    /// # Errors
    /// * `RuntimeError`: the signal runtime could not be built.
    /// * `Unknown`: the listening thread could not be spawned.
    pub fn stop_on_ctrl_c(&self) -> Result<JoinHandle<()>, Error> {
        let runtime = signal_runtime()?;
        let token = self.clone();

        let handle = std::thread::Builder::new()
            .name(String::from("stop-signal"))
            .spawn(move || {
                runtime.block_on(async move {
                    match tokio::signal::ctrl_c().await {
                        Ok(()) => {
                            info!("Stop requested");
                            token.stop();
                        }
                        Err(err) => error!("Cannot listen for the stop signal: {}", err),
                    }
                })
            })?;
        Ok(handle)
    }
}

/// Builds the single-threaded runtime the stop signal is awaited on.
fn signal_runtime() -> Result<Runtime, Error> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|_| RuntimeError)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop() {
        let token = StopToken::default();
        assert!(!token.is_stopped());
        token.stop();
        assert!(token.is_stopped());
        // Stopping twice is harmless.
        token.stop();
        assert!(token.is_stopped());
    }

    #[test]
    fn test_clones_share_the_flag() {
        let token = StopToken::default();
        let clone = token.clone();
        let other = StopToken::default();

        clone.stop();
        assert!(token.is_stopped());
        assert!(!other.is_stopped());
    }

    #[test]
    fn test_stop_from_another_thread() {
        let token = StopToken::default();
        let clone = token.clone();
        std::thread::spawn(move || clone.stop()).join().unwrap();
        assert!(token.is_stopped());
    }

    #[test]
    fn test_signal_runtime() {
        let runtime = signal_runtime().unwrap();
        assert_eq!(runtime.block_on(async { 40 + 2 }), 42);
    }

    // Installs a process wide SIGINT handler: Ctrl-C no longer interrupts the test binary after.
    #[test]
    #[ignore]
    fn test_stop_on_ctrl_c_starts() {
        let token = StopToken::default();
        assert!(token.stop_on_ctrl_c().is_ok());
        assert!(!token.is_stopped());
    }
}
