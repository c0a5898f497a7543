//! Module implementing a debouncer of values.
//!
//! Only the most recent value submitted within a quiet window gets acted upon.
//! Earlier pending values are superseded rather than queued.

use std::fmt;
use std::io;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;


/// Default length of the quiet window.
pub const DEFAULT_WINDOW_MS: u64 = 500;


enum Message<T> {
    Submit(T),
    Flush(Sender<()>),
}


/// Debouncer which invokes an action with the last value it has received,
/// once no new value arrived for the duration of its window.
///
/// The action runs on a dedicated background thread.
/// Dropping the debouncer discards any pending value.
pub struct Debouncer<T: Send + 'static> {
    window: Duration,
    sender: Option<Sender<Message<T>>>,
    thread: Option<JoinHandle<()>>,
}

impl<T: Send + 'static> Debouncer<T> {
    /// Create a debouncer with the default quiet window.
    #[inline]
    pub fn new<F>(action: F) -> io::Result<Self>
        where F: FnMut(T) + Send + 'static
    {
        Self::with_window(Duration::from_millis(DEFAULT_WINDOW_MS), action)
    }

    pub fn with_window<F>(window: Duration, action: F) -> io::Result<Self>
        where F: FnMut(T) + Send + 'static
    {
        let (sender, receiver) = mpsc::channel();
        let thread = thread::Builder::new()
            .name("debounce".into())
            .spawn(move || run(window, receiver, action))?;
        Ok(Debouncer{window, sender: Some(sender), thread: Some(thread)})
    }

    #[inline]
    pub fn window(&self) -> Duration {
        self.window
    }
}

impl<T: Send + 'static> Debouncer<T> {
    /// Submit a new value, superseding the pending one (if any)
    /// and restarting the quiet window.
    pub fn submit(&self, value: T) {
        if let Some(ref sender) = self.sender {
            if sender.send(Message::Submit(value)).is_err() {
                warn!("Debouncer thread is gone, value dropped");
            }
        }
    }

    /// Act on the pending value right away, without waiting for the window to pass.
    /// Returns once the action has completed.
    pub fn flush(&self) {
        let (ack_sender, ack_receiver) = mpsc::channel();
        if let Some(ref sender) = self.sender {
            if sender.send(Message::Flush(ack_sender)).is_ok() {
                let _ = ack_receiver.recv();
            }
        }
    }
}

impl<T: Send + 'static> Drop for Debouncer<T> {
    fn drop(&mut self) {
        // Disconnecting the channel makes the thread quit.
        self.sender.take();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!("Debouncer thread panicked");
            }
        }
    }
}

impl<T: Send + 'static> fmt::Debug for Debouncer<T> {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.debug_struct("Debouncer")
            .field("window", &self.window)
            .finish()
    }
}


/// Body of the debouncer's background thread.
fn run<T, F>(window: Duration, receiver: mpsc::Receiver<Message<T>>, mut action: F)
    where F: FnMut(T)
{
    let mut pending: Option<T> = None;
    loop {
        let message = if pending.is_some() {
            match receiver.recv_timeout(window) {
                Ok(msg) => msg,
                Err(RecvTimeoutError::Timeout) => {
                    if let Some(value) = pending.take() {
                        trace!("Quiet window of {:?} elapsed, firing", window);
                        action(value);
                    }
                    continue;
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        } else {
            match receiver.recv() {
                Ok(msg) => msg,
                Err(_) => break,
            }
        };

        match message {
            Message::Submit(value) => {
                if pending.replace(value).is_some() {
                    trace!("Pending value superseded");
                }
            }
            Message::Flush(ack) => {
                if let Some(value) = pending.take() {
                    action(value);
                }
                let _ = ack.send(());
            }
        }
    }
    if pending.is_some() {
        debug!("Debouncer shut down, discarding the pending value");
    }
}


#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::thread;
    use std::time::Duration;
    use super::Debouncer;

    fn recorder() -> (Arc<Mutex<Vec<u32>>>, impl FnMut(u32) + Send + 'static) {
        let fired = Arc::new(Mutex::new(vec![]));
        let sink = fired.clone();
        (fired, move |v| sink.lock().unwrap().push(v))
    }

    #[test]
    fn only_last_value_fires() {
        let (fired, action) = recorder();
        let debouncer = Debouncer::with_window(Duration::from_millis(100), action).unwrap();
        debouncer.submit(1);
        debouncer.submit(2);
        debouncer.submit(3);
        thread::sleep(Duration::from_millis(400));
        assert_eq!(vec![3], *fired.lock().unwrap());
    }

    #[test]
    fn separate_bursts_fire_separately() {
        let (fired, action) = recorder();
        let debouncer = Debouncer::with_window(Duration::from_millis(50), action).unwrap();
        debouncer.submit(1);
        thread::sleep(Duration::from_millis(300));
        debouncer.submit(2);
        thread::sleep(Duration::from_millis(300));
        assert_eq!(vec![1, 2], *fired.lock().unwrap());
    }

    #[test]
    fn flush_fires_immediately() {
        let (fired, action) = recorder();
        let debouncer = Debouncer::with_window(Duration::from_secs(60), action).unwrap();
        debouncer.submit(1);
        debouncer.submit(2);
        debouncer.flush();
        assert_eq!(vec![2], *fired.lock().unwrap());

        // Nothing pending anymore.
        debouncer.flush();
        assert_eq!(vec![2], *fired.lock().unwrap());
    }

    #[test]
    fn drop_discards_pending() {
        let (fired, action) = recorder();
        {
            let debouncer = Debouncer::with_window(Duration::from_secs(60), action).unwrap();
            debouncer.submit(1);
        }
        assert!(fired.lock().unwrap().is_empty());
    }
}
