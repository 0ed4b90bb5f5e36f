//! Turn timers.
//!
//! Every processed move arms a fresh timer tagged with the turn token current
//! after the move. Timers are never cancelled individually: a timer whose
//! token no longer matches is simply ignored by the judge when it fires.

use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::sleep;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerCommand {
    /// Start a timer for the given turn token
    Arm(u64),
    /// Abort every pending timer and stop supervising
    Stop,
}

/// Handle used to arm turn timers from inside the judge.
#[derive(Debug, Clone)]
pub struct TurnTimer {
    tx: mpsc::UnboundedSender<TimerCommand>,
}

impl TurnTimer {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<TimerCommand>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn arm(&self, token: u64) {
        if self.tx.send(TimerCommand::Arm(token)).is_err() {
            debug!(token, "Timer supervisor gone, not arming");
        }
    }

    pub fn stop(&self) {
        let _ = self.tx.send(TimerCommand::Stop);
    }
}

/// Run timers until told to stop.
///
/// Each armed timer waits `wait` and then runs `on_expire(token)`. Pending
/// timers are aborted on [`TimerCommand::Stop`] or when every handle is gone.
pub async fn supervise<F, Fut>(
    mut commands: mpsc::UnboundedReceiver<TimerCommand>,
    wait: Duration,
    on_expire: F,
) where
    F: Fn(u64) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let mut timers = JoinSet::new();

    loop {
        tokio::select! {
            command = commands.recv() => match command {
                Some(TimerCommand::Arm(token)) => {
                    debug!(token, ?wait, "Arming turn timer");
                    let expired = on_expire(token);
                    timers.spawn(async move {
                        sleep(wait).await;
                        expired.await;
                    });
                }
                Some(TimerCommand::Stop) | None => break,
            },
            Some(finished) = timers.join_next(), if !timers.is_empty() => {
                if let Err(e) = finished {
                    if e.is_panic() {
                        warn!("Turn timer panicked: {}", e);
                    }
                }
            }
        }
    }

    debug!(pending = timers.len(), "Stopping turn timers");
    timers.abort_all();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tokio::task::JoinHandle;

    /// Supervise `rx`, recording the token of every timer that fires.
    fn spawn_recording(
        rx: mpsc::UnboundedReceiver<TimerCommand>,
    ) -> (Arc<Mutex<Vec<u64>>>, JoinHandle<()>) {
        let fired = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&fired);
        let handle = tokio::spawn(supervise(rx, Duration::from_secs(3), move |token| {
            let sink = Arc::clone(&sink);
            async move {
                sink.lock().unwrap().push(token);
            }
        }));
        (fired, handle)
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_fires_after_wait() {
        let (timer, rx) = TurnTimer::channel();
        let (fired, _supervisor) = spawn_recording(rx);

        timer.arm(7);
        sleep(Duration::from_millis(2900)).await;
        assert!(fired.lock().unwrap().is_empty());

        sleep(Duration::from_millis(200)).await;
        assert_eq!(*fired.lock().unwrap(), vec![7]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_every_armed_timer_fires_independently() {
        let (timer, rx) = TurnTimer::channel();
        let (fired, _supervisor) = spawn_recording(rx);

        timer.arm(0);
        sleep(Duration::from_secs(1)).await;
        timer.arm(1);
        sleep(Duration::from_secs(5)).await;

        assert_eq!(*fired.lock().unwrap(), vec![0, 1]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_aborts_pending_timers() {
        let (timer, rx) = TurnTimer::channel();
        let (fired, supervisor) = spawn_recording(rx);

        timer.arm(0);
        sleep(Duration::from_secs(1)).await;
        timer.stop();
        supervisor.await.unwrap();

        sleep(Duration::from_secs(5)).await;
        assert!(fired.lock().unwrap().is_empty());
        // Arming after stop is harmless
        timer.arm(1);
    }
}
