//! Read loop and event fan-out

use std::sync::Arc;

use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, error, info};

use realtime_protocol::ServerEvent;

use super::Conn;
use crate::context::Context;
use crate::error::{RealtimeError, Result};

/// Trait for handling inbound server events
///
/// Handlers run on the read loop's task, one after another, so a slow
/// handler delays every later event.
pub trait EventHandler: Send {
    fn handle(&mut self, ctx: &Context, event: &ServerEvent);
}

/// Simple callback-based handler
pub struct CallbackHandler<F>
where
    F: FnMut(&Context, &ServerEvent) + Send,
{
    callback: F,
}

impl<F> CallbackHandler<F>
where
    F: FnMut(&Context, &ServerEvent) + Send,
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> EventHandler for CallbackHandler<F>
where
    F: FnMut(&Context, &ServerEvent) + Send,
{
    fn handle(&mut self, ctx: &Context, event: &ServerEvent) {
        (self.callback)(ctx, event);
    }
}

/// A read loop that has not been started yet
pub struct ConnHandler {
    ctx: Context,
    conn: Arc<Conn>,
    handlers: Vec<Box<dyn EventHandler>>,
}

impl ConnHandler {
    /// Handlers are invoked in the order given
    pub fn new(ctx: &Context, conn: Arc<Conn>, handlers: Vec<Box<dyn EventHandler>>) -> Self {
        Self {
            ctx: ctx.with_cancel(),
            conn,
            handlers,
        }
    }

    /// Append a handler after the existing ones
    pub fn add_handler(&mut self, handler: impl EventHandler + 'static) {
        self.handlers.push(Box::new(handler));
    }

    /// Spawn the read loop on the current tokio runtime
    pub fn start(self) -> RunningHandler {
        let ctx = self.ctx.clone();
        info!(handlers = self.handlers.len(), "Starting connection handler");
        let task = tokio::spawn(run(self.ctx, self.conn, self.handlers));
        RunningHandler {
            ctx,
            task: Some(task),
        }
    }
}

/// A started read loop
///
/// Dropping it cancels the loop without waiting for it.
pub struct RunningHandler {
    ctx: Context,
    task: Option<JoinHandle<Result<()>>>,
}

impl RunningHandler {
    /// Cancel the loop and wait for it to exit
    ///
    /// No handler runs after this returns.
    pub async fn stop(mut self) -> Result<()> {
        self.ctx.cancel();
        self.join().await
    }

    /// Wait for the loop to exit on its own and return its terminal error
    ///
    /// Blocks for as long as the connection stays healthy.
    pub async fn wait(mut self) -> Result<()> {
        self.join().await
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, |task| task.is_finished())
    }

    /// The loop's context; cancelling it stops the loop
    pub fn context(&self) -> &Context {
        &self.ctx
    }

    async fn join(&mut self) -> Result<()> {
        match self.task.take() {
            Some(task) => task.await.unwrap_or_else(|e| Err(join_error(e))),
            None => Ok(()),
        }
    }
}

impl Drop for RunningHandler {
    fn drop(&mut self) {
        if self.task.is_some() {
            self.ctx.cancel();
        }
    }
}

fn join_error(err: JoinError) -> RealtimeError {
    if err.is_panic() {
        let payload = err.into_panic();
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        error!(%message, "Event handler panicked");
        RealtimeError::HandlerPanicked(message)
    } else {
        RealtimeError::internal(err.to_string())
    }
}

async fn run(ctx: Context, conn: Arc<Conn>, mut handlers: Vec<Box<dyn EventHandler>>) -> Result<()> {
    loop {
        match ctx.err() {
            Some(RealtimeError::Cancelled) => {
                info!("Connection handler stopped");
                return Ok(());
            }
            Some(err) => return Err(err),
            None => {}
        }

        match conn.read_message(&ctx).await {
            Ok(event) => {
                if ctx.is_cancelled() {
                    debug!(event_type = %event.event_type(), "Dropping event read during shutdown");
                    return Ok(());
                }
                for handler in handlers.iter_mut() {
                    handler.handle(&ctx, &event);
                }
            }
            Err(err) if err.is_permanent() => {
                error!(error = %err, "Connection handler exiting");
                return Err(err);
            }
            // Interrupted by the context; the top of the loop decides
            Err(_) if ctx.err().is_some() => {}
            Err(err) => {
                conn.logger()
                    .warn(format_args!("read message temporary error: {}", err));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conn::testing::ScriptedConn;
    use crate::logger::tests::RecordingLogger;
    use crate::logger::NopLogger;
    use parking_lot::Mutex;
    use std::time::Duration;

    fn text_delta(delta: &str) -> String {
        format!(r#"{{"type":"response.output_text.delta","delta":"{}"}}"#, delta)
    }

    fn delta_of(event: &ServerEvent) -> String {
        match event {
            ServerEvent::ResponseOutputTextDelta(e) => e.delta.clone(),
            other => format!("{}", other.event_type()),
        }
    }

    fn recorder(name: &'static str, log: &Arc<Mutex<Vec<String>>>) -> Box<dyn EventHandler> {
        let log = Arc::clone(log);
        Box::new(CallbackHandler::new(move |_ctx, event| {
            log.lock().push(format!("{}:{}", name, delta_of(event)));
        }))
    }

    async fn wait_for(log: &Arc<Mutex<Vec<String>>>, len: usize) {
        for _ in 0..200 {
            if log.lock().len() >= len {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("timed out waiting for {} entries, got {:?}", len, log.lock());
    }

    // ==================== Dispatch Tests ====================

    #[tokio::test]
    async fn test_handlers_run_in_order_per_event() {
        let script = ScriptedConn::new();
        for delta in ["a", "b", "c"] {
            script.push_text(&text_delta(delta));
        }
        let conn = Arc::new(Conn::new(Box::new(Arc::clone(&script)), Arc::new(NopLogger)));

        let log = Arc::new(Mutex::new(Vec::new()));
        let handler = ConnHandler::new(
            &Context::background(),
            conn,
            vec![recorder("h1", &log), recorder("h2", &log)],
        );
        let running = handler.start();
        wait_for(&log, 6).await;
        running.stop().await.unwrap();

        assert_eq!(
            *log.lock(),
            vec!["h1:a", "h2:a", "h1:b", "h2:b", "h1:c", "h2:c"]
        );
    }

    #[tokio::test]
    async fn test_add_handler_appends() {
        let script = ScriptedConn::new();
        script.push_text(&text_delta("x"));
        let conn = Arc::new(Conn::new(Box::new(Arc::clone(&script)), Arc::new(NopLogger)));

        let log = Arc::new(Mutex::new(Vec::new()));
        let mut handler = ConnHandler::new(&Context::background(), conn, vec![recorder("first", &log)]);
        let log_clone = Arc::clone(&log);
        handler.add_handler(CallbackHandler::new(move |_ctx, event| {
            log_clone.lock().push(format!("second:{}", delta_of(event)));
        }));

        let running = handler.start();
        wait_for(&log, 2).await;
        running.stop().await.unwrap();
        assert_eq!(*log.lock(), vec!["first:x", "second:x"]);
    }

    // ==================== Error Handling Tests ====================

    #[tokio::test]
    async fn test_transient_error_is_logged_and_loop_continues() {
        let script = ScriptedConn::new();
        script.push_text(r#"{"type":"made.up"}"#);
        script.push_text(&text_delta("ok"));
        let logger = Arc::new(RecordingLogger::default());
        let conn = Arc::new(Conn::new(Box::new(Arc::clone(&script)), logger.clone()));

        let log = Arc::new(Mutex::new(Vec::new()));
        let running =
            ConnHandler::new(&Context::background(), conn, vec![recorder("h", &log)]).start();
        wait_for(&log, 1).await;
        assert!(!running.is_finished());
        running.stop().await.unwrap();

        assert_eq!(*log.lock(), vec!["h:ok"]);
        let warnings = logger.warnings();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("made.up"));
    }

    #[tokio::test]
    async fn test_transient_io_error_then_event() {
        let script = ScriptedConn::new();
        script.push_error(RealtimeError::Io(std::io::ErrorKind::TimedOut.into()));
        script.push_text(&text_delta("after timeout"));
        let logger = Arc::new(RecordingLogger::default());
        let conn = Arc::new(Conn::new(Box::new(Arc::clone(&script)), logger.clone()));

        let log = Arc::new(Mutex::new(Vec::new()));
        let running =
            ConnHandler::new(&Context::background(), conn, vec![recorder("h", &log)]).start();
        wait_for(&log, 1).await;
        assert!(!running.is_finished());
        running.stop().await.unwrap();

        assert_eq!(*log.lock(), vec!["h:after timeout"]);
        let warnings = logger.warnings();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].starts_with("read message temporary error: IO error"));
    }

    #[tokio::test]
    async fn test_permanent_error_ends_loop() {
        let script = ScriptedConn::new();
        script.push_text(&text_delta("before"));
        script.push_error(
            RealtimeError::ConnectionClosed {
                code: 1011,
                reason: "server error".into(),
            }
            .permanent(),
        );
        script.push_text(&text_delta("after"));
        let conn = Arc::new(Conn::new(Box::new(Arc::clone(&script)), Arc::new(NopLogger)));

        let log = Arc::new(Mutex::new(Vec::new()));
        let running =
            ConnHandler::new(&Context::background(), conn, vec![recorder("h", &log)]).start();
        let err = running.wait().await.unwrap_err();

        assert!(err.is_permanent());
        assert!(matches!(
            err.cause(),
            RealtimeError::ConnectionClosed { code: 1011, .. }
        ));
        assert_eq!(*log.lock(), vec!["h:before"]);
    }

    #[tokio::test]
    async fn test_binary_frame_does_not_end_loop() {
        let script = ScriptedConn::new();
        script.push(crate::ws::MessageType::Binary, bytes::Bytes::from_static(b"\x01"));
        script.push_text(&text_delta("text"));
        let conn = Arc::new(Conn::new(Box::new(Arc::clone(&script)), Arc::new(NopLogger)));

        let log = Arc::new(Mutex::new(Vec::new()));
        let running =
            ConnHandler::new(&Context::background(), conn, vec![recorder("h", &log)]).start();
        wait_for(&log, 1).await;
        running.stop().await.unwrap();
        assert_eq!(*log.lock(), vec!["h:text"]);
    }

    // ==================== Lifecycle Tests ====================

    #[tokio::test]
    async fn test_no_dispatch_after_stop() {
        let script = ScriptedConn::new();
        let conn = Arc::new(Conn::new(Box::new(Arc::clone(&script)), Arc::new(NopLogger)));

        let log = Arc::new(Mutex::new(Vec::new()));
        let running =
            ConnHandler::new(&Context::background(), conn, vec![recorder("h", &log)]).start();
        running.stop().await.unwrap();

        script.push_text(&text_delta("late"));
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(log.lock().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_stop_mid_stream_drops_buffered_events() {
        let script = ScriptedConn::new();
        for delta in ["1", "2", "3", "4", "5"] {
            script.push_text(&text_delta(delta));
        }
        let conn = Arc::new(Conn::new(Box::new(Arc::clone(&script)), Arc::new(NopLogger)));

        let log = Arc::new(Mutex::new(Vec::new()));
        let log_clone = Arc::clone(&log);
        let slow: Box<dyn EventHandler> = Box::new(CallbackHandler::new(move |_ctx, event| {
            log_clone.lock().push(delta_of(event));
            std::thread::sleep(Duration::from_millis(100));
        }));

        let running = ConnHandler::new(&Context::background(), conn, vec![slow]).start();
        wait_for(&log, 1).await;
        running.stop().await.unwrap();

        let seen = log.lock().len();
        assert_eq!(seen, 1);
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(log.lock().len(), seen);
    }

    #[tokio::test]
    async fn test_parent_cancel_exits_cleanly() {
        let script = ScriptedConn::new();
        let conn = Arc::new(Conn::new(Box::new(Arc::clone(&script)), Arc::new(NopLogger)));

        let parent = Context::background();
        let running = ConnHandler::new(&parent, conn, Vec::new()).start();
        parent.cancel();
        running.wait().await.unwrap();
    }

    #[tokio::test]
    async fn test_deadline_reported() {
        let script = ScriptedConn::new();
        let conn = Arc::new(Conn::new(Box::new(Arc::clone(&script)), Arc::new(NopLogger)));

        let ctx = Context::background().with_timeout(Duration::from_millis(20));
        let running = ConnHandler::new(&ctx, conn, Vec::new()).start();
        let err = running.wait().await.unwrap_err();
        assert!(matches!(err, RealtimeError::DeadlineExceeded));
    }

    #[tokio::test]
    async fn test_handler_panic_reported() {
        let script = ScriptedConn::new();
        script.push_text(&text_delta("boom"));
        let conn = Arc::new(Conn::new(Box::new(Arc::clone(&script)), Arc::new(NopLogger)));

        let panicking: Box<dyn EventHandler> =
            Box::new(CallbackHandler::new(|_ctx, _event| panic!("handler exploded")));
        let running = ConnHandler::new(&Context::background(), conn, vec![panicking]).start();

        match running.wait().await {
            Err(RealtimeError::HandlerPanicked(message)) => {
                assert!(message.contains("handler exploded"))
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_drop_cancels_loop() {
        let script = ScriptedConn::new();
        let conn = Arc::new(Conn::new(Box::new(Arc::clone(&script)), Arc::new(NopLogger)));

        let running = ConnHandler::new(&Context::background(), conn, Vec::new()).start();
        let ctx = running.context().clone();
        assert!(!ctx.is_cancelled());
        drop(running);
        assert!(ctx.is_cancelled());
    }

    #[test]
    fn test_callback_handler_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<CallbackHandler<fn(&Context, &ServerEvent)>>();
        assert_send::<ConnHandler>();
    }
}
