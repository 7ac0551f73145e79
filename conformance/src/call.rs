//! Per-call state: the context a call is issued with, and the cursor that
//! drives it.
//!
//! Every call, whatever its shape, is a stream of requests and a stream of
//! responses. A spawned driver task owns the transport call and reports
//! headers, messages and the terminal status over a channel; the cursor
//! races each wait against the call's deadline and its cancellation token.

use std::future::Future;
use std::time::Duration;

use http::HeaderMap;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use tonic::metadata::MetadataMap;
use tonic::{Code, Request, Response, Status, Streaming};

/// Requests buffered between the cursor and the transport.
const WRITE_BUFFER: usize = 16;

/// What a single call is issued with: outgoing metadata, an optional
/// timeout and a cancellation handle.
///
/// Clones share the cancellation handle.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    metadata: HeaderMap,
    timeout: Option<Duration>,
    cancel: CancellationToken,
}

impl CallContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the call with DEADLINE_EXCEEDED once `timeout` has elapsed since
    /// it started. The timeout is also sent to the server.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn metadata(&self) -> &HeaderMap {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut HeaderMap {
        &mut self.metadata
    }

    /// Cancel the call. Safe to call at any time, any number of times.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub(crate) fn request<T>(&self, message: T) -> Request<T> {
        let mut request = Request::new(message);
        *request.metadata_mut() = MetadataMap::from_headers(self.metadata.clone());
        if let Some(timeout) = self.timeout {
            request.set_timeout(timeout);
        }
        request
    }
}

/// How a call ended.
#[derive(Debug)]
pub struct Finished {
    pub status: Status,
    /// Leading metadata, empty if the call failed before headers arrived.
    pub headers: HeaderMap,
    /// Trailing metadata.
    pub trailers: HeaderMap,
}

/// Outcome of a call that produces at most one response.
#[derive(Debug)]
pub struct UnaryOutcome<Resp> {
    pub response: Option<Resp>,
    pub status: Status,
    pub headers: HeaderMap,
    pub trailers: HeaderMap,
}

enum Event<Resp> {
    Headers(HeaderMap),
    Message(Resp),
    Closed { status: Status, trailers: HeaderMap },
}

impl<Resp> Event<Resp> {
    fn closed(status: Status) -> Self {
        let trailers = status.metadata().clone().into_headers();
        Event::Closed { status, trailers }
    }
}

/// Cursor over one in-flight call.
///
/// Once the call has a terminal status every further read returns it (or
/// `Ok(None)` if it was OK) and every further write fails.
pub struct StreamCall<Req, Resp> {
    requests: Option<mpsc::Sender<Req>>,
    events: mpsc::UnboundedReceiver<Event<Resp>>,
    driver: JoinHandle<()>,
    deadline: Option<Instant>,
    cancel: CancellationToken,
    headers: HeaderMap,
    trailers: HeaderMap,
    status: Option<Status>,
}

impl<Req, Resp> StreamCall<Req, Resp>
where
    Req: Send + 'static,
    Resp: Send + 'static,
{
    /// Start a call. `open` receives the request, whose body is fed by
    /// [`write`](Self::write), and resolves once response headers arrive.
    pub(crate) fn start<F, Fut>(ctx: &CallContext, open: F) -> Self
    where
        F: FnOnce(Request<ReceiverStream<Req>>) -> Fut,
        Fut: Future<Output = Result<Response<Streaming<Resp>>, Status>> + Send + 'static,
    {
        let deadline = ctx.timeout.map(|timeout| Instant::now() + timeout);
        let (requests, outbound) = mpsc::channel(WRITE_BUFFER);
        let (events_tx, events) = mpsc::unbounded_channel();

        let call = open(ctx.request(ReceiverStream::new(outbound)));
        let driver = tokio::spawn(drive(call, events_tx, ctx.cancel.clone()));

        Self {
            requests: Some(requests),
            events,
            driver,
            deadline,
            cancel: ctx.cancel.clone(),
            headers: HeaderMap::new(),
            trailers: HeaderMap::new(),
            status: None,
        }
    }

    /// Queue a request without waiting, for callers that cannot await.
    /// Fails if writes are closed, the buffer is full or the transport has
    /// dropped the request stream.
    pub(crate) fn enqueue(&mut self, message: Req) -> Result<(), Status> {
        if let Some(status) = &self.status {
            return Err(after_completion(status));
        }
        let Some(requests) = &self.requests else {
            return Err(Status::failed_precondition("write after close_writes"));
        };
        requests.try_send(message).map_err(|e| match e {
            TrySendError::Full(_) => Status::resource_exhausted("request buffer full"),
            TrySendError::Closed(_) => Status::unavailable("request stream closed by the transport"),
        })
    }

    /// Send one request.
    pub async fn write(&mut self, message: Req) -> Result<(), Status> {
        if let Some(status) = &self.status {
            return Err(after_completion(status));
        }
        let Some(requests) = self.requests.clone() else {
            return Err(Status::failed_precondition("write after close_writes"));
        };

        match guarded(self.deadline, &self.cancel, requests.send(message)).await {
            Ok(Ok(())) => Ok(()),
            // The transport dropped the request stream: the call is over.
            Ok(Err(_)) => {
                let status = self.drain().await;
                Err(after_completion(&status))
            }
            Err(status) => Err(self.abort(status)),
        }
    }

    /// Signal end of input. Idempotent.
    pub fn close_writes(&mut self) {
        self.requests = None;
    }

    /// Next response, `Ok(None)` once the call ended OK, or the terminal
    /// status.
    pub async fn read(&mut self) -> Result<Option<Resp>, Status> {
        loop {
            if let Some(status) = &self.status {
                return if status.code() == Code::Ok {
                    Ok(None)
                } else {
                    Err(status.clone())
                };
            }

            match guarded(self.deadline, &self.cancel, self.events.recv()).await {
                Ok(Some(Event::Headers(headers))) => self.headers = headers,
                Ok(Some(Event::Message(message))) => return Ok(Some(message)),
                Ok(Some(Event::Closed { status, trailers })) => {
                    tracing::debug!(code = ?status.code(), "call closed");
                    self.trailers = trailers;
                    self.status = Some(status);
                }
                Ok(None) => {
                    self.status = Some(Status::internal("call driver stopped without a status"));
                }
                Err(status) => return Err(self.abort(status)),
            }
        }
    }

    /// Cancel the call; the server sees the stream reset.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Wait for the terminal status, discarding unread responses. Does not
    /// close writes: a call whose server waits for more input only ends by
    /// deadline or cancellation.
    pub async fn finish(mut self) -> Finished {
        let status = self.drain().await;
        Finished {
            status,
            headers: std::mem::take(&mut self.headers),
            trailers: std::mem::take(&mut self.trailers),
        }
    }

    /// Close writes, take the single response (if any) and finish.
    pub async fn close_and_recv(mut self) -> UnaryOutcome<Resp> {
        self.close_writes();
        let response = self.read().await.ok().flatten();
        let finished = self.finish().await;
        UnaryOutcome {
            response,
            status: finished.status,
            headers: finished.headers,
            trailers: finished.trailers,
        }
    }

    async fn drain(&mut self) -> Status {
        while let Ok(Some(_)) = self.read().await {}
        self.status
            .clone()
            .unwrap_or_else(|| Status::internal("call ended without a status"))
    }

    /// End the call locally with `status`, which every later read returns.
    pub(crate) fn abort(&mut self, status: Status) -> Status {
        tracing::debug!(code = ?status.code(), "aborting call");
        self.driver.abort();
        self.requests = None;
        self.status = Some(status.clone());
        status
    }
}

impl<Req, Resp> Drop for StreamCall<Req, Resp> {
    fn drop(&mut self) {
        self.driver.abort();
    }
}

fn after_completion(status: &Status) -> Status {
    if status.code() == Code::Ok {
        Status::failed_precondition("write after the call completed")
    } else {
        status.clone()
    }
}

/// Run `operation` unless the call is cancelled or its deadline passes
/// first. Cancellation wins ties.
async fn guarded<T>(
    deadline: Option<Instant>,
    cancel: &CancellationToken,
    operation: impl Future<Output = T>,
) -> Result<T, Status> {
    let expiry = async move {
        match deadline {
            Some(at) => tokio::time::sleep_until(at).await,
            None => std::future::pending().await,
        }
    };

    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Status::cancelled("call cancelled by the client")),
        _ = expiry => Err(Status::deadline_exceeded("deadline exceeded")),
        value = operation => Ok(value),
    }
}

async fn drive<Resp, Fut>(
    call: Fut,
    events: mpsc::UnboundedSender<Event<Resp>>,
    cancel: CancellationToken,
) where
    Fut: Future<Output = Result<Response<Streaming<Resp>>, Status>>,
{
    tokio::select! {
        _ = cancel.cancelled() => tracing::debug!("call cancelled, resetting stream"),
        _ = forward(call, &events) => {}
    }
}

async fn forward<Resp, Fut>(call: Fut, events: &mpsc::UnboundedSender<Event<Resp>>)
where
    Fut: Future<Output = Result<Response<Streaming<Resp>>, Status>>,
{
    let response = match call.await {
        Ok(response) => response,
        Err(status) => {
            let _ = events.send(Event::closed(status));
            return;
        }
    };

    let (metadata, mut inbound, _) = response.into_parts();
    if events.send(Event::Headers(metadata.into_headers())).is_err() {
        return;
    }

    loop {
        match inbound.message().await {
            Ok(Some(message)) => {
                if events.send(Event::Message(message)).is_err() {
                    return;
                }
            }
            Ok(None) => break,
            Err(status) => {
                let _ = events.send(Event::closed(status));
                return;
            }
        }
    }

    let closed = match inbound.trailers().await {
        Ok(trailers) => Event::Closed {
            status: Status::new(Code::Ok, ""),
            trailers: trailers.map(MetadataMap::into_headers).unwrap_or_default(),
        },
        Err(status) => Event::closed(status),
    };
    let _ = events.send(closed);
}
