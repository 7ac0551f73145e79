//! Echoes the test metadata keys back to the caller.
//!
//! tonic handlers can set response headers but not trailers on a successful
//! call, so the echo happens below the codec: leading values are appended to
//! the response headers, trailing values to the final trailers frame. A
//! trailers-only response (an error before any message) has no trailers
//! frame, so both sets go into its headers.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use http::{HeaderMap, HeaderName, HeaderValue};
use http_body::{Body, Frame, SizeHint};
use interop_proto::contract::{LEADING_METADATA_KEY, TRAILING_METADATA_KEY};
use tower_layer::Layer;
use tower_service::Service;

#[derive(Debug, Clone, Copy, Default)]
pub struct EchoMetadataLayer;

impl<S> Layer<S> for EchoMetadataLayer {
    type Service = EchoMetadata<S>;

    fn layer(&self, inner: S) -> Self::Service {
        EchoMetadata { inner }
    }
}

#[derive(Debug, Clone)]
pub struct EchoMetadata<S> {
    inner: S,
}

fn values(headers: &HeaderMap, key: &'static str) -> Vec<HeaderValue> {
    headers.get_all(key).iter().cloned().collect()
}

fn append(headers: &mut HeaderMap, key: &'static str, values: Vec<HeaderValue>) {
    let name = HeaderName::from_static(key);
    for value in values {
        headers.append(name.clone(), value);
    }
}

impl<S, B, ResBody> Service<http::Request<B>> for EchoMetadata<S>
where
    S: Service<http::Request<B>, Response = http::Response<ResBody>>,
    S::Future: Send + 'static,
    S::Error: Send + 'static,
    ResBody: Body + Unpin + Send + 'static,
{
    type Response = http::Response<EchoTrailers<ResBody>>;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: http::Request<B>) -> Self::Future {
        let leading = values(request.headers(), LEADING_METADATA_KEY);
        let trailing = values(request.headers(), TRAILING_METADATA_KEY);
        let response = self.inner.call(request);

        Box::pin(async move {
            let mut response = response.await?;
            let headers = response.headers_mut();
            append(headers, LEADING_METADATA_KEY, leading);

            // Trailers-only: the status already sits in the headers.
            let trailing = if headers.contains_key("grpc-status") {
                append(headers, TRAILING_METADATA_KEY, trailing);
                Vec::new()
            } else {
                trailing
            };

            Ok(response.map(|body| EchoTrailers {
                inner: body,
                trailing,
            }))
        })
    }
}

/// Response body that appends the echoed trailing values to the trailers
/// frame of the wrapped body.
#[derive(Debug)]
pub struct EchoTrailers<B> {
    inner: B,
    trailing: Vec<HeaderValue>,
}

impl<B> Body for EchoTrailers<B>
where
    B: Body + Unpin,
{
    type Data = B::Data;
    type Error = B::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();
        match Pin::new(&mut this.inner).poll_frame(cx) {
            Poll::Ready(Some(Ok(frame))) => match frame.into_trailers() {
                Ok(mut trailers) => {
                    append(&mut trailers, TRAILING_METADATA_KEY, std::mem::take(&mut this.trailing));
                    Poll::Ready(Some(Ok(Frame::trailers(trailers))))
                }
                Err(frame) => Poll::Ready(Some(Ok(frame))),
            },
            other => other,
        }
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}
