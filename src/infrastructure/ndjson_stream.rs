// Newline-delimited JSON streaming utilities
use axum::body::Body;
use axum::http::{Response, StatusCode, header};
use axum::response::IntoResponse;
use bytes::{BufMut, Bytes, BytesMut};
use futures::StreamExt;
use futures::stream::Stream;
use serde::Serialize;
use tokio::sync::watch;

/// Serialize one item as a JSON line
fn serialize_line<T: Serialize>(item: &T) -> Result<Bytes, std::io::Error> {
    let json = serde_json::to_vec(item).map_err(std::io::Error::other)?;
    let mut line = BytesMut::with_capacity(json.len() + 1);
    line.put_slice(&json);
    line.put_u8(b'\n');
    Ok(line.freeze())
}

/// Current value first, then one item per change until the sender goes away
pub fn watch_stream<T>(mut rx: watch::Receiver<T>) -> impl Stream<Item = T>
where
    T: Clone + Send + Sync + 'static,
{
    async_stream::stream! {
        loop {
            let current = rx.borrow_and_update().clone();
            yield current;
            if rx.changed().await.is_err() {
                break;
            }
        }
    }
}

/// Chunked response carrying one JSON document per line
pub fn ndjson_response<S, T>(stream: S) -> impl IntoResponse
where
    S: Stream<Item = T> + Send + 'static,
    T: Serialize + Send + 'static,
{
    let byte_stream = stream.map(|item| serialize_line(&item));

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/x-ndjson")
        .header(header::CACHE_CONTROL, "no-cache")
        .body(Body::from_stream(byte_stream))
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}
