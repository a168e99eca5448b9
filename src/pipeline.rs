//! Drives one accepted client connection: read the request line,
//! validate it, parse the URI, check the cache, dial upstream on a
//! miss, rewrite and forward the request, stream the response back,
//! and admit it to the cache if it's small enough.

use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

use crate::cache::CacheStore;
use crate::errors::{send_client_error, send_internal_server_error};
use crate::parser::parse_absolute_uri;
use crate::reader::BufferedReader;
use crate::{canonical_key, MAXLINE, MAX_OBJECT_SIZE, USER_AGENT};

const HTTP_PREFIX: &str = "http://";

/// Header names the proxy strips from the client's request before
/// forwarding it upstream; it supplies its own versions of all three.
fn is_suppressed_header(name: &str) -> bool {
    name.eq_ignore_ascii_case("user-agent")
        || name.eq_ignore_ascii_case("connection")
        || name.eq_ignore_ascii_case("proxy-connection")
}

/// Drives one accepted client connection end to end. Never panics on
/// malformed input or socket errors; every failure path logs and
/// returns, letting the caller's task finish normally so the acceptor
/// keeps running.
pub async fn handle_connection(client: TcpStream, cache: Arc<CacheStore>) {
    let peer = client.peer_addr().ok();
    let (read_half, mut write_half) = client.into_split();
    let mut reader = BufferedReader::new(read_half);

    // READ_REQUEST_LINE
    let request_line = match reader.read_line(MAXLINE).await {
        Ok(Some(line)) if !line.is_empty() => line,
        Ok(_) => return,
        Err(err) => {
            tracing::debug!(?peer, %err, "failed to read request line");
            return;
        }
    };
    let request_line = request_line.trim_end_matches(['\r', '\n']);

    let mut parts = request_line.splitn(3, ' ');
    let method = parts.next().unwrap_or("").to_string();
    let request_uri = parts.next().unwrap_or("").to_string();
    let version = parts.next().unwrap_or("").to_string();

    tracing::debug!(?peer, method, request_uri, version, "request line");

    // VALIDATE
    if !method.eq_ignore_ascii_case("GET") {
        send_client_error(
            &mut write_half,
            "501",
            "Not Implemented",
            "This proxy does not implement this method",
            &method,
        )
        .await;
        tracing::info!(?peer, method, "rejected method");
        return;
    }

    if !request_uri.starts_with(HTTP_PREFIX) {
        send_client_error(
            &mut write_half,
            "400",
            "Bad Request",
            "Request URI does not lead with \"http://\"",
            &request_uri,
        )
        .await;
        tracing::info!(?peer, request_uri, "rejected URI");
        return;
    }

    if version != "HTTP/1.0" && version != "HTTP/1.1" {
        // Unsupported version is reported but not fatal: continue serving.
        send_client_error(
            &mut write_half,
            "501",
            "Not Implemented",
            "This HTTP version is not supported",
            &version,
        )
        .await;
        tracing::info!(?peer, version, "rejected version, continuing anyway");
    }

    // PARSE_URI
    let (host, port, path) = parse_absolute_uri(&request_uri);
    let key = canonical_key(&host, &port, &path);

    // CACHE_LOOKUP
    if let Some((body, _size)) = cache.get(&key).await {
        if let Err(err) = write_half.write_all(&body).await {
            tracing::debug!(?peer, key, %err, "client write failed serving cache hit");
        }
        return;
    }

    // DIAL_UPSTREAM
    let upstream = match TcpStream::connect((host.as_str(), port.parse::<u16>().unwrap_or(80)))
        .await
    {
        Ok(stream) => stream,
        Err(err) => {
            tracing::warn!(?peer, host, port, %err, "upstream dial failed");
            send_internal_server_error(&mut write_half, &format!("{host}:{port}")).await;
            return;
        }
    };
    let (upstream_read, mut upstream_write) = upstream.into_split();
    let mut upstream_reader = BufferedReader::new(upstream_read);

    // FORWARD_REQUEST
    let request_line_out = format!("GET {path} HTTP/1.0\r\n");
    if let Err(err) = upstream_write.write_all(request_line_out.as_bytes()).await {
        tracing::debug!(?peer, %err, "failed to forward request line upstream");
        return;
    }

    let mut host_seen = false;
    loop {
        let line = match reader.read_line(MAXLINE).await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(err) => {
                tracing::debug!(?peer, %err, "failed reading client header block");
                break;
            }
        };
        if line == "\r\n" || line.is_empty() {
            break;
        }
        if let Some(colon) = line.find(':') {
            let name = line[..colon].trim();
            if name.eq_ignore_ascii_case("host") {
                host_seen = true;
            }
            if is_suppressed_header(name) {
                continue;
            }
        }
        if upstream_write.write_all(line.as_bytes()).await.is_err() {
            tracing::debug!(?peer, "failed forwarding header to upstream");
            return;
        }
    }

    if !host_seen {
        let host_header = format!("Host: {host}\r\n");
        if upstream_write.write_all(host_header.as_bytes()).await.is_err() {
            return;
        }
    }
    let tail = format!("User-Agent: {USER_AGENT}\r\nConnection: close\r\nProxy-Connection: close\r\n\r\n");
    if upstream_write.write_all(tail.as_bytes()).await.is_err() {
        return;
    }

    // STREAM_RESPONSE
    let mut staging = BytesMut::with_capacity(MAX_OBJECT_SIZE);
    let mut total_size: usize = 0;
    loop {
        let chunk = match upstream_reader.read_n(MAXLINE).await {
            Ok(chunk) if !chunk.is_empty() => chunk,
            Ok(_) => break, // EOF
            Err(err) => {
                // Treat ECONNRESET-equivalent transient errors as
                // truncation: stop streaming, don't admit what we have.
                tracing::warn!(?peer, %err, "upstream read error, truncating body");
                total_size = MAX_OBJECT_SIZE + 1; // force SKIP_ADMIT below
                break;
            }
        };

        if let Err(err) = write_half.write_all(&chunk).await {
            tracing::debug!(?peer, %err, "client write failed, stopping stream");
            break;
        }

        total_size += chunk.len();
        if total_size <= MAX_OBJECT_SIZE {
            staging.extend_from_slice(&chunk);
        }
    }

    // ADMIT / SKIP_ADMIT
    if total_size <= MAX_OBJECT_SIZE {
        cache.put(key, staging.freeze(), total_size).await;
    } else {
        tracing::debug!(?peer, total_size, "response too large to cache, skipping admission");
    }

    // CLOSE: both halves drop here, closing their sockets.
}

/// Used by tests that want to exercise request parsing and header
/// rewriting without a real TCP connection.
pub fn rewrite_request_line(path: &str) -> String {
    format!("GET {path} HTTP/1.0\r\n")
}
