//! Client-visible error pages and the non-fatal logging that accompanies
//! them: a small HTML body naming the status, a short and long message,
//! and the offending input ("cause").

use tokio::io::{AsyncWrite, AsyncWriteExt};

fn error_body(cause: &str, errnum: &str, shortmsg: &str, longmsg: &str) -> String {
    format!(
        "<html><title>Proxy Error</title><body bgcolor=\"ffffff\">\r\n\
         {errnum}: {shortmsg}\r\n\
         <p>{longmsg}: {cause}\r\n\
         <hr><em>The Proxy Server</em>\r\n"
    )
}

/// Writes a complete HTTP error response (status line, `Content-Type`,
/// `Content-Length`, blank line, HTML body) to `writer`. Write failures
/// are logged and swallowed; the caller is about to close the
/// connection regardless.
pub async fn send_client_error<W: AsyncWrite + Unpin>(
    writer: &mut W,
    errnum: &str,
    shortmsg: &str,
    longmsg: &str,
    cause: &str,
) {
    let body = error_body(cause, errnum, shortmsg, longmsg);
    let response = format!(
        "HTTP/1.0 {errnum} {shortmsg}\r\n\
         Content-type: text/html\r\n\
         Content-length: {}\r\n\r\n\
         {body}",
        body.len()
    );
    if let Err(err) = writer.write_all(response.as_bytes()).await {
        tracing::debug!(errnum, %err, "failed to send client error page");
    }
}

/// Shorthand for the `500 Internal Server Error` page, used whenever an
/// upstream dial or per-request allocation fails.
pub async fn send_internal_server_error<W: AsyncWrite + Unpin>(writer: &mut W, cause: &str) {
    send_client_error(
        writer,
        "500",
        "Internal Server Error",
        "The proxy server encountered a problem",
        cause,
    )
    .await;
}
