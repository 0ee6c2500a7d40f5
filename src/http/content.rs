//! In-memory content serving.
//!
//! # Responsibilities
//! - Serve cached bytes with `Last-Modified` and `Accept-Ranges`
//! - Answer `If-Modified-Since` with 304 when unchanged
//! - Answer a single `Range: bytes=...` with 206 or 416
//!
//! # Design Decisions
//! - Multi-range requests get the full body (200), which HTTP permits
//! - HTTP dates are second precision; comparisons truncate accordingly

use std::time::SystemTime;

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::Response;
use bytes::Bytes;
use chrono::{DateTime, Utc};

pub const TEXT_HTML: &str = "text/html; charset=utf-8";

/// Build a response for `data`, honoring conditional and range headers.
pub fn serve_content(
    request_headers: &HeaderMap,
    data: &Bytes,
    modified: SystemTime,
    content_type: &'static str,
) -> Response {
    let last_modified = http_date(modified);

    if not_modified(request_headers, modified) {
        return respond(StatusCode::NOT_MODIFIED, Body::empty(), |headers| {
            insert_str(headers, header::LAST_MODIFIED, &last_modified);
        });
    }

    let len = data.len() as u64;
    let range = request_headers
        .get(header::RANGE)
        .and_then(|v| v.to_str().ok())
        .map(|v| parse_range(v, len));

    match range {
        Some(RangeRequest::Satisfiable(start, end)) => {
            let body = data.slice(start as usize..=end as usize);
            respond(StatusCode::PARTIAL_CONTENT, Body::from(body), |headers| {
                headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
                headers.insert(header::ACCEPT_RANGES, HeaderValue::from_static("bytes"));
                insert_str(headers, header::LAST_MODIFIED, &last_modified);
                insert_str(headers, header::CONTENT_RANGE, &format!("bytes {}-{}/{}", start, end, len));
            })
        }
        Some(RangeRequest::Unsatisfiable) => {
            respond(StatusCode::RANGE_NOT_SATISFIABLE, Body::empty(), |headers| {
                insert_str(headers, header::CONTENT_RANGE, &format!("bytes */{}", len));
            })
        }
        Some(RangeRequest::Ignored) | None => respond(StatusCode::OK, Body::from(data.clone()), |headers| {
            headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
            headers.insert(header::ACCEPT_RANGES, HeaderValue::from_static("bytes"));
            insert_str(headers, header::LAST_MODIFIED, &last_modified);
        }),
    }
}

fn respond(status: StatusCode, body: Body, headers: impl FnOnce(&mut HeaderMap)) -> Response {
    let mut response = Response::new(body);
    *response.status_mut() = status;
    headers(response.headers_mut());
    response
}

fn insert_str(headers: &mut HeaderMap, name: header::HeaderName, value: &str) {
    if let Ok(value) = HeaderValue::from_str(value) {
        headers.insert(name, value);
    }
}

/// Format a time as an RFC 7231 IMF-fixdate.
pub fn http_date(time: SystemTime) -> String {
    DateTime::<Utc>::from(time)
        .format("%a, %d %b %Y %H:%M:%S GMT")
        .to_string()
}

fn not_modified(request_headers: &HeaderMap, modified: SystemTime) -> bool {
    let Some(since) = request_headers
        .get(header::IF_MODIFIED_SINCE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| DateTime::parse_from_rfc2822(v).ok())
    else {
        return false;
    };

    DateTime::<Utc>::from(modified).timestamp() <= since.timestamp()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RangeRequest {
    /// Inclusive byte offsets.
    Satisfiable(u64, u64),
    Unsatisfiable,
    /// Malformed or multi-range; serve the whole body.
    Ignored,
}

fn parse_range(value: &str, len: u64) -> RangeRequest {
    let Some(ranges) = value.trim().strip_prefix("bytes=") else {
        return RangeRequest::Ignored;
    };
    if ranges.contains(',') {
        return RangeRequest::Ignored;
    }
    let Some((start, end)) = ranges.trim().split_once('-') else {
        return RangeRequest::Ignored;
    };

    match (start.trim(), end.trim()) {
        ("", "") => RangeRequest::Ignored,
        ("", suffix) => match suffix.parse::<u64>() {
            Ok(0) => RangeRequest::Unsatisfiable,
            Ok(_) if len == 0 => RangeRequest::Unsatisfiable,
            Ok(n) => RangeRequest::Satisfiable(len.saturating_sub(n), len - 1),
            Err(_) => RangeRequest::Ignored,
        },
        (start, end) => {
            let Ok(start) = start.parse::<u64>() else {
                return RangeRequest::Ignored;
            };
            let end = match end {
                "" => len.saturating_sub(1),
                end => match end.parse::<u64>() {
                    Ok(end) => end.min(len.saturating_sub(1)),
                    Err(_) => return RangeRequest::Ignored,
                },
            };
            if start >= len || start > end {
                RangeRequest::Unsatisfiable
            } else {
                RangeRequest::Satisfiable(start, end)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn headers(pairs: &[(header::HeaderName, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(name.clone(), HeaderValue::from_str(value).unwrap());
        }
        map
    }

    async fn body(response: Response) -> Vec<u8> {
        axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec()
    }

    #[test]
    fn test_parse_range() {
        assert_eq!(parse_range("bytes=0-4", 10), RangeRequest::Satisfiable(0, 4));
        assert_eq!(parse_range("bytes=5-", 10), RangeRequest::Satisfiable(5, 9));
        assert_eq!(parse_range("bytes=-3", 10), RangeRequest::Satisfiable(7, 9));
        assert_eq!(parse_range("bytes=-30", 10), RangeRequest::Satisfiable(0, 9));
        assert_eq!(parse_range("bytes=8-100", 10), RangeRequest::Satisfiable(8, 9));
        assert_eq!(parse_range("bytes=10-", 10), RangeRequest::Unsatisfiable);
        assert_eq!(parse_range("bytes=5-2", 10), RangeRequest::Unsatisfiable);
        assert_eq!(parse_range("bytes=0-1,4-5", 10), RangeRequest::Ignored);
        assert_eq!(parse_range("items=0-1", 10), RangeRequest::Ignored);
    }

    #[test]
    fn test_http_date() {
        let time = SystemTime::UNIX_EPOCH + Duration::from_secs(784_111_777);
        assert_eq!(http_date(time), "Sun, 06 Nov 1994 08:49:37 GMT");
    }

    #[tokio::test]
    async fn test_full_body() {
        let data = Bytes::from_static(b"hello world");
        let response = serve_content(&HeaderMap::new(), &data, SystemTime::UNIX_EPOCH, TEXT_HTML);
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::ACCEPT_RANGES], "bytes");
        assert_eq!(body(response).await, b"hello world");
    }

    #[tokio::test]
    async fn test_range() {
        let data = Bytes::from_static(b"hello world");
        let response = serve_content(
            &headers(&[(header::RANGE, "bytes=6-")]),
            &data,
            SystemTime::UNIX_EPOCH,
            TEXT_HTML,
        );
        assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
        assert_eq!(response.headers()[header::CONTENT_RANGE], "bytes 6-10/11");
        assert_eq!(body(response).await, b"world");

        let response = serve_content(
            &headers(&[(header::RANGE, "bytes=20-")]),
            &data,
            SystemTime::UNIX_EPOCH,
            TEXT_HTML,
        );
        assert_eq!(response.status(), StatusCode::RANGE_NOT_SATISFIABLE);
        assert_eq!(response.headers()[header::CONTENT_RANGE], "bytes */11");
    }

    #[test]
    fn test_if_modified_since() {
        let data = Bytes::from_static(b"x");
        let modified = SystemTime::UNIX_EPOCH + Duration::from_secs(784_111_777);

        let fresh = headers(&[(header::IF_MODIFIED_SINCE, "Sun, 06 Nov 1994 08:49:37 GMT")]);
        let response = serve_content(&fresh, &data, modified + Duration::from_millis(500), TEXT_HTML);
        assert_eq!(response.status(), StatusCode::NOT_MODIFIED);

        let stale = headers(&[(header::IF_MODIFIED_SINCE, "Sun, 06 Nov 1994 08:49:36 GMT")]);
        let response = serve_content(&stale, &data, modified, TEXT_HTML);
        assert_eq!(response.status(), StatusCode::OK);
    }
}
