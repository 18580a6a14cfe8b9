use axum::body::to_bytes;
use axum::body::Body;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;
use chrono::Utc;

use crate::shared::format::format_size;

/// Middleware для логирования HTTP запросов
///
/// Выводит в консоль время (UTC), длительность, размер ответа, статус, метод и путь.
pub async fn request_logger(req: Request<Body>, next: Next) -> Response {
    let start = std::time::Instant::now();
    let method = req.method().clone();
    let uri = req.uri().clone();

    let response = next.run(req).await;
    let (parts, body) = response.into_parts();

    // Читаем тело ответа, чтобы узнать реальный размер
    let bytes = match to_bytes(body, usize::MAX).await {
        Ok(b) => b,
        Err(e) => {
            println!(
                "\x1b[33m{}\x1b[0m | {:>5}ms | {:>10} | {} {:>6} {}",
                Utc::now().format("%H:%M:%S"),
                start.elapsed().as_millis(),
                "error",
                parts.status.as_u16(),
                method,
                uri.path()
            );
            tracing::warn!("Failed to read response body for {} {}: {}", method, uri.path(), e);
            return Response::from_parts(parts, Body::default());
        }
    };

    let duration = start.elapsed();
    let status = parts.status.as_u16();

    // голубой для 2xx, коричневый для остальных
    let color_code = if parts.status.is_success() { "36" } else { "33" };

    println!(
        "\x1b[{}m{}\x1b[0m | {:>5}ms | {:>10} | {} {:>6} {}",
        color_code,
        Utc::now().format("%H:%M:%S"),
        duration.as_millis(),
        format_size(bytes.len()),
        status,
        method,
        uri.path()
    );
    tracing::debug!(
        method = %method,
        path = uri.path(),
        status,
        size = bytes.len(),
        latency_ms = duration.as_millis() as u64,
        "request handled"
    );

    Response::from_parts(parts, Body::from(bytes))
}
