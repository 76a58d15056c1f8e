use axum::Router;

pub trait HttpLoggingExt<S> {
    fn with_http_logging(self) -> Self;
}

impl<S> HttpLoggingExt<S> for Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    /// Log every request/response pair through tower-http's trace layer.
    fn with_http_logging(self) -> Router<S> {
        self.route_layer(
            tower_http::trace::TraceLayer::new_for_http()
                .on_request(|request: &axum::http::Request<_>, _span: &_| {
                    tracing::info!(
                        target: "tower_http",
                        method = %request.method(),
                        path = request
                            .uri()
                            .path_and_query()
                            .map_or("", |pq| pq.as_str()),
                    );
                })
                .on_response(|response: &axum::http::Response<_>, _latency, _span: &_| {
                    tracing::info!(
                        target: "tower_http",
                        status = response.status().as_u16(),
                    );
                }),
        )
    }
}
