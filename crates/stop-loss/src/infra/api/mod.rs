use {
    crate::{
        domain::Engine,
        infra::{observe, persistence::Persistence},
    },
    futures::Future,
    std::{net::SocketAddr, sync::Arc},
    tokio::sync::oneshot,
};

mod error;
mod routes;

pub use error::{Error, Kind};

/// Orders are small, anything bigger is a mistake.
const MAX_BODY_SIZE: usize = 64 * 1024;

pub struct Api {
    pub engine: Arc<Engine>,
    pub persistence: Option<Arc<Persistence>>,
    pub addr: SocketAddr,
    /// If this channel is specified, the bound address will be sent to it. This
    /// allows the service to bind to 0.0.0.0:0 during testing.
    pub addr_sender: Option<oneshot::Sender<SocketAddr>>,
}

impl Api {
    pub async fn serve(
        self,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<(), std::io::Error> {
        let app = router(self.engine, self.persistence);

        // Start the server.
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        let local_addr = listener.local_addr()?;
        observe::serving(local_addr);
        if let Some(addr_sender) = self.addr_sender {
            // The receiver only goes away if the caller stopped waiting.
            let _ = addr_sender.send(local_addr);
        }
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
    }
}

/// All routes of the API with their middleware.
pub fn router(engine: Arc<Engine>, persistence: Option<Arc<Persistence>>) -> axum::Router {
    let mut app = axum::Router::new();
    app = routes::metrics(app);
    app = routes::healthz(app);

    let orders = axum::Router::new();
    let orders = routes::execute(orders);
    let orders = routes::cancel(orders);
    let orders = routes::status(orders);
    let orders = routes::hash(orders);
    let orders = routes::domain(orders);
    app = app.nest(
        "/api/v1",
        orders.with_state(State(Arc::new(Inner {
            engine,
            persistence,
        }))),
    );

    app.layer(tower_http::limit::RequestBodyLimitLayer::new(MAX_BODY_SIZE))
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

#[derive(Clone)]
struct State(Arc<Inner>);

impl State {
    fn engine(&self) -> &Engine {
        &self.0.engine
    }

    /// Writes the finalized statuses to disk. A failure is only logged: the
    /// transition already happened and the next write or the shutdown
    /// snapshot catches up.
    async fn persist(&self) {
        let Some(persistence) = &self.0.persistence else {
            return;
        };
        let snapshot = self.engine().lifecycle().snapshot();
        if let Err(err) = persistence.store(&snapshot).await {
            observe::persistence_failed(persistence.path(), &err);
        }
    }
}

struct Inner {
    engine: Arc<Engine>,
    persistence: Option<Arc<Persistence>>,
}
