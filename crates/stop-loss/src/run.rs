use {
    crate::{
        domain::{
            Engine,
            Lifecycle,
            order::Authorizer,
            price::{self, Oracle, PoolResolver, Resolver},
        },
        infra::{Api, Chain, Config, Persistence, cli, config, observe},
    },
    clap::Parser,
    std::{net::SocketAddr, sync::Arc, time::Duration},
    tokio::sync::oneshot,
};

pub async fn start(args: impl Iterator<Item = String>) {
    run(args, None).await
}

/// This function exists to enable running the service for testing. The
/// `addr_sender` parameter is used so that the testing framework can get the
/// address of the server and connect to it. Outside the test suite, the
/// `addr_sender` parameter is unused.
pub async fn run(
    args: impl Iterator<Item = String>,
    addr_sender: Option<oneshot::Sender<SocketAddr>>,
) {
    let args = cli::Args::parse_from(args);
    observe::init(&::observe::Config::new(
        &args.log,
        args.stderr_threshold,
        args.use_json_logs,
    ));
    let config = config::file::load(&args.config).await;

    let chain = Chain::seed(&config.chain).expect("seed simulated chain");
    chain.approve_all(config.engine, chain.router.address());
    let engine = Arc::new(engine(&config, &chain));

    let persistence = config
        .persistence_path
        .clone()
        .map(|path| Arc::new(Persistence::new(path)));
    if let Some(persistence) = &persistence {
        let statuses = persistence.load().await.expect("load order statuses");
        observe::restored(persistence.path(), statuses.len());
        engine.lifecycle().restore(statuses);
    }

    let (shutdown_sender, shutdown_receiver) = tokio::sync::oneshot::channel();
    let serve = Api {
        engine: engine.clone(),
        persistence: persistence.clone(),
        addr: args.addr,
        addr_sender,
    }
    .serve(async {
        let _ = shutdown_receiver.await;
    });

    futures::pin_mut!(serve);
    tokio::select! {
        result = &mut serve => panic!("serve task exited: {result:?}"),
        _ = shutdown_signal() => {
            shutdown_sender.send(()).expect("failed to send shutdown signal");
            match tokio::time::timeout(Duration::from_secs(10), serve).await {
                Ok(inner) => inner.expect("API failed during shutdown"),
                Err(_) => panic!("API shutdown exceeded timeout"),
            }
        }
    };

    if let Some(persistence) = &persistence {
        if let Err(err) = persistence.store(&engine.lifecycle().snapshot()).await {
            observe::persistence_failed(persistence.path(), &err);
        }
    }
}

/// Wires the engine to the contracts of the chain.
pub(crate) fn engine(config: &Config, chain: &Chain) -> Engine {
    let resolver = Resolver::new(
        price::Config {
            reference: config.reference,
            stable: config.stable,
            max_age: config.max_age,
        },
        Oracle::new(chain.aggregator.clone(), config.stable_decimals),
        PoolResolver::new(
            chain.factory.clone(),
            chain.factory.clone(),
            chain.ledger.clone(),
            config.pool_fee,
        ),
    );
    Engine::new(
        Arc::new(Authorizer::new(config.domain.clone())),
        Arc::new(Lifecycle::default()),
        resolver,
        chain.router.clone(),
        chain.ledger.clone(),
        config.engine,
        config.pool_fee,
    )
}

#[cfg(unix)]
async fn shutdown_signal() {
    // Intercept signals for graceful shutdown. Kubernetes sends sigterm, Ctrl-C
    // sends sigint.
    let sigterm = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .unwrap()
            .recv()
            .await
    };
    let sigint = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::interrupt())
            .unwrap()
            .recv()
            .await;
    };
    futures::pin_mut!(sigint);
    futures::pin_mut!(sigterm);
    futures::future::select(sigterm, sigint).await;
}

#[cfg(windows)]
async fn shutdown_signal() {
    // No support for signal handling on Windows.
    std::future::pending().await
}
