#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tradepost_observability::init();
    run().await
}

#[cfg(feature = "kafka")]
async fn run() -> anyhow::Result<()> {
    use std::sync::Arc;

    use tokio::sync::watch;
    use tradepost_consumer::MirrorHandler;
    use tradepost_core::EntityKind;
    use tradepost_events::{EventDispatcher, TopicBinding};
    use tradepost_infra::kafka::{ConsumerGroupRunner, KafkaConfig};

    let config = KafkaConfig::from_env("tradepost-consumer");

    let mirror = Arc::new(MirrorHandler::new());
    let dispatcher = EventDispatcher::new()
        .register(EntityKind::Supplier, mirror.clone())
        .register(EntityKind::Product, mirror);

    let supplier_runner = ConsumerGroupRunner::subscribe(
        &config,
        TopicBinding::for_kind(EntityKind::Supplier, "mirror"),
    )?;
    let product_runner = ConsumerGroupRunner::subscribe(
        &config,
        TopicBinding::for_kind(EntityKind::Product, "mirror"),
    )?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("shutdown signal received");
            let _ = shutdown_tx.send(true);
        }
    });

    tokio::join!(
        supplier_runner.run(&dispatcher, shutdown_rx.clone()),
        product_runner.run(&dispatcher, shutdown_rx),
    );

    Ok(())
}

#[cfg(not(feature = "kafka"))]
async fn run() -> anyhow::Result<()> {
    anyhow::bail!("tradepost-consumer was built without the `kafka` feature; rebuild with `--features kafka`")
}
