mod app;
mod cli;
mod context;
mod rest;
mod service;
mod storage;
mod tracing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    crate::tracing::init();
    app::run().await
}
