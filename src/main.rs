#[tokio::main]
async fn main() {
    swapper_engine_watcher::main().await;
}
