#[tokio::main]
async fn main() {
    stop_loss::start(std::env::args()).await;
}
