#[tokio::main]
async fn main() {
    if let Err(e) = backoffice::run().await {
        eprintln!("{:?}", e);
        std::process::exit(1);
    }
}
