#[tokio::main]
async fn main() -> anyhow::Result<()> {
    jazz_nyc_lib::run().await
}
