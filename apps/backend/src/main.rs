#[tokio::main]
async fn main() -> anyhow::Result<()> {
    skillpath_backend::run().await
}
