#[tokio::main]
async fn main() -> anyhow::Result<()> {
    quiz_terminal::run().await
}
