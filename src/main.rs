/// Entry point of the cgroup pathfinder.
///
/// Detects the cgroup driver of the node and prints the resulting `kubepods`
/// layout as JSON.
///
/// # Examples
///
/// ```bash
/// NODE_NAME=worker-1 RUST_LOG=info cargo run
/// ```
#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let layout = cgroup_pathfinder::run().await?;
    println!("{}", serde_json::to_string_pretty(&layout)?);
    Ok(())
}
