use std::path::PathBuf;

use folio::{config::Config, content::Snapshot, notion::NotionClient};

fn print_usage_and_exit() -> ! {
    eprintln!("Usage: snapshot [output-path]");
    std::process::exit(1);
}

#[tokio::main]
async fn main() {
    let mut args = std::env::args().skip(1); // 跳过程序名
    let output = args.next().map(PathBuf::from);

    if args.next().is_some() {
        eprintln!("Too many arguments provided.");
        print_usage_and_exit();
    }

    let config = Config::from_env().unwrap_or_else(|e| {
        eprintln!("❌ {e}");
        std::process::exit(1);
    });
    let path = output.unwrap_or(config.snapshot_path);

    let client = NotionClient::new(&config.notion).unwrap_or_else(|e| {
        eprintln!("❌ Failed to create notion client: {e}");
        std::process::exit(1);
    });

    let snapshot = match Snapshot::generate(&client).await {
        Ok(snapshot) => snapshot,
        Err(e) => {
            eprintln!("❌ Failed to query notion: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = snapshot.write(&path).await {
        eprintln!("❌ Failed to write {}: {e}", path.display());
        std::process::exit(1);
    }

    println!(
        "✅ Wrote {} posts to {}",
        snapshot.posts.len(),
        path.display()
    );
}
