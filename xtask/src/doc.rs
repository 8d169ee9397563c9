use anyhow::Result;
use colored::Colorize;

use crate::cargo;

pub fn run(open: bool) -> Result<()> {
    println!();
    println!("{}", "📚 Building documentation...".cyan().bold());
    println!();

    let mut args = vec!["doc", "--workspace", "--no-deps", "--document-private-items"];
    if open {
        args.push("--open");
    }
    cargo("Documentation", &args)?;

    if !open {
        println!();
        println!(
            "   {}",
            "Open target/doc/gpu/index.html in your browser".dimmed()
        );
        println!("   {}", "Or run 'cargo run -p xtask -- doc --open'".dimmed());
    }
    println!();

    Ok(())
}
