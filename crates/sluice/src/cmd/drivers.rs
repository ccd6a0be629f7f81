//! Drivers command - list what a config can refer to

use anyhow::Result;
use sluice_registry::Registry;

/// Run the drivers command
pub fn run() -> Result<()> {
    let registry = Registry::with_builtins();

    println!("sources:");
    for name in registry.sources() {
        println!("  {name}");
    }

    println!("destinations:");
    for name in registry.destinations() {
        println!("  {name}");
    }

    println!("hooks:");
    for hook in registry.hooks() {
        let args: Vec<_> = hook.arg_types().iter().map(|t| t.as_str()).collect();
        println!("  {}({})", hook.name(), args.join(", "));
    }

    Ok(())
}
