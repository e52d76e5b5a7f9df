use anyhow::Result;
use callisto_core::align::BackendRegistry;
use callisto_core::config::AlignConfig;
use console::Style;

pub fn run(config: &AlignConfig) -> Result<()> {
    let title = Style::new().cyan().bold();
    let label = Style::new().dim();
    let available = Style::new().green();
    let disabled = Style::new().dim().yellow();

    println!();
    println!("  {}", title.apply_to("Alignment methods"));
    println!();
    for backend in BackendRegistry::global().iter() {
        let marker = if backend.method == config.method { "*" } else { " " };
        let status = if backend.is_available() {
            available.apply_to("available".to_string())
        } else {
            disabled.apply_to(format!("disabled (enable feature '{}')", backend.dependency))
        };
        println!(
            "  {} {:<12}{}",
            marker,
            label.apply_to(backend.method.name()),
            status
        );
    }
    println!();
    Ok(())
}
