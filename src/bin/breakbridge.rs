use anyhow::Result;

fn main() -> Result<()> {
    let code = breakbridge::cli::run()?;
    std::process::exit(code)
}
