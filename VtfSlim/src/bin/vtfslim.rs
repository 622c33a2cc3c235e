fn main() -> anyhow::Result<()> {
    vtfslim::cli::run_cli()
}
