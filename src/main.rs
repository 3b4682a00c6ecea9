fn main() -> anyhow::Result<()> {
    archive_toolkit::cli::run()
}
