fn main() -> anyhow::Result<()> {
    nxbench_cli::run()
}
