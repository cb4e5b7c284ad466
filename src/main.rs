fn main() {
    #[cfg(feature = "cli")]
    oxibufr::cli::run();

    #[cfg(not(feature = "cli"))]
    {
        eprintln!("oxibufr: CLI not enabled. Rebuild with `--features cli`.");
        std::process::exit(1);
    }
}
