use log::LevelFilter;

/// Initializes env_logger for the binary. Only the crate's own records pass
/// the level chosen by `verbose`; dependencies log warnings and errors.
pub fn init_logger(verbose: bool) {
    let level = if verbose { LevelFilter::Debug } else { LevelFilter::Info };
    env_logger::Builder::new()
        .filter_level(LevelFilter::Warn)
        .filter_module("tdd", level)
        .format_timestamp(None)
        .target(env_logger::Target::Stderr)
        .init();
}
