use crate::CLAP_STYLING;
use clap::arg;

pub(crate) fn command_argument_builder() -> clap::Command {
    clap::Command::new("bwscan")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("bwscan")
        .about(
            "Find the sites BuiltWith lists for a technology and print the ones whose \
            homepage matches a pattern read from stdin.",
        )
        .styles(CLAP_STYLING)
        .arg(
            arg!(<TECHNOLOGY>)
                .help("The BuiltWith technology name, e.g. \"React\" or \"Google Analytics\""),
        )
        .arg(
            arg!(-n --"no-remove-comments")
                .required(false)
                .help("Keep HTML comments in fetched pages when matching (default: strip them)")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            arg!(-i --"ignorecase")
                .required(false)
                .help("Match the pattern case-insensitively")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            arg!(-t --"timeout" <SECONDS>)
                .required(false)
                .help("Connect and read timeout for each request, in seconds (0 waits indefinitely)")
                .value_parser(clap::value_parser!(u64))
                .default_value("7"),
        )
        .arg(
            arg!(-v --"verbose" ...)
                .required(false)
                .help("Log more to stderr (-v info, -vv debug, -vvv trace)"),
        )
}
